use anyhow::{Context, Result, bail};
use globset::Glob;
use ignore::WalkBuilder;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use super::types::ScenarioDefinition;

/// On-disk shape of a manifest: any number of `[[scenario]]` entries
#[derive(Debug, Default, Deserialize)]
struct ScenarioManifest {
    #[serde(default)]
    scenario: Vec<ScenarioDefinition>,
}

/// Load every scenario declared in manifests under `root` matching `pattern`
///
/// The pattern is matched against paths relative to `root`. Manifests are
/// parsed by extension (`.json`, `.yaml`/`.yml`, anything else as TOML).
/// A scenario name declared twice is an error.
pub fn load_scenarios(root: &Path, pattern: &str) -> Result<BTreeMap<String, ScenarioDefinition>> {
    let matcher = Glob::new(pattern)
        .with_context(|| format!("Invalid scenario glob: {pattern}"))?
        .compile_matcher();

    if !root.is_dir() {
        bail!("Scenario directory not found: {}", root.display());
    }

    let mut builder = WalkBuilder::new(root);
    builder.sort_by_file_name(|a, b| a.cmp(b));

    let mut scenarios = BTreeMap::new();
    let mut origins: HashMap<String, PathBuf> = HashMap::new();

    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Walk error under {}: {e}", root.display());
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if !matcher.is_match(relative) {
            continue;
        }

        let manifest = parse_manifest(path)?;
        tracing::trace!("{} declares {} scenarios", path.display(), manifest.scenario.len());

        for definition in manifest.scenario {
            if definition.name.trim().is_empty() {
                bail!("Scenario with an empty name in {}", path.display());
            }
            if let Some(previous) = origins.get(&definition.name) {
                bail!(
                    "Scenario '{}' is defined in both {} and {}",
                    definition.name,
                    previous.display(),
                    path.display()
                );
            }
            origins.insert(definition.name.clone(), path.to_path_buf());
            scenarios.insert(definition.name.clone(), definition);
        }
    }

    tracing::debug!(
        "loaded {} scenarios from {} (glob {pattern})",
        scenarios.len(),
        root.display()
    );
    Ok(scenarios)
}

fn parse_manifest(path: &Path) -> Result<ScenarioManifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario manifest: {}", path.display()))?;

    let parsed = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&content).map_err(anyhow::Error::from),
        Some("yaml" | "yml") => serde_yml::from_str(&content).map_err(anyhow::Error::from),
        _ => toml::from_str(&content).map_err(anyhow::Error::from),
    };

    parsed.with_context(|| format!("Failed to parse scenario manifest: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioFlag;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_loads_all_manifest_formats() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "supply.toml",
            r#"
[[scenario]]
name = "supply"
command = "true"

[[scenario]]
name = "withdraw"
flag = "skip"
"#,
        );
        write(
            temp.path(),
            "nested/absorb.yaml",
            "scenario:\n  - name: absorb\n    flag: only\n    expect: \"42\"\n",
        );
        write(
            temp.path(),
            "buy.json",
            r#"{"scenario": [{"name": "buy collateral", "env": {"AMOUNT": "10"}}]}"#,
        );

        let scenarios = load_scenarios(temp.path(), "**/*.{toml,yaml,yml,json}").unwrap();

        assert_eq!(
            scenarios.keys().collect::<Vec<_>>(),
            vec!["absorb", "buy collateral", "supply", "withdraw"]
        );
        assert_eq!(scenarios["withdraw"].flag, ScenarioFlag::Skip);
        assert_eq!(scenarios["absorb"].flag, ScenarioFlag::Only);
        assert_eq!(scenarios["absorb"].expect.as_deref(), Some("42"));
        assert_eq!(scenarios["supply"].command.as_deref(), Some("true"));
        assert_eq!(scenarios["buy collateral"].env["AMOUNT"], "10");
    }

    #[test]
    fn test_glob_filters_files() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.toml", "[[scenario]]\nname = \"a\"\n");
        write(temp.path(), "b.json", r#"{"scenario": [{"name": "b"}]}"#);
        write(temp.path(), "notes.txt", "not a manifest");

        let scenarios = load_scenarios(temp.path(), "*.toml").unwrap();
        assert_eq!(scenarios.len(), 1);
        assert!(scenarios.contains_key("a"));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.toml", "[[scenario]]\nname = \"supply\"\n");
        write(temp.path(), "b.toml", "[[scenario]]\nname = \"supply\"\n");

        let error = load_scenarios(temp.path(), "*.toml").unwrap_err();
        assert!(error.to_string().contains("defined in both"));
    }

    #[test]
    fn test_invalid_manifest_reports_path() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "broken.toml", "[[scenario]]\nflag = \"only\"\n");

        let error = load_scenarios(temp.path(), "*.toml").unwrap_err();
        assert!(format!("{error:#}").contains("broken.toml"));
    }

    #[test]
    fn test_missing_root_and_bad_glob() {
        let temp = TempDir::new().unwrap();
        assert!(load_scenarios(&temp.path().join("missing"), "*.toml").is_err());
        assert!(load_scenarios(temp.path(), "[").is_err());
    }

    #[test]
    fn test_empty_directory_yields_no_scenarios() {
        let temp = TempDir::new().unwrap();
        assert!(load_scenarios(temp.path(), "**/*.toml").unwrap().is_empty());
    }
}

use anyhow::{Context, Result, bail};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use super::RunnerConfig;
use super::overrides::prune_empty;
use super::smart_load;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

const ENV_PREFIX: &str = "SCENARIO_RUNNER_";
const REPO_CONFIG_STEM: &str = "scenario-runner";

/// Merged view over every configuration source
pub struct LayeredConfig {
    figment: Figment,
}

impl LayeredConfig {
    pub fn load(custom_config: Option<&str>, overrides: Option<serde_json::Value>) -> Result<Self> {
        let user_config = Self::user_config_path();

        let mut figment = Figment::new()
            .merge(Toml::string(DEFAULT_CONFIG))
            .merge(Toml::file(&user_config))
            .merge(Json::file(user_config.with_extension("json")))
            .merge(Yaml::file(user_config.with_extension("yaml")))
            .merge(Yaml::file(user_config.with_extension("yml")))
            .merge(Toml::file(format!("{REPO_CONFIG_STEM}.toml")))
            .merge(Json::file(format!("{REPO_CONFIG_STEM}.json")))
            .merge(Yaml::file(format!("{REPO_CONFIG_STEM}.yaml")))
            .merge(Yaml::file(format!("{REPO_CONFIG_STEM}.yml")));

        if let Some(custom_path) = custom_config {
            let path = Path::new(custom_path);
            if !path.is_file() {
                bail!("Config file not found: {custom_path}");
            }
            figment = figment.merge(smart_load::auto(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        // CLI overrides win over everything else
        if let Some(overrides) = overrides {
            let pruned = prune_empty(overrides);
            if !pruned.is_null() {
                tracing::debug!("applying CLI overrides: {pruned}");
                figment = figment.merge(Serialized::defaults(pruned));
            }
        }

        Ok(Self { figment })
    }

    pub fn extract(&self) -> Result<RunnerConfig> {
        self.figment
            .extract()
            .context("Failed to extract configuration")
    }

    /// Get a nested object/section as any deserializable type
    pub fn get_section<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.figment
            .extract_inner(path)
            .with_context(|| format!("Failed to read config section '{path}'"))
    }

    /// Get the full merged configuration as a structured value
    pub fn get_full_config(&self) -> Result<serde_json::Value> {
        Ok(self.figment.extract()?)
    }

    fn user_config_path() -> PathBuf {
        match std::env::var("HOME") {
            Ok(home) => PathBuf::from(home).join(".config/scenario-runner/config.toml"),
            Err(_) => PathBuf::from("~/.config/scenario-runner/config.toml"),
        }
    }
}

use super::*;
use figment::Jail;
use serde_json::json;

fn load_in(jail: &mut Jail, custom: Option<&str>, overrides: Option<serde_json::Value>) -> figment::Result<RunnerConfig> {
    let home = jail.directory().display().to_string();
    jail.set_env("HOME", home);
    RunnerConfig::load(custom, overrides).map_err(|e| format!("{e:#}").into())
}

#[test]
fn test_config_loads_defaults() {
    Jail::expect_with(|jail| {
        let config = load_in(jail, None, None)?;

        assert_eq!(config.workers, 0);
        assert_eq!(config.thread_percentage, 75);
        assert_eq!(config.crash_policy, CrashPolicy::Error);
        assert_eq!(config.scenarios, ScenarioRunConfig::default());
        assert_eq!(config.report.formats, vec![ReportFormat::Console]);
        assert!(config.bases.is_empty());
        Ok(())
    });
}

#[test]
fn test_repo_config_and_env_layering() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "scenario-runner.toml",
            r#"
workers = 2
crash_policy = "abort"

[[bases]]
name = "mainnet"
network = "mainnet"
deployment = "usdc"

[environment.vars]
RPC = "http://localhost:8545"
"#,
        )?;
        jail.set_env("SCENARIO_RUNNER_WORKERS", "6");
        jail.set_env("SCENARIO_RUNNER_SCENARIOS__GLOB", "*.toml");

        let config = load_in(jail, None, None)?;
        assert_eq!(config.workers, 6);
        assert_eq!(config.crash_policy, CrashPolicy::Abort);
        assert_eq!(config.scenarios.glob, "*.toml");
        assert_eq!(config.bases, vec![BaseConfig::new("mainnet", "mainnet", "usdc")]);
        assert_eq!(config.environment.vars["RPC"], "http://localhost:8545");
        Ok(())
    });
}

#[test]
fn test_user_config_is_below_repo_config() {
    Jail::expect_with(|jail| {
        jail.create_dir(".config/scenario-runner")?;
        jail.create_file(".config/scenario-runner/config.toml", "workers = 3\nthread_percentage = 50\n")?;
        jail.create_file("scenario-runner.yaml", "workers: 4\n")?;

        let config = load_in(jail, None, None)?;
        assert_eq!(config.workers, 4);
        assert_eq!(config.thread_percentage, 50);
        Ok(())
    });
}

#[test]
fn test_custom_config_and_cli_overrides() {
    Jail::expect_with(|jail| {
        jail.create_file("custom.json", r#"{"workers": 5, "scenarios": {"root": "specs"}}"#)?;
        jail.set_env("SCENARIO_RUNNER_WORKERS", "6");

        let overrides = json!({
            "workers": 8,
            "crash_policy": null,
            "report": { "formats": [] },
        });
        let config = load_in(jail, Some("custom.json"), Some(overrides))?;

        assert_eq!(config.workers, 8);
        assert_eq!(config.scenarios.root, PathBuf::from("specs"));
        assert_eq!(config.crash_policy, CrashPolicy::Error);
        assert_eq!(config.report.formats, vec![ReportFormat::Console]);
        Ok(())
    });
}

#[test]
fn test_missing_custom_config_is_an_error() {
    Jail::expect_with(|jail| {
        let home = jail.directory().display().to_string();
        jail.set_env("HOME", home);
        assert!(RunnerConfig::load(Some("nope.toml"), None).is_err());
        Ok(())
    });
}

#[test]
fn test_get_section() {
    Jail::expect_with(|jail| {
        let home = jail.directory().display().to_string();
        jail.set_env("HOME", home);
        let layered = LayeredConfig::load(None, None).map_err(|e| e.to_string())?;
        let scenarios: ScenarioRunConfig = layered.get_section("scenarios").map_err(|e| e.to_string())?;
        assert_eq!(scenarios.root, PathBuf::from("scenario"));
        assert!(layered.get_full_config().map_err(|e| e.to_string())?.is_object());
        Ok(())
    });
}

fn configured(bases: &[&str]) -> RunnerConfig {
    RunnerConfig {
        bases: bases
            .iter()
            .map(|name| BaseConfig::new(*name, *name, "usdc"))
            .collect(),
        ..RunnerConfig::default()
    }
}

#[test]
fn test_validate() {
    assert!(configured(&["mainnet"]).validate().is_ok());
    assert!(configured(&[]).validate().is_err());
    assert!(configured(&["mainnet", "mainnet"]).validate().is_err());

    let mut config = configured(&["mainnet"]);
    config.thread_percentage = 0;
    assert!(config.validate().is_err());
    config.thread_percentage = 101;
    assert!(config.validate().is_err());

    let mut config = configured(&["mainnet"]);
    config.scenarios.glob = " ".to_string();
    assert!(config.validate().is_err());

    let mut config = configured(&["mainnet"]);
    config.report.formats.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_select_bases() {
    let config = configured(&["mainnet", "goerli", "fuji"]);

    let all = config.select_bases(&[]).unwrap();
    assert_eq!(all.len(), 3);

    let picked = config
        .select_bases(&["fuji".to_string(), "mainnet".to_string(), "fuji".to_string()])
        .unwrap();
    let names: Vec<_> = picked.iter().map(|base| base.name.as_str()).collect();
    assert_eq!(names, vec!["fuji", "mainnet"]);

    let error = config.select_bases(&["polygon".to_string()]).unwrap_err();
    assert!(error.to_string().contains("Unknown base 'polygon'"));
}

#[test]
fn test_worker_count() {
    let mut config = RunnerConfig::default();
    config.workers = 3;
    assert_eq!(config.worker_count(), 3);
    config.workers = 0;
    assert!(config.worker_count() >= 1);
}

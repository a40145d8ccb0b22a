use anyhow::Result;
use std::collections::BTreeMap;
use std::process::Command;
use std::sync::Arc;

use super::loader::load_scenarios;
use super::result::Diff;
use super::types::{BaseConfig, ScenarioDefinition};
use crate::config::EnvironmentConfig;
use crate::parallel::{ExecutorFactory, ScenarioExecutor, ScenarioOutcome, WorkerInit};

/// Runs each scenario body as `sh -c <command>` inside the worker thread
pub struct CommandExecutor {
    scenarios: Arc<BTreeMap<String, ScenarioDefinition>>,
    environment: EnvironmentConfig,
}

impl CommandExecutor {
    pub fn new(
        scenarios: Arc<BTreeMap<String, ScenarioDefinition>>,
        environment: EnvironmentConfig,
    ) -> Self {
        Self {
            scenarios,
            environment,
        }
    }

    fn build_command(&self, base: &BaseConfig, definition: &ScenarioDefinition, body: &str) -> Command {
        let mut cmd = Command::new("sh");
        // $0 is the scenario name so `environment.args` land in $1..
        cmd.arg("-c").arg(body).arg(&definition.name);
        cmd.args(&self.environment.args);

        cmd.env("SCENARIO_BASE", &base.name)
            .env("SCENARIO_NETWORK", &base.network)
            .env("SCENARIO_DEPLOYMENT", &base.deployment)
            .env("SCENARIO_NAME", &definition.name);
        cmd.envs(&self.environment.vars);
        cmd.envs(&definition.env);
        cmd
    }
}

impl ScenarioExecutor for CommandExecutor {
    fn execute(&mut self, base: &BaseConfig, scenario: &str) -> ScenarioOutcome {
        let Some(definition) = self.scenarios.get(scenario) else {
            return ScenarioOutcome::failure(format!("unknown scenario '{scenario}'"));
        };
        let Some(body) = definition.command.as_deref() else {
            return ScenarioOutcome::failure(format!("scenario '{scenario}' has no command"));
        };

        tracing::trace!("{}-{scenario}: sh -c {body:?}", base.name);

        let output = match self.build_command(base, definition, body).output() {
            Ok(output) => output,
            Err(e) => return ScenarioOutcome::failure(format!("failed to spawn command: {e}")),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let error = match output.status.code() {
                Some(code) => format!("command exited with status {code}"),
                None => "command terminated by signal".to_string(),
            };
            let outcome = ScenarioOutcome::failure(error);
            let trace = stderr.trim();
            return if trace.is_empty() {
                outcome
            } else {
                outcome.with_trace(trace)
            };
        }

        match definition.expect.as_deref() {
            Some(expected) if stdout.trim() != expected.trim() => {
                ScenarioOutcome::failure("output mismatch")
                    .with_diff(Diff::new(stdout.trim(), expected.trim()))
            }
            _ => ScenarioOutcome::success(),
        }
    }
}

/// Builds a [`CommandExecutor`] per worker
///
/// Without preloaded scenarios each worker loads the manifests itself from
/// `WorkerInit::scenario_config`.
#[derive(Debug, Default)]
pub struct CommandExecutorFactory {
    preloaded: Option<Arc<BTreeMap<String, ScenarioDefinition>>>,
}

impl CommandExecutorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scenarios(scenarios: BTreeMap<String, ScenarioDefinition>) -> Self {
        Self {
            preloaded: Some(Arc::new(scenarios)),
        }
    }
}

impl ExecutorFactory for CommandExecutorFactory {
    type Executor = CommandExecutor;

    fn create(&self, init: &WorkerInit) -> Result<CommandExecutor> {
        let scenarios = match &self.preloaded {
            Some(scenarios) => Arc::clone(scenarios),
            None => Arc::new(load_scenarios(
                &init.scenario_config.root,
                &init.scenario_config.glob,
            )?),
        };
        Ok(CommandExecutor::new(scenarios, init.environment.clone()))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::ScenarioRunConfig;
    use tempfile::TempDir;

    fn base() -> BaseConfig {
        BaseConfig::new("mainnet", "mainnet", "usdc")
    }

    fn executor(definitions: Vec<ScenarioDefinition>, environment: EnvironmentConfig) -> CommandExecutor {
        let scenarios = definitions
            .into_iter()
            .map(|definition| (definition.name.clone(), definition))
            .collect();
        CommandExecutor::new(Arc::new(scenarios), environment)
    }

    #[test]
    fn test_successful_command() {
        let mut exec = executor(
            vec![ScenarioDefinition::new("ok").with_command("exit 0")],
            EnvironmentConfig::default(),
        );
        assert_eq!(exec.execute(&base(), "ok"), ScenarioOutcome::success());
    }

    #[test]
    fn test_failing_command_captures_stderr() {
        let mut exec = executor(
            vec![ScenarioDefinition::new("bad").with_command("echo boom >&2; exit 3")],
            EnvironmentConfig::default(),
        );
        let outcome = exec.execute(&base(), "bad");
        assert_eq!(outcome.error.as_deref(), Some("command exited with status 3"));
        assert_eq!(outcome.trace.as_deref(), Some("boom"));
    }

    #[test]
    fn test_environment_reaches_command() {
        let mut definition = ScenarioDefinition::new("env")
            .with_command("echo \"$SCENARIO_BASE/$SCENARIO_DEPLOYMENT/$SCENARIO_NAME/$RPC/$AMOUNT/$0/$1\"")
            .with_expect("mainnet/usdc/env/local/10/env/--fast");
        definition.env.insert("AMOUNT".into(), "10".into());

        let environment = EnvironmentConfig {
            vars: BTreeMap::from([("RPC".to_string(), "local".to_string())]),
            args: vec!["--fast".to_string()],
        };
        let mut exec = executor(vec![definition], environment);
        assert_eq!(exec.execute(&base(), "env"), ScenarioOutcome::success());
    }

    #[test]
    fn test_scenario_env_overrides_configured_vars() {
        let mut definition = ScenarioDefinition::new("override")
            .with_command("echo $RPC")
            .with_expect("scenario");
        definition.env.insert("RPC".into(), "scenario".into());

        let environment = EnvironmentConfig {
            vars: BTreeMap::from([("RPC".to_string(), "global".to_string())]),
            args: Vec::new(),
        };
        let mut exec = executor(vec![definition], environment);
        assert!(exec.execute(&base(), "override").error.is_none());
    }

    #[test]
    fn test_expect_mismatch_produces_diff() {
        let mut exec = executor(
            vec![ScenarioDefinition::new("cmp").with_command("echo 41").with_expect("42")],
            EnvironmentConfig::default(),
        );
        let outcome = exec.execute(&base(), "cmp");
        assert_eq!(outcome.error.as_deref(), Some("output mismatch"));
        assert_eq!(outcome.diff, Some(Diff::new("41", "42")));
    }

    #[test]
    fn test_unknown_and_commandless_scenarios_fail() {
        let mut exec = executor(vec![ScenarioDefinition::new("empty")], EnvironmentConfig::default());
        assert!(exec.execute(&base(), "missing").error.unwrap().contains("unknown scenario"));
        assert!(exec.execute(&base(), "empty").error.unwrap().contains("no command"));
    }

    #[test]
    fn test_factory_loads_manifests_from_init() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("a.toml"),
            "[[scenario]]\nname = \"a\"\ncommand = \"true\"\n",
        )
        .unwrap();

        let init = WorkerInit {
            scenario_config: ScenarioRunConfig {
                root: temp.path().to_path_buf(),
                glob: "*.toml".to_string(),
            },
            ..WorkerInit::default()
        };
        let mut exec = CommandExecutorFactory::new().create(&init).unwrap();
        assert!(exec.execute(&base(), "a").error.is_none());
    }

    #[test]
    fn test_factory_fails_on_missing_root() {
        let init = WorkerInit {
            scenario_config: ScenarioRunConfig {
                root: "/definitely/not/here".into(),
                glob: "*.toml".to_string(),
            },
            ..WorkerInit::default()
        };
        assert!(CommandExecutorFactory::new().create(&init).is_err());
    }
}

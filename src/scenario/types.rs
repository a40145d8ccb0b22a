use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Execution context a scenario runs against (a network fork plus a deployment)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BaseConfig {
    /// Unique base name, e.g. `mainnet`
    pub name: String,
    /// Network identifier the fork is taken from
    pub network: String,
    /// Deployment identifier within that network
    pub deployment: String,
}

impl BaseConfig {
    pub fn new(
        name: impl Into<String>,
        network: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            network: network.into(),
            deployment: deployment.into(),
        }
    }
}

/// Inclusion flag carried by every scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioFlag {
    /// Run unless an `only` scenario exists somewhere in the run
    #[default]
    None,
    /// Restrict the whole run to `only` scenarios
    Only,
    /// Never run, always reported as skipped
    Skip,
}

impl fmt::Display for ScenarioFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScenarioFlag::None => "none",
            ScenarioFlag::Only => "only",
            ScenarioFlag::Skip => "skip",
        };
        f.write_str(name)
    }
}

/// A named unit of work as declared in a scenario manifest
///
/// Only `name` and `flag` matter to the scheduler. The remaining fields are
/// read by the command executor when the scenario body runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub name: String,

    #[serde(default)]
    pub flag: ScenarioFlag,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Shell command forming the scenario body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Expected (trimmed) stdout of the command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<String>,

    /// Extra environment for this scenario only
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl ScenarioDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flag: ScenarioFlag::None,
            description: String::new(),
            command: None,
            expect: None,
            env: BTreeMap::new(),
        }
    }

    pub fn with_flag(mut self, flag: ScenarioFlag) -> Self {
        self.flag = flag;
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_expect(mut self, expect: impl Into<String>) -> Self {
        self.expect = Some(expect.into());
        self
    }
}

/// Identifier of one base x scenario pairing
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkKey {
    pub base: String,
    pub scenario: String,
}

impl WorkKey {
    pub fn new(base: impl Into<String>, scenario: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            scenario: scenario.into(),
        }
    }
}

impl fmt::Display for WorkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.base, self.scenario)
    }
}

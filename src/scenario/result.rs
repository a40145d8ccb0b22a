use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::types::WorkKey;

/// Actual vs expected payload attached to a failed comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diff {
    pub actual: serde_json::Value,
    pub expected: serde_json::Value,
}

impl Diff {
    pub fn new(actual: impl Into<serde_json::Value>, expected: impl Into<serde_json::Value>) -> Self {
        Self {
            actual: actual.into(),
            expected: expected.into(),
        }
    }
}

/// Recorded outcome of one base x scenario pairing
///
/// Exactly one of these exists per work item at the end of a run: skipped
/// items get one up front, executed items get one from the worker that ran them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub base: String,
    pub scenario: String,

    /// Wall-clock time spent in the scenario body, serialized in milliseconds
    #[serde(default, with = "elapsed_ms", skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<Duration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<Diff>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
}

impl ScenarioResult {
    fn blank(key: &WorkKey) -> Self {
        Self {
            base: key.base.clone(),
            scenario: key.scenario.clone(),
            elapsed: None,
            error: None,
            trace: None,
            diff: None,
            skipped: false,
        }
    }

    /// Result recorded for an item that was filtered out of the run
    pub fn skipped(key: &WorkKey) -> Self {
        Self {
            skipped: true,
            ..Self::blank(key)
        }
    }

    pub fn passed(key: &WorkKey, elapsed: Duration) -> Self {
        Self {
            elapsed: Some(elapsed),
            ..Self::blank(key)
        }
    }

    pub fn failed(key: &WorkKey, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::blank(key)
        }
    }

    pub fn key(&self) -> WorkKey {
        WorkKey::new(&self.base, &self.scenario)
    }

    /// Only a non-empty error counts; skipped results never fail a run
    pub fn is_failure(&self) -> bool {
        self.error.as_deref().is_some_and(|error| !error.is_empty())
    }

    pub fn is_success(&self) -> bool {
        !self.skipped && !self.is_failure()
    }
}

mod elapsed_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(elapsed) => serializer.serialize_some(&(elapsed.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_result_is_not_a_failure() {
        let result = ScenarioResult::skipped(&WorkKey::new("mainnet", "B"));
        assert!(result.skipped);
        assert!(result.error.is_none());
        assert!(!result.is_failure());
        assert!(!result.is_success());
    }

    #[test]
    fn test_empty_error_is_not_a_failure() {
        let result = ScenarioResult::failed(&WorkKey::new("mainnet", "A"), "");
        assert!(!result.is_failure());
    }

    #[test]
    fn test_result_message_shape() {
        let key = WorkKey::new("goerli", "C");
        let mut result = ScenarioResult::failed(&key, "x");
        result.elapsed = Some(Duration::from_millis(1500));
        result.diff = Some(Diff::new("1", "2"));

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["base"], "goerli");
        assert_eq!(value["elapsed"], 1500);
        assert_eq!(value["error"], "x");
        assert_eq!(value["diff"]["expected"], "2");
        // Unset optionals and a false skipped flag stay off the wire
        assert!(value.get("trace").is_none());
        assert!(value.get("skipped").is_none());

        let parsed: ScenarioResult = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, result);
        assert_eq!(parsed.key(), key);
    }
}

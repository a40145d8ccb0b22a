use anyhow::Result;
use serde::Serialize;
use std::time::UNIX_EPOCH;

use super::{ReportGenerator, ReportMetadata};
use crate::parallel::RunSummary;
use crate::scenario::ScenarioResult;

/// Machine-readable report
///
/// Results keep collection order: skipped items first, as filtered, then
/// executed items in completion order.
pub struct JsonReport;

#[derive(Serialize)]
struct JsonDocument<'a> {
    run_id: String,
    version: &'static str,
    generated_at_ms: u64,
    elapsed_ms: u64,
    passed: usize,
    failed: usize,
    skipped: usize,
    success: bool,
    results: Vec<&'a ScenarioResult>,
}

impl ReportGenerator for JsonReport {
    fn generate(&self, summary: &RunSummary, metadata: &ReportMetadata) -> Result<String> {
        let document = JsonDocument {
            run_id: metadata.run_id.to_string(),
            version: metadata.version,
            generated_at_ms: metadata
                .generated_at
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
            elapsed_ms: summary.elapsed.as_millis() as u64,
            passed: summary.passed(),
            failed: summary.failed(),
            skipped: summary.skipped(),
            success: !summary.has_failures(),
            results: summary.results.iter().collect(),
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{Diff, WorkKey};
    use std::time::Duration;

    #[test]
    fn test_json_document_shape() {
        let mut mismatch = ScenarioResult::failed(&WorkKey::new("mainnet", "cmp"), "output mismatch");
        mismatch.diff = Some(Diff::new("41", "42"));
        let summary = RunSummary {
            results: vec![
                ScenarioResult::passed(&WorkKey::new("mainnet", "ok"), Duration::from_millis(12)),
                mismatch,
                ScenarioResult::skipped(&WorkKey::new("mainnet", "later")),
            ],
            elapsed: Duration::from_millis(40),
        };
        let metadata = ReportMetadata {
            generated_at: UNIX_EPOCH + Duration::from_secs(1_700_000_000),
            ..ReportMetadata::new()
        };

        let rendered = JsonReport.generate(&summary, &metadata).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["run_id"], metadata.run_id.to_string());
        assert_eq!(value["generated_at_ms"], 1_700_000_000_000u64);
        assert_eq!(value["elapsed_ms"], 40);
        assert_eq!(value["passed"], 1);
        assert_eq!(value["failed"], 1);
        assert_eq!(value["skipped"], 1);
        assert_eq!(value["success"], false);

        let results = value["results"].as_array().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0]["elapsed"], 12);
        assert!(results[0].get("error").is_none());
        assert_eq!(results[1]["scenario"], "cmp");
        assert_eq!(results[1]["diff"]["expected"], "42");
        assert_eq!(results[2]["skipped"], true);
    }
}

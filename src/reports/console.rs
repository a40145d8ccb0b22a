use anyhow::Result;
use console::style;
use std::fmt::Write;

use super::{ReportGenerator, ReportMetadata, sorted_results};
use crate::parallel::RunSummary;
use crate::scenario::ScenarioResult;

/// Human-readable report grouped by base
///
/// Results are sorted by base, then scenario, so the skipped-first collection
/// order is only kept by [`JsonReport`](super::JsonReport).
pub struct ConsoleReport;

impl ReportGenerator for ConsoleReport {
    fn generate(&self, summary: &RunSummary, _metadata: &ReportMetadata) -> Result<String> {
        let mut out = String::new();
        let mut current_base: Option<&str> = None;

        for result in sorted_results(summary) {
            if current_base != Some(result.base.as_str()) {
                if current_base.is_some() {
                    out.push('\n');
                }
                writeln!(out, "{}", style(&result.base).bold().cyan())?;
                current_base = Some(result.base.as_str());
            }
            write_result(&mut out, result)?;
        }

        if !summary.results.is_empty() {
            out.push('\n');
        }
        write!(out, "{}", summary_line(summary))?;
        Ok(out)
    }
}

fn write_result(out: &mut String, result: &ScenarioResult) -> Result<()> {
    if result.skipped {
        writeln!(
            out,
            "  {} {}",
            style("-").dim(),
            style(format!("{} (skipped)", result.scenario)).dim()
        )?;
        return Ok(());
    }

    let timing = result
        .elapsed
        .map(|elapsed| format!(" {}", style(format!("({}ms)", elapsed.as_millis())).dim()))
        .unwrap_or_default();

    if !result.is_failure() {
        writeln!(out, "  {} {}{timing}", style("✓").green().bold(), result.scenario)?;
        return Ok(());
    }

    writeln!(out, "  {} {}{timing}", style("✗").red().bold(), style(&result.scenario).red())?;
    if let Some(error) = &result.error {
        writeln!(out, "      {}", style(error).red())?;
    }
    if let Some(trace) = &result.trace {
        for line in trace.lines() {
            writeln!(out, "      {}", style(line).dim())?;
        }
    }
    if let Some(diff) = &result.diff {
        writeln!(out, "      {} {}", style("expected:").dim(), style(&diff.expected).green())?;
        writeln!(out, "      {} {}", style("actual:  ").dim(), style(&diff.actual).red())?;
    }
    Ok(())
}

/// `N passed, N failed, N skipped in Xs`
fn summary_line(summary: &RunSummary) -> String {
    let failed = summary.failed();
    let failed_text = format!("{failed} failed");
    let failed_styled = if failed > 0 {
        style(failed_text).red().bold()
    } else {
        style(failed_text).dim()
    };

    format!(
        "{}, {}, {} in {:.2}s",
        style(format!("{} passed", summary.passed())).green(),
        failed_styled,
        style(format!("{} skipped", summary.skipped())).dim(),
        summary.elapsed.as_secs_f64()
    )
}

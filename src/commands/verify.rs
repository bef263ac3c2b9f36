use crate::domain::models::VerifySummary;
use crate::domain::section::Document;
use crate::services::output::{format_exception_skeletons, format_failure, print_json, rule_report_out};
use crate::services::rules::load_rule_files;
use crate::services::verify::verify_all;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit status is the number of failed tests, saturated at 255.
pub fn handle_verify(
    doc: &Document,
    rules: &[PathBuf],
    gen: bool,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let suite = load_rule_files(rules)?;
    let reports = verify_all(doc, &suite);
    let failed: Vec<_> = reports.iter().filter(|r| r.failed()).collect();
    tracing::info!(tests = reports.len(), failed = failed.len(), "verification finished");

    if gen {
        for r in &failed {
            print!("{}", format_exception_skeletons(r));
        }
        return Ok(ExitCode::SUCCESS);
    }

    if json {
        print_json(VerifySummary {
            failed: failed.len(),
            tests: reports.iter().map(rule_report_out).collect(),
        })?;
    } else {
        for r in &failed {
            eprint!("{}", format_failure(r));
        }
    }
    Ok(ExitCode::from(failed.len().min(255) as u8))
}

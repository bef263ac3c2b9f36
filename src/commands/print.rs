use crate::domain::section::Document;
use crate::services::output::{format_section, print_json, section_report, section_values};
use std::process::ExitCode;

pub fn handle_print(doc: &Document, json: bool, lineno: bool) -> anyhow::Result<ExitCode> {
    let sections = doc.by_line();
    if json {
        let reports: Vec<_> = sections
            .iter()
            .map(|s| section_report(s, section_values(s)))
            .collect();
        print_json(reports)?;
    } else {
        for s in sections {
            println!("{}", format_section(s, lineno, None));
        }
    }
    Ok(ExitCode::SUCCESS)
}

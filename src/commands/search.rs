use crate::cli::SearchArgs;
use crate::domain::section::Document;
use crate::services::output::{format_match, match_report, print_json};
use crate::services::query::{search, CompiledQuery};
use std::process::ExitCode;

pub fn handle_search(doc: &Document, args: &SearchArgs, json: bool) -> anyhow::Result<ExitCode> {
    let query = CompiledQuery::compile(args.section, &args.query(), args.lazy)?;
    let found = search(doc, &query);
    for m in &found {
        tracing::debug!(
            line = m.section().line(),
            superset = m.is_superset(),
            "matched section"
        );
    }

    if args.count {
        if json {
            print_json(serde_json::json!({ "count": found.len() }))?;
        } else {
            println!("{}", found.len());
        }
        return Ok(ExitCode::SUCCESS);
    }

    if json {
        let reports: Vec<_> = found.iter().map(|m| match_report(m, args.tidy)).collect();
        print_json(reports)?;
    } else {
        for m in &found {
            println!("{}", format_match(m, args.lineno, args.tidy));
        }
    }
    Ok(ExitCode::SUCCESS)
}

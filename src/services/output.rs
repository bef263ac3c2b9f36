use crate::domain::models::{JsonOut, MatchedValue, RuleReportOut, SectionReport};
use crate::domain::schema::KW_ARGS;
use crate::domain::section::Section;
use crate::domain::value::{Literal, ValueCell};
use crate::services::query::MatchResult;
use crate::services::verify::RuleReport;
use quick_xml::escape::escape;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

pub fn print_json<T: Serialize>(data: T) -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(&JsonOut { ok: true, data })?
    );
    Ok(())
}

/// `<path>:` then `<line>:\t<kind> <args>`.
pub fn section_header(section: &Section) -> String {
    format!(
        "{}:\n{}:\t{} {}",
        section.path(),
        section.line(),
        section.kind(),
        section.args().join(" ")
    )
}

fn line_label(line: Option<usize>) -> String {
    line.map(|l| l.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Header followed by every printable keyword line, in source line order.
/// With `only`, just those cells are rendered (matched fields).
pub fn format_section<'c>(
    section: &'c Section,
    lineno: bool,
    only: Option<&'c BTreeMap<String, ValueCell>>,
) -> String {
    let cells: Vec<&ValueCell> = match only {
        Some(subs) => subs.values().collect(),
        None => section.cells().iter().collect(),
    };

    let mut items: Vec<(&str, &Literal)> = cells
        .into_iter()
        .filter(|c| c.keyword() != KW_ARGS && c.is_printable())
        .flat_map(|c| c.values().iter().map(move |l| (c.keyword(), l)))
        .collect();
    items.sort_by_key(|(_, l)| l.line);

    let mut out = section_header(section);
    out.push('\n');
    for (keyword, literal) in items {
        if lineno {
            let _ = write!(out, "{}:", line_label(literal.line));
        }
        out.push_str("\t\t");
        out.push_str(keyword);
        if !literal.value.is_flag() {
            let _ = write!(out, ": {}", literal.value);
        }
        out.push('\n');
    }
    out
}

pub fn format_match(m: &MatchResult<'_>, lineno: bool, tidy: bool) -> String {
    let only = if tidy { Some(m.submatches()) } else { None };
    format_section(m.section(), lineno, only)
}

fn matched_values(cells: &BTreeMap<String, ValueCell>) -> Vec<MatchedValue> {
    let mut values: Vec<MatchedValue> = cells
        .iter()
        .flat_map(|(k, cell)| {
            cell.values().iter().map(move |l| MatchedValue {
                keyword: k.clone(),
                line: l.line,
                value: l.value.to_string(),
            })
        })
        .collect();
    values.sort_by_key(|v| v.line);
    values
}

pub fn section_report(section: &Section, values: Vec<MatchedValue>) -> SectionReport {
    SectionReport {
        path: section.path().to_string(),
        line: section.line(),
        section: section.kind(),
        args: section.args().join(" "),
        values,
    }
}

/// Every printable literal of a section, in line order.
pub fn section_values(section: &Section) -> Vec<MatchedValue> {
    let printable: BTreeMap<String, ValueCell> = section
        .cells()
        .iter()
        .filter(|c| c.keyword() != KW_ARGS && c.is_printable())
        .map(|c| (c.keyword().to_string(), c.clone()))
        .collect();
    matched_values(&printable)
}

/// JSON view of a match; `tidy` keeps only matched literals.
pub fn match_report(m: &MatchResult<'_>, tidy: bool) -> SectionReport {
    let values = if tidy {
        matched_values(m.submatches())
    } else {
        section_values(m.section())
    };
    section_report(m.section(), values)
}

pub fn rule_report_out(report: &RuleReport<'_>) -> RuleReportOut {
    RuleReportOut {
        name: report.rule.name.clone(),
        section: report.rule.section,
        passed: !report.failed(),
        violations: report
            .violations
            .iter()
            .map(|m| match_report(m, true))
            .collect(),
        errors: report.errors.iter().map(|e| e.to_string()).collect(),
    }
}

/// Text block for a failed rule: header plus each surviving literal.
pub fn format_failure(report: &RuleReport<'_>) -> String {
    let mut out = format!("Failed test({}):\n", report.rule.name);
    for e in &report.errors {
        let _ = writeln!(out, "\terror: {}", e);
    }
    for m in &report.violations {
        out.push_str(&section_header(m.section()));
        out.push('\n');
        for (keyword, cell) in m.submatches() {
            for literal in cell.sorted_by_line() {
                let _ = writeln!(
                    out,
                    "\t\t{}({}) : {}",
                    keyword,
                    line_label(literal.line),
                    literal.value
                );
            }
        }
    }
    out
}

/// `<except>` skeletons that would excuse each violation of a failed rule.
pub fn format_exception_skeletons(report: &RuleReport<'_>) -> String {
    let mut out = format!("<!-- Failed test({}) -->\n", escape(report.rule.name.as_str()));
    for m in &report.violations {
        out.push_str("  <except>\n");
        if let Some(first) = m.section().args().first() {
            let _ = writeln!(out, "    <keyword {}=\"{}\" />", KW_ARGS, escape(first.as_str()));
        }
        for (keyword, cell) in m.submatches() {
            for literal in cell.values() {
                let value = literal.value.to_string();
                let _ = writeln!(out, "    <keyword {}=\"{}\" />", keyword, escape(value.as_str()));
            }
        }
        out.push_str("  </except>\n");
    }
    out
}

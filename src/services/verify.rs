use crate::domain::models::Rule;
use crate::domain::section::Document;
use crate::services::query::{search, CompiledQuery, MatchResult, MatchSet, QueryError};

/// Outcome of one rule against one document.
#[derive(Debug)]
pub struct RuleReport<'a> {
    pub rule: &'a Rule,
    pub violations: Vec<MatchResult<'a>>,
    /// Searches or exceptions that could not be compiled; they are skipped.
    pub errors: Vec<QueryError>,
}

impl RuleReport<'_> {
    pub fn failed(&self) -> bool {
        !self.violations.is_empty() || !self.errors.is_empty()
    }
}

/// Runs every search of `rule`, deduplicates the hits, then lets the first
/// applicable exception trim each hit. Hits with literals left over are
/// violations.
pub fn verify_rule<'a>(doc: &'a Document, rule: &'a Rule) -> RuleReport<'a> {
    let kind = rule.section;
    let mut errors = Vec::new();

    let mut found = MatchSet::new();
    for s in &rule.searches {
        match CompiledQuery::compile(kind, &s.keywords, s.lazy) {
            Ok(query) => {
                for m in search(doc, &query) {
                    found.insert(m);
                }
            }
            Err(e) => {
                tracing::warn!(rule = %rule.name, error = %e, "skipping search");
                errors.push(e);
            }
        }
    }

    tracing::debug!(rule = %rule.name, candidates = found.len(), "searches collected");

    // Exceptions always match greedily.
    let exceptions: Vec<CompiledQuery> = rule
        .exceptions
        .iter()
        .filter_map(|e| match CompiledQuery::compile(kind, &e.keywords, false) {
            Ok(q) => Some(q),
            Err(err) => {
                tracing::warn!(rule = %rule.name, error = %err, "skipping exception");
                errors.push(err);
                None
            }
        })
        .collect();

    let mut violations = Vec::new();
    for mut m in found.into_vec() {
        let excused = exceptions
            .iter()
            .find_map(|e| e.match_section(m.section()))
            .map(|exception| m.filter(&exception))
            .unwrap_or(false);
        if excused {
            tracing::debug!(
                rule = %rule.name,
                line = m.section().line(),
                "match excused by exception"
            );
            continue;
        }
        violations.push(m);
    }

    tracing::info!(
        rule = %rule.name,
        violations = violations.len(),
        errors = errors.len(),
        "rule checked"
    );
    RuleReport {
        rule,
        violations,
        errors,
    }
}

pub fn verify_all<'a>(doc: &'a Document, rules: &'a [Rule]) -> Vec<RuleReport<'a>> {
    rules.iter().map(|r| verify_rule(doc, r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Exception, Query, Search};
    use crate::domain::schema::SectionKind;
    use crate::services::parser::parse_str;

    const TWO_WORLD_SOCKETS: &str = r#"
service foo /system/bin/foo -o a b c
  user system
  group system root media 59876
  priority -20
  socket foo stream 0666 system 59876 u:object_r:seclabel:s0

service bar /system/bin/bar -o a b c
  user system
  group system root media 59876
  priority -20
  socket bar stream 0666 system 59876 u:object_r:seclabel:s0
"#;

    fn q(pairs: &[(&str, &str)]) -> Query {
        let mut out = Query::new();
        for (k, v) in pairs {
            out.entry(k.to_string()).or_default().push(v.to_string());
        }
        out
    }

    fn world_socket_rule() -> Rule {
        let mut rule = Rule::new("No world sockets", SectionKind::Service);
        rule.searches.push(Search {
            lazy: false,
            keywords: q(&[("socket", "0[0-9]{2}[2-7]")]),
        });
        rule
    }

    fn except(args: &str, socket: &str) -> Exception {
        Exception {
            keywords: q(&[("args", args), ("socket", socket)]),
        }
    }

    #[test]
    fn clean_document_passes() {
        let doc = parse_str(
            "init.rc",
            "service foo /system/bin/foo\n  socket foo stream 0660 system 59876\n",
        )
        .unwrap();
        let rule = world_socket_rule();
        let report = verify_rule(&doc, &rule);
        assert!(report.violations.is_empty());
        assert!(!report.failed());
    }

    #[test]
    fn unexcused_services_each_violate() {
        let doc = parse_str("init.rc", TWO_WORLD_SOCKETS).unwrap();
        let rule = world_socket_rule();
        let report = verify_rule(&doc, &rule);
        assert_eq!(report.violations.len(), 2);
        assert!(report.failed());
    }

    #[test]
    fn exact_exceptions_excuse_everything() {
        let doc = parse_str("init.rc", TWO_WORLD_SOCKETS).unwrap();
        let mut rule = world_socket_rule();
        rule.exceptions.push(except(
            "foo /system/bin/foo -o a b c",
            "foo stream 0666 system 59876 u:object_r:seclabel:s0",
        ));
        rule.exceptions.push(except(
            "bar /system/bin/bar -o a b c",
            "bar stream 0666 system 59876 u:object_r:seclabel:s0",
        ));
        let report = verify_rule(&doc, &rule);
        assert!(report.violations.is_empty(), "{:?}", report.violations);
    }

    #[test]
    fn exception_that_does_not_match_leaves_violation() {
        let doc = parse_str("init.rc", TWO_WORLD_SOCKETS).unwrap();
        let mut rule = world_socket_rule();
        // The stored literal has the keyword stripped, so this never matches.
        rule.exceptions.push(except(
            "foo /system/bin/foo",
            "socket foo stream 0666 system 59876 u:object_r:seclabel:s0",
        ));
        rule.exceptions.push(except(
            "bar /system/bin/bar",
            "bar stream 0666",
        ));
        let report = verify_rule(&doc, &rule);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].section().args()[0], "foo /system/bin/foo -o a b c");
    }

    #[test]
    fn overlapping_searches_are_deduplicated() {
        let doc = parse_str("init.rc", TWO_WORLD_SOCKETS).unwrap();
        let mut rule = world_socket_rule();
        rule.searches.push(Search {
            lazy: false,
            keywords: q(&[("socket", "0666")]),
        });
        let report = verify_rule(&doc, &rule);
        assert_eq!(report.violations.len(), 2);
    }

    #[test]
    fn lazy_search_requires_whole_value() {
        let doc = parse_str("init.rc", TWO_WORLD_SOCKETS).unwrap();
        let mut rule = Rule::new("lazy", SectionKind::Service);
        rule.searches.push(Search {
            lazy: true,
            keywords: q(&[("socket", "0666")]),
        });
        assert!(verify_rule(&doc, &rule).violations.is_empty());
    }

    #[test]
    fn bad_search_is_recorded_not_fatal() {
        let doc = parse_str("init.rc", TWO_WORLD_SOCKETS).unwrap();
        let mut rule = world_socket_rule();
        rule.searches.push(Search {
            lazy: false,
            keywords: q(&[("priority", "=)")]),
        });
        rule.exceptions.push(Exception {
            keywords: q(&[("command", "x")]),
        });
        let report = verify_rule(&doc, &rule);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.violations.len(), 2);
    }

    #[test]
    fn repeated_runs_agree() {
        let doc = parse_str("init.rc", TWO_WORLD_SOCKETS).unwrap();
        let mut rule = world_socket_rule();
        rule.exceptions.push(except("bar", "bar stream"));
        let first: Vec<_> = verify_rule(&doc, &rule)
            .violations
            .iter()
            .map(|m| (m.section_id(), m.submatches().len()))
            .collect();
        let second: Vec<_> = verify_rule(&doc, &rule)
            .violations
            .iter()
            .map(|m| (m.section_id(), m.submatches().len()))
            .collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }
}

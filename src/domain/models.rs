use crate::domain::schema::SectionKind;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Keyword to the patterns that must all be satisfied.
pub type Query = BTreeMap<String, Vec<String>>;

#[derive(Serialize)]
pub struct JsonOut<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many_map<'de, D>(deserializer: D) -> Result<Query, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, OneOrMany> = BTreeMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(k, v)| match v {
            OneOrMany::One(s) => (k, vec![s]),
            OneOrMany::Many(list) => (k, list),
        })
        .collect())
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct Search {
    #[serde(default)]
    pub lazy: bool,
    #[serde(deserialize_with = "one_or_many_map")]
    pub keywords: Query,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Exception {
    #[serde(deserialize_with = "one_or_many_map")]
    pub keywords: Query,
}

fn default_rule_name() -> String {
    "unnamed".to_string()
}

/// A named verification test: what to flag and what to excuse.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Rule {
    #[serde(default = "default_rule_name")]
    pub name: String,
    pub section: SectionKind,
    #[serde(default)]
    pub searches: Vec<Search>,
    #[serde(default, rename = "except")]
    pub exceptions: Vec<Exception>,
}

impl Rule {
    pub fn new(name: impl Into<String>, section: SectionKind) -> Self {
        Self {
            name: name.into(),
            section,
            searches: Vec::new(),
            exceptions: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RuleSuite {
    #[serde(default)]
    pub tests: Vec<Rule>,
}

#[derive(Serialize, Clone, Debug)]
pub struct MatchedValue {
    pub keyword: String,
    pub line: Option<usize>,
    pub value: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct SectionReport {
    pub path: String,
    pub line: usize,
    pub section: SectionKind,
    pub args: String,
    pub values: Vec<MatchedValue>,
}

#[derive(Serialize, Debug)]
pub struct RuleReportOut {
    pub name: String,
    pub section: SectionKind,
    pub passed: bool,
    pub violations: Vec<SectionReport>,
    pub errors: Vec<String>,
}

#[derive(Serialize, Debug)]
pub struct VerifySummary {
    pub failed: usize,
    pub tests: Vec<RuleReportOut>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_rules_accept_single_or_list_patterns() {
        let raw = r#"{
            "tests": [{
                "name": "No world sockets",
                "section": "service",
                "searches": [{"keywords": {"socket": "0[0-9]{2}[2-7]"}}],
                "except": [{"keywords": {"args": ["foo"], "socket": ["a", "b"]}}]
            }]
        }"#;
        let suite: RuleSuite = serde_json::from_str(raw).unwrap();
        let rule = &suite.tests[0];
        assert_eq!(rule.section, SectionKind::Service);
        assert!(!rule.searches[0].lazy);
        assert_eq!(rule.searches[0].keywords["socket"], vec!["0[0-9]{2}[2-7]"]);
        assert_eq!(rule.exceptions[0].keywords["socket"].len(), 2);
    }

    #[test]
    fn rule_name_defaults_to_unnamed() {
        let rule: Rule = serde_json::from_str(r#"{"section": "on"}"#).unwrap();
        assert_eq!(rule.name, "unnamed");
        assert!(rule.searches.is_empty());
    }
}

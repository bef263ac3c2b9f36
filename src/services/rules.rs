use crate::domain::models::{Exception, Query, Rule, RuleSuite, Search};
use crate::domain::schema::SectionKind;
use anyhow::Context;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum RuleError {
    #[error("unknown element <{0}>")]
    UnknownElement(String),
    #[error("<{element}> outside of {expected}")]
    Misplaced {
        element: &'static str,
        expected: &'static str,
    },
    #[error("test \"{name}\" has unknown section \"{section}\"")]
    UnknownSection { name: String, section: String },
    #[error("test is missing the section attribute")]
    MissingSection,
    #[error("invalid boolean \"{0}\" for lazy attribute")]
    InvalidLazy(String),
}

enum Block {
    Search(Search),
    Except(Query),
}

/// Reads rule suites in the order given. `.json` files are JSON suites,
/// everything else is parsed as XML.
pub fn load_rule_files<P: AsRef<Path>>(paths: &[P]) -> anyhow::Result<Vec<Rule>> {
    let mut rules = Vec::new();
    for p in paths {
        let p = p.as_ref();
        let raw =
            std::fs::read_to_string(p).with_context(|| format!("failed to read {}", p.display()))?;
        let is_json = p.extension().is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            serde_json::from_str::<RuleSuite>(&raw)
                .map(|s| s.tests)
                .map_err(anyhow::Error::from)
        } else {
            parse_xml_rules(&raw)
        };
        let loaded = parsed.with_context(|| format!("invalid rule file {}", p.display()))?;
        tracing::debug!(path = %p.display(), tests = loaded.len(), "loaded rules");
        rules.extend(loaded);
    }
    Ok(rules)
}

/// Parses `<suite><test name section><search><keyword k="v"/></search>
/// <except>...</except></test></suite>`.
pub fn parse_xml_rules(raw: &str) -> anyhow::Result<Vec<Rule>> {
    let mut reader = Reader::from_str(raw);
    reader.config_mut().trim_text(true);

    let mut tests = Vec::new();
    let mut current: Option<Rule> = None;
    let mut block: Option<Block> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                open_element(&e, &mut current, &mut block)?;
            }
            Event::Empty(e) => {
                open_element(&e, &mut current, &mut block)?;
                close_element(e.name().as_ref(), &mut current, &mut block, &mut tests)?;
            }
            Event::End(e) => {
                close_element(e.name().as_ref(), &mut current, &mut block, &mut tests)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(tests)
}

fn attributes(e: &BytesStart<'_>) -> anyhow::Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        out.push((key, value));
    }
    Ok(out)
}

fn parse_lazy(value: &str) -> Result<bool, RuleError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(RuleError::InvalidLazy(value.to_string())),
    }
}

fn open_element(
    e: &BytesStart<'_>,
    current: &mut Option<Rule>,
    block: &mut Option<Block>,
) -> anyhow::Result<()> {
    let attrs = attributes(e)?;
    match e.name().as_ref() {
        b"suite" => {}
        b"test" => {
            let name = attrs
                .iter()
                .find(|(k, _)| k == "name")
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| "unnamed".to_string());
            let section = attrs
                .iter()
                .find(|(k, _)| k == "section")
                .map(|(_, v)| v.as_str())
                .ok_or(RuleError::MissingSection)?;
            let kind = SectionKind::from_keyword(section).ok_or_else(|| RuleError::UnknownSection {
                name: name.clone(),
                section: section.to_string(),
            })?;
            *current = Some(Rule::new(name, kind));
        }
        b"search" => {
            if current.is_none() {
                return Err(RuleError::Misplaced {
                    element: "search",
                    expected: "<test>",
                }
                .into());
            }
            let lazy = match attrs.iter().find(|(k, _)| k == "lazy") {
                Some((_, v)) => parse_lazy(v)?,
                None => false,
            };
            *block = Some(Block::Search(Search {
                lazy,
                keywords: Query::new(),
            }));
        }
        b"except" => {
            if current.is_none() {
                return Err(RuleError::Misplaced {
                    element: "except",
                    expected: "<test>",
                }
                .into());
            }
            *block = Some(Block::Except(Query::new()));
        }
        b"keyword" => {
            let query = match block {
                Some(Block::Search(s)) => &mut s.keywords,
                Some(Block::Except(q)) => q,
                None => {
                    return Err(RuleError::Misplaced {
                        element: "keyword",
                        expected: "<search> or <except>",
                    }
                    .into())
                }
            };
            for (k, v) in attrs {
                query.entry(k).or_default().push(v);
            }
        }
        other => {
            return Err(RuleError::UnknownElement(String::from_utf8_lossy(other).into_owned()).into())
        }
    }
    Ok(())
}

fn close_element(
    name: &[u8],
    current: &mut Option<Rule>,
    block: &mut Option<Block>,
    tests: &mut Vec<Rule>,
) -> anyhow::Result<()> {
    match name {
        b"test" => {
            if let Some(rule) = current.take() {
                tests.push(rule);
            }
        }
        b"search" | b"except" => {
            if let (Some(rule), Some(done)) = (current.as_mut(), block.take()) {
                match done {
                    Block::Search(s) => rule.searches.push(s),
                    Block::Except(q) => rule.exceptions.push(Exception { keywords: q }),
                }
            }
        }
        _ => {}
    }
    Ok(())
}

use crate::domain::models::Query;
use crate::domain::schema::SectionKind;
use crate::domain::section::{Document, Section, SectionId};
use crate::domain::value::{Literal, ValueCell};
use crate::services::matcher::{Matcher, MatcherError};
use std::collections::{BTreeMap, HashMap};

#[derive(thiserror::Error, Debug, Clone)]
pub enum QueryError {
    #[error("invalid keywords for section {kind}: {}", .keys.join(", "))]
    InvalidQueryKey { kind: SectionKind, keys: Vec<String> },
    #[error("bad pattern for keyword \"{keyword}\": {source}")]
    Matcher {
        keyword: String,
        #[source]
        source: MatcherError,
    },
}

/// Rejects keys that the kind's schema does not define.
pub fn validate_keys(kind: SectionKind, query: &Query) -> Result<(), QueryError> {
    let schema = kind.schema();
    let invalid: Vec<String> = query
        .keys()
        .filter(|k| schema.keyword(k).is_none())
        .cloned()
        .collect();
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(QueryError::InvalidQueryKey {
            kind,
            keys: invalid,
        })
    }
}

#[derive(Debug)]
struct Term {
    keyword: String,
    matchers: Vec<Matcher>,
}

/// A validated query with one matcher per requested pattern.
#[derive(Debug)]
pub struct CompiledQuery {
    kind: SectionKind,
    terms: Vec<Term>,
}

impl CompiledQuery {
    pub fn compile(kind: SectionKind, query: &Query, lazy: bool) -> Result<Self, QueryError> {
        validate_keys(kind, query)?;
        let schema = kind.schema();
        let mut terms = Vec::with_capacity(query.len());
        for (keyword, patterns) in query {
            // validate_keys guarantees the lookup.
            let Some(spec) = schema.keyword(keyword) else {
                continue;
            };
            let matchers = patterns
                .iter()
                .map(|p| Matcher::for_keyword(spec.kind, p, lazy))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| QueryError::Matcher {
                    keyword: keyword.clone(),
                    source,
                })?;
            terms.push(Term {
                keyword: keyword.clone(),
                matchers,
            });
        }
        tracing::debug!(%kind, terms = terms.len(), lazy, "compiled query");
        Ok(Self { kind, terms })
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    /// Tests one section. Every keyword needs at least as many
    /// (literal, pattern) hits as it has patterns; a literal may count
    /// toward several patterns.
    pub fn match_section<'a>(&self, section: &'a Section) -> Option<MatchResult<'a>> {
        let mut submatches = BTreeMap::new();

        for term in &self.terms {
            let cell = section.cell(&term.keyword)?;
            if cell.is_empty() {
                return None;
            }

            let mut found = 0usize;
            let mut sub: Option<ValueCell> = None;
            for literal in cell.values() {
                let candidate = literal.value.to_string();
                let hits = term.matchers.iter().filter(|m| m.is_match(&candidate)).count();
                if hits == 0 {
                    continue;
                }
                found += hits;
                sub.get_or_insert_with(|| cell.reset()).record(literal.clone());
            }

            if found < term.matchers.len() {
                return None;
            }
            if let Some(sub) = sub {
                submatches.insert(term.keyword.clone(), sub);
            }
        }

        let superset = section.schema().keywords.len() > self.terms.len();
        Some(MatchResult {
            section,
            submatches,
            superset,
        })
    }
}

/// Runs a compiled query over every section of its kind, in parse order.
pub fn search<'a>(doc: &'a Document, query: &CompiledQuery) -> Vec<MatchResult<'a>> {
    let found: Vec<_> = doc
        .sections(query.kind())
        .iter()
        .filter_map(|s| query.match_section(s))
        .collect();
    tracing::debug!(kind = %query.kind(), matches = found.len(), "search finished");
    found
}

/// One section satisfying a query, with the literals that satisfied it.
#[derive(Clone, Debug)]
pub struct MatchResult<'a> {
    section: &'a Section,
    submatches: BTreeMap<String, ValueCell>,
    superset: bool,
}

impl<'a> MatchResult<'a> {
    pub fn section(&self) -> &'a Section {
        self.section
    }

    pub fn section_id(&self) -> SectionId {
        self.section.id()
    }

    pub fn submatches(&self) -> &BTreeMap<String, ValueCell> {
        &self.submatches
    }

    /// True when the section's schema has keywords the query did not name.
    pub fn is_superset(&self) -> bool {
        self.superset
    }

    /// Containment check used for deduplication: same section, and every
    /// keyword in `other` is present here with the same literals. Not
    /// symmetric; `self` may carry keywords `other` lacks.
    pub fn subsumes(&self, other: &MatchResult<'_>) -> bool {
        if self.section_id() != other.section_id() {
            return false;
        }
        other.submatches.iter().all(|(k, theirs)| {
            self.submatches
                .get(k)
                .is_some_and(|mine| mine.values() == theirs.values())
        })
    }

    /// Removes from this match every literal the exception also matched, on
    /// the keywords both share. Keywords left empty are dropped. Returns
    /// true when nothing is left, i.e. the exception fully excuses the match.
    pub fn filter(&mut self, exception: &MatchResult<'_>) -> bool {
        let mut left = BTreeMap::new();
        for (keyword, mut cell) in std::mem::take(&mut self.submatches) {
            let Some(excused) = exception.submatches.get(&keyword) else {
                continue;
            };
            let mut remaining: Vec<Literal> = cell.values().to_vec();
            for e in excused.values() {
                if let Some(pos) = remaining.iter().position(|l| l.value == e.value) {
                    remaining.remove(pos);
                }
            }
            if !remaining.is_empty() {
                cell.retain_literals(remaining);
                left.insert(keyword, cell);
            }
        }
        self.submatches = left;
        self.submatches.is_empty()
    }
}

/// Insertion-ordered set of matches keyed by section identity. A new match
/// is dropped when an existing entry already subsumes it.
#[derive(Debug, Default)]
pub struct MatchSet<'a> {
    entries: Vec<MatchResult<'a>>,
    by_section: HashMap<SectionId, Vec<usize>>,
}

impl<'a> MatchSet<'a> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            by_section: HashMap::new(),
        }
    }

    pub fn insert(&mut self, m: MatchResult<'a>) -> bool {
        let bucket = self.by_section.entry(m.section_id()).or_default();
        if bucket.iter().any(|&i| self.entries[i].subsumes(&m)) {
            return false;
        }
        bucket.push(self.entries.len());
        self.entries.push(m);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<MatchResult<'a>> {
        self.entries
    }
}

use crate::domain::schema::{LinePolicy, SectionKind, SectionSchema, KW_ARGS};
use crate::domain::value::{ValueCell, ValueError};
use std::collections::BTreeMap;

/// Position of a section within its document; used as its identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SectionId(pub usize);

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SectionError {
    #[error("invalid {kind} option: \"{keyword}\"")]
    SchemaViolation { kind: SectionKind, keyword: String },
    #[error(transparent)]
    Value(#[from] ValueError),
}

#[derive(Clone, Debug)]
pub struct Section {
    id: SectionId,
    kind: SectionKind,
    path: String,
    line: usize,
    cells: Vec<ValueCell>,
}

impl Section {
    /// Builds a section with fresh cells from its kind's schema.
    pub fn new(
        id: SectionId,
        kind: SectionKind,
        args: &str,
        path: impl Into<String>,
        line: usize,
    ) -> Result<Self, SectionError> {
        let schema = kind.schema();
        let cells = schema
            .keywords
            .iter()
            .map(|spec| ValueCell::new(spec, schema.on_duplicate))
            .collect();
        let mut section = Self {
            id,
            kind,
            path: path.into(),
            line,
            cells,
        };
        section.push_keyword(KW_ARGS, args, line)?;
        Ok(section)
    }

    pub fn id(&self) -> SectionId {
        self.id
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    pub fn schema(&self) -> &'static SectionSchema {
        self.kind.schema()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn cells(&self) -> &[ValueCell] {
        &self.cells
    }

    pub fn cell(&self, keyword: &str) -> Option<&ValueCell> {
        self.cells.iter().find(|c| c.keyword() == keyword)
    }

    pub fn args(&self) -> Vec<String> {
        self.cell(KW_ARGS)
            .map(|c| c.values().iter().map(|l| l.value.to_string()).collect())
            .unwrap_or_default()
    }

    /// Feeds one body line according to the schema's line policy.
    pub fn push_line(&mut self, line: &str, lineno: usize) -> Result<(), SectionError> {
        match self.schema().lines {
            LinePolicy::Verbatim(keyword) => self.push_keyword(keyword, line, lineno),
            LinePolicy::Keyword => {
                let mut tokens = line.split_whitespace();
                let keyword = tokens.next().unwrap_or_default();
                let value = tokens.collect::<Vec<_>>().join(" ");
                self.push_keyword(keyword, &value, lineno)
            }
            LinePolicy::Closed => Err(SectionError::SchemaViolation {
                kind: self.kind,
                keyword: line.split_whitespace().next().unwrap_or_default().to_string(),
            }),
        }
    }

    fn push_keyword(&mut self, keyword: &str, value: &str, lineno: usize) -> Result<(), SectionError> {
        let kind = self.kind;
        let cell = self
            .cells
            .iter_mut()
            .find(|c| c.keyword() == keyword)
            .ok_or_else(|| SectionError::SchemaViolation {
                kind,
                keyword: keyword.to_string(),
            })?;
        cell.push(value, lineno)?;
        Ok(())
    }
}

/// Every parsed section, grouped by kind, in parse order.
#[derive(Debug, Default)]
pub struct Document {
    sections: BTreeMap<SectionKind, Vec<Section>>,
    count: usize,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> SectionId {
        SectionId(self.count)
    }

    pub fn insert(&mut self, section: Section) {
        self.count += 1;
        self.sections.entry(section.kind()).or_default().push(section);
    }

    pub fn sections(&self, kind: SectionKind) -> &[Section] {
        self.sections.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// All sections, stably ordered by starting line.
    pub fn by_line(&self) -> Vec<&Section> {
        let mut all: Vec<&Section> = SectionKind::ALL
            .iter()
            .flat_map(|k| self.sections(*k))
            .collect();
        all.sort_by_key(|s| s.line());
        all
    }
}

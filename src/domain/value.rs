use crate::domain::schema::{KeywordKind, KeywordSpec, OnDuplicate};
use serde::Serialize;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Flag(bool),
    Text(String),
}

impl Value {
    pub fn is_flag(&self) -> bool {
        matches!(self, Value::Flag(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Flag(b) => write!(f, "{}", b),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// One occurrence of a keyword. Seeded defaults have no line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Literal {
    pub value: Value,
    pub line: Option<usize>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("expected {0} keyword to only appear once")]
    DuplicateSingleValue(&'static str),
}

/// All occurrences of one keyword within one section.
#[derive(Clone, Debug)]
pub struct ValueCell {
    spec: &'static KeywordSpec,
    on_duplicate: OnDuplicate,
    literals: Vec<Literal>,
    is_set: bool,
}

impl ValueCell {
    pub fn new(spec: &'static KeywordSpec, on_duplicate: OnDuplicate) -> Self {
        let literals = spec
            .default
            .map(|d| {
                vec![Literal {
                    value: Value::Text(d.to_string()),
                    line: None,
                }]
            })
            .unwrap_or_default();
        Self {
            spec,
            on_duplicate,
            literals,
            is_set: false,
        }
    }

    pub fn keyword(&self) -> &'static str {
        self.spec.name
    }

    pub fn is_set(&self) -> bool {
        self.is_set
    }

    pub fn is_printable(&self) -> bool {
        self.is_set || self.spec.default_printable
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Literals in the order they were pushed.
    pub fn values(&self) -> &[Literal] {
        &self.literals
    }

    pub fn sorted_by_line(&self) -> Vec<&Literal> {
        let mut out: Vec<&Literal> = self.literals.iter().collect();
        out.sort_by_key(|l| l.line);
        out
    }

    pub fn push(&mut self, text: &str, line: usize) -> Result<(), ValueError> {
        let repeatable = self.spec.kind.is_repeatable();
        if !repeatable && self.is_set && self.on_duplicate == OnDuplicate::Reject {
            return Err(ValueError::DuplicateSingleValue(self.spec.name));
        }

        let value = match self.spec.kind {
            KeywordKind::Flag => Value::Flag(true),
            _ => Value::Text(text.to_string()),
        };
        let item = Literal {
            value,
            line: Some(line),
        };
        if repeatable {
            self.literals.push(item);
        } else {
            self.literals = vec![item];
        }
        self.is_set = true;
        Ok(())
    }

    /// Empty, unset copy sharing this cell's schema slot.
    pub fn reset(&self) -> Self {
        Self {
            spec: self.spec,
            on_duplicate: self.on_duplicate,
            literals: Vec::new(),
            is_set: false,
        }
    }

    /// Appends an existing literal as-is; used when building match subsets.
    pub(crate) fn record(&mut self, literal: Literal) {
        self.literals.push(literal);
        self.is_set = true;
    }

    pub(crate) fn retain_literals(&mut self, literals: Vec<Literal>) {
        self.literals = literals;
    }
}

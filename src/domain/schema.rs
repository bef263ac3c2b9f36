use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const KW_ARGS: &str = "args";
pub const KW_COMMAND: &str = "command";

/// Section kinds recognised at the start of a line.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Import,
    On,
    Service,
}

impl SectionKind {
    pub const ALL: [SectionKind; 3] = [SectionKind::Import, SectionKind::On, SectionKind::Service];

    pub fn keyword(self) -> &'static str {
        match self {
            SectionKind::Import => "import",
            SectionKind::On => "on",
            SectionKind::Service => "service",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.keyword() == word)
    }

    pub fn schema(self) -> &'static SectionSchema {
        match self {
            SectionKind::Import => &IMPORT_SCHEMA,
            SectionKind::On => &ON_SCHEMA,
            SectionKind::Service => &SERVICE_SCHEMA,
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// How a keyword stores and compares its values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeywordKind {
    /// Presence switch; the pushed text is ignored and `true` is stored.
    Flag,
    /// Single text value.
    Text,
    /// Text value that may occur any number of times.
    Repeatable,
    /// Single integer value, queried with numeric expressions.
    Numeric,
}

impl KeywordKind {
    pub fn is_repeatable(self) -> bool {
        matches!(self, KeywordKind::Repeatable)
    }
}

/// What happens when a single-valued keyword shows up twice in one section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnDuplicate {
    Reject,
    Overwrite,
}

/// How non-header lines inside a section are consumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinePolicy {
    /// No body lines are accepted.
    Closed,
    /// Whole line is appended verbatim to the named keyword.
    Verbatim(&'static str),
    /// First token names the keyword, the rest is its value.
    Keyword,
}

#[derive(Debug)]
pub struct KeywordSpec {
    pub name: &'static str,
    pub kind: KeywordKind,
    /// Seeded as a literal without a line number when the section is created.
    pub default: Option<&'static str>,
    pub default_printable: bool,
}

impl KeywordSpec {
    const fn new(name: &'static str, kind: KeywordKind) -> Self {
        Self {
            name,
            kind,
            default: None,
            default_printable: false,
        }
    }

    const fn with_default(mut self, value: &'static str, printable: bool) -> Self {
        self.default = Some(value);
        self.default_printable = printable;
        self
    }
}

/// Immutable per-kind schema. Sections build their own cells from it.
#[derive(Debug)]
pub struct SectionSchema {
    pub keywords: &'static [KeywordSpec],
    pub on_duplicate: OnDuplicate,
    pub lines: LinePolicy,
}

impl SectionSchema {
    pub fn keyword(&self, name: &str) -> Option<&'static KeywordSpec> {
        self.keywords.iter().find(|k| k.name == name)
    }
}

const ARGS: KeywordSpec = KeywordSpec::new(KW_ARGS, KeywordKind::Repeatable);

static IMPORT_SCHEMA: SectionSchema = SectionSchema {
    keywords: &[ARGS],
    on_duplicate: OnDuplicate::Reject,
    lines: LinePolicy::Closed,
};

static ON_SCHEMA: SectionSchema = SectionSchema {
    keywords: &[ARGS, KeywordSpec::new(KW_COMMAND, KeywordKind::Repeatable)],
    on_duplicate: OnDuplicate::Reject,
    lines: LinePolicy::Verbatim(KW_COMMAND),
};

// Flags default to false and priority to 0; both stay implicit, so the cells
// are empty until the keyword appears.
static SERVICE_SCHEMA: SectionSchema = SectionSchema {
    keywords: &[
        ARGS,
        KeywordSpec::new("console", KeywordKind::Flag),
        KeywordSpec::new("critical", KeywordKind::Flag),
        KeywordSpec::new("disabled", KeywordKind::Flag),
        KeywordSpec::new("setenv", KeywordKind::Repeatable),
        KeywordSpec::new("getenv", KeywordKind::Repeatable),
        KeywordSpec::new("socket", KeywordKind::Repeatable),
        KeywordSpec::new("user", KeywordKind::Text).with_default("root", true),
        KeywordSpec::new("group", KeywordKind::Text).with_default("root", true),
        KeywordSpec::new("seclabel", KeywordKind::Text),
        KeywordSpec::new("oneshot", KeywordKind::Flag),
        KeywordSpec::new("class", KeywordKind::Text).with_default("default", false),
        KeywordSpec::new("ioprio", KeywordKind::Text),
        KeywordSpec::new("onrestart", KeywordKind::Repeatable),
        KeywordSpec::new("writepid", KeywordKind::Repeatable),
        KeywordSpec::new("keycodes", KeywordKind::Repeatable),
        KeywordSpec::new("priority", KeywordKind::Numeric),
        KeywordSpec::new("start", KeywordKind::Text),
    ],
    // Service keeps the last occurrence of a single-valued keyword while the
    // other kinds refuse a second one.
    on_duplicate: OnDuplicate::Overwrite,
    lines: LinePolicy::Keyword,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_round_trip_through_their_keyword() {
        for kind in SectionKind::ALL {
            assert_eq!(SectionKind::from_keyword(kind.keyword()), Some(kind));
        }
        assert_eq!(SectionKind::from_keyword("services"), None);
    }

    #[test]
    fn every_schema_carries_args() {
        for kind in SectionKind::ALL {
            let spec = kind.schema().keyword(KW_ARGS).expect("args keyword");
            assert!(spec.kind.is_repeatable());
        }
    }

    #[test]
    fn service_schema_marks_priority_numeric() {
        let schema = SectionKind::Service.schema();
        assert_eq!(
            schema.keyword("priority").map(|k| k.kind),
            Some(KeywordKind::Numeric)
        );
        assert_eq!(schema.keyword("user").and_then(|k| k.default), Some("root"));
        assert!(schema.keyword("command").is_none());
    }

    #[test]
    fn duplicate_policy_differs_between_kinds() {
        assert_eq!(SectionKind::Service.schema().on_duplicate, OnDuplicate::Overwrite);
        assert_eq!(SectionKind::On.schema().on_duplicate, OnDuplicate::Reject);
        assert_eq!(SectionKind::Import.schema().on_duplicate, OnDuplicate::Reject);
    }
}

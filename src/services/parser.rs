use crate::domain::schema::SectionKind;
use crate::domain::section::{Document, Section, SectionError};
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("{source} while parsing file \"{path}\" on line {line}")]
    Section {
        path: String,
        line: usize,
        #[source]
        source: SectionError,
    },
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A complete logical line after comment and continuation handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    pub number: usize,
    pub text: String,
}

/// Splits raw file text into logical lines.
///
/// Blank lines, `#` comments and `{{` template lines are dropped. A line
/// ending in `\` continues onto the next one; the joined line keeps the
/// number of its first physical line.
pub fn decode_lines(raw: &str) -> Vec<LogicalLine> {
    let mut out = Vec::new();
    let mut pending: Option<LogicalLine> = None;

    for (idx, physical) in raw.lines().enumerate() {
        let number = idx + 1;
        let l = physical.trim();
        if l.is_empty() || l.starts_with('#') || l.starts_with("{{") {
            continue;
        }

        let acc = pending.get_or_insert_with(|| LogicalLine {
            number,
            text: String::new(),
        });
        if let Some(head) = l.strip_suffix('\\') {
            acc.text.push_str(head.trim_end());
            acc.text.push(' ');
            continue;
        }
        acc.text.push_str(l);
        if let Some(done) = pending.take() {
            out.push(done);
        }
    }

    // A dangling continuation at EOF still yields what was collected.
    if let Some(mut rest) = pending {
        rest.text = rest.text.trim_end().to_string();
        if !rest.text.is_empty() {
            out.push(rest);
        }
    }
    out
}

/// Folds the logical lines of one file into `doc`.
pub fn parse_lines(doc: &mut Document, path: &str, lines: &[LogicalLine]) -> Result<(), ParseError> {
    let mut current: Option<Section> = None;
    let mut parsed = 0usize;

    for line in lines {
        let wrap = |source| ParseError::Section {
            path: path.to_string(),
            line: line.number,
            source,
        };

        let mut tokens = line.text.split_whitespace();
        let head = tokens.next().unwrap_or_default();

        if let Some(kind) = SectionKind::from_keyword(head) {
            if let Some(done) = current.take() {
                doc.insert(done);
                parsed += 1;
            }
            let args = tokens.collect::<Vec<_>>().join(" ");
            let section = Section::new(doc.next_id(), kind, &args, path, line.number).map_err(wrap)?;
            current = Some(section);
        } else if let Some(section) = current.as_mut() {
            section.push_line(&line.text, line.number).map_err(wrap)?;
        } else {
            tracing::debug!(path, line = line.number, "ignoring line outside of any section");
        }
    }

    if let Some(done) = current.take() {
        doc.insert(done);
        parsed += 1;
    }
    tracing::debug!(path, sections = parsed, "parsed file");
    Ok(())
}

pub fn parse_str(path: &str, raw: &str) -> Result<Document, ParseError> {
    let mut doc = Document::new();
    parse_lines(&mut doc, path, &decode_lines(raw))?;
    Ok(doc)
}

/// Parses every file in order into one document. Any error aborts the run.
pub fn parse_files<P: AsRef<Path>>(paths: &[P]) -> Result<Document, ParseError> {
    let mut doc = Document::new();
    for p in paths {
        let p = p.as_ref();
        let raw = std::fs::read_to_string(p).map_err(|source| ParseError::Io {
            path: p.to_path_buf(),
            source,
        })?;
        parse_lines(&mut doc, &p.to_string_lossy(), &decode_lines(&raw))?;
    }
    tracing::info!(files = paths.len(), sections = doc.len(), "document loaded");
    Ok(doc)
}

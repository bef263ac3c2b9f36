//! Service layer containing parsing, matching and rendering logic.
//!
//! ## Service map
//! - `matcher.rs`: regex and numeric pattern matchers.
//! - `parser.rs`: logical line decoding and init.rc document parsing.
//! - `query.rs`: query compilation, section matching, exception filtering.
//! - `verify.rs`: rule evaluation into per-test reports.
//! - `rules.rs`: XML/JSON rule suite loading.
//! - `output.rs`: JSON/text output helpers.
//!
//! ## Conventions
//! - Prefer pure helpers where possible.
//! - File reads happen only in `parser.rs` and `rules.rs`.
//! - Keep command handlers thin; delegate to services.

pub mod matcher;
pub mod output;
pub mod parser;
pub mod query;
pub mod rules;
pub mod verify;

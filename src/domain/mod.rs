//! Shared data model layer.
//!
//! ## Files
//! - `schema.rs`: per-kind keyword schemas (immutable descriptors).
//! - `value.rs`: literals and the value cells that hold them.
//! - `section.rs`: parsed sections and the document that owns them.
//! - `models.rs`: queries, rules and report structs.
//!
//! ## Rule of thumb
//! Types here hold data and enforce schema invariants on push. Matching,
//! parsing and printing live in `services/*`.
//!
//! ## Compatibility note
//! `models.rs` report structs back the `--json` output; keep them in sync
//! with `docs/contracts/*`.

pub mod models;
pub mod schema;
pub mod section;
pub mod value;

//! Command handler layer.
//!
//! One handler per subcommand, selected by matching on `cli::Commands`.
//!
//! ## Files
//! - `print.rs`: dump every parsed section.
//! - `search.rs`: run one query and print the matches.
//! - `verify.rs`: run rule suites and report failed tests.
//!
//! ## Principles
//! - Parse/match CLI inputs here.
//! - Delegate parsing, matching and rendering to `services/*`.
//! - Keep behavior and output schema stable.

pub mod print;
pub mod search;
pub mod verify;

pub use print::handle_print;
pub use search::handle_search;
pub use verify::handle_verify;

//! CLI subcommand implementations.

pub mod canonicalize;
pub mod extract;
pub mod run;

//! CLI layer for the RAG orchestrator.
//!
//! Provides the command-line interface using clap, with commands for
//! ingesting manuals, running a generation, and inspecting configuration.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands, ConfigAction};

//! Command-line argument parsing for the ambient CLI surface (§2, §6).

use crate::config::OrchestratorConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// RAG Orchestrator: synthesizes inspection checksheets and work
/// instructions from ingested maintenance manuals via retrieval-augmented
/// generation.
#[derive(Parser, Debug)]
#[command(name = "rag-orchestrator")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the vector store database file.
    #[arg(short, long, env = "RAG_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json, ndjson).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Returns the database path, using the default if not specified.
    #[must_use]
    pub fn get_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(crate::vector_store::DEFAULT_DB_NAME))
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a manual's text into the vector store.
    Ingest {
        /// Path to the manual text file.
        file: PathBuf,

        /// Document id to register the ingested chunks under.
        #[arg(long)]
        document_id: String,

        /// Human-readable file name used in citations (defaults to the
        /// input file's name).
        #[arg(long)]
        file_name: Option<String>,

        /// Chunk size, in characters, for the naive fixed-size ingestion
        /// chunker.
        #[arg(long, default_value = "1000")]
        chunk_size: usize,
    },

    /// Generate a checksheet or set of work instructions from ingested
    /// documents.
    Generate {
        /// Which artifact to produce.
        #[arg(long, value_parser = ["checksheet", "work_instructions"])]
        use_case: String,

        /// Document ids to retrieve chunks from (comma-separated).
        #[arg(long, value_delimiter = ',')]
        document_ids: Vec<String>,

        /// Optional free-text query to bias retrieval toward.
        #[arg(long)]
        query: Option<String>,

        /// Chat-completions model name.
        #[arg(long, env = "RAG_LLM_MODEL", default_value = "gpt-4o-mini")]
        model: String,

        /// Generation tuning knobs; see `config show` for current defaults.
        #[command(flatten)]
        config: OrchestratorConfig,
    },

    /// Inspect effective configuration.
    Config {
        /// Configuration subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// `config` subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration (defaults overridden by environment
    /// variables).
    Show {
        /// Generation tuning knobs; see struct docs for environment variable
        /// names.
        #[command(flatten)]
        config: OrchestratorConfig,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_db_path() {
        let cli = Cli {
            db_path: None,
            verbose: false,
            format: "text".to_string(),
            command: Commands::Config {
                action: ConfigAction::Show {
                    config: OrchestratorConfig::default(),
                },
            },
        };
        assert_eq!(cli.get_db_path(), PathBuf::from(crate::vector_store::DEFAULT_DB_NAME));
    }

    #[test]
    fn test_custom_db_path() {
        let cli = Cli {
            db_path: Some(PathBuf::from("/custom/path.db")),
            verbose: false,
            format: "text".to_string(),
            command: Commands::Config {
                action: ConfigAction::Show {
                    config: OrchestratorConfig::default(),
                },
            },
        };
        assert_eq!(cli.get_db_path(), PathBuf::from("/custom/path.db"));
    }
}

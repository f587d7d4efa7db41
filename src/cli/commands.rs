//! Command dispatch: wires a parsed [`Cli`] to the orchestrator and vector
//! store, and renders the result via [`super::output`].

use super::output::{self, OutputFormat};
use super::parser::{Cli, Commands, ConfigAction};
use crate::core::chunk::find_char_boundary;
use crate::embedding::create_embedder;
use crate::error::Result;
use crate::llm::{OpenAiLlmClient, RateLimiter};
use crate::orchestrator::{CancellationToken, GenerationRequest, Orchestrator};
use crate::prompt::PromptLibrary;
use crate::vector_store::{SqliteVectorStore, VectorStore};
use std::sync::Arc;

/// Executes the parsed command line, returning the rendered output string.
///
/// # Errors
///
/// Returns an error if the underlying operation (ingestion, generation, or
/// store access) fails.
pub async fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    match &cli.command {
        Commands::Ingest {
            file,
            document_id,
            file_name,
            chunk_size,
        } => execute_ingest(cli, file, document_id, file_name.as_deref(), *chunk_size).await,
        Commands::Generate {
            use_case,
            document_ids,
            query,
            model,
            config,
        } => execute_generate(cli, use_case, document_ids, query.as_deref(), model, *config, format).await,
        Commands::Config { action } => {
            let ConfigAction::Show { config } = action;
            Ok(output::format_config(config, format))
        }
    }
}

async fn execute_ingest(
    cli: &Cli,
    file: &std::path::Path,
    document_id: &str,
    file_name: Option<&str>,
    chunk_size: usize,
) -> Result<String> {
    let text = std::fs::read_to_string(file)?;
    let embedder = create_embedder()?;
    let store = SqliteVectorStore::open(&cli.get_db_path(), Arc::from(embedder))?;

    let resolved_name = file_name.map_or_else(
        || {
            file.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| document_id.to_string())
        },
        str::to_string,
    );

    let chunks = naive_chunk(&text, chunk_size);
    let count = store.ingest_document(document_id, &resolved_name, chunks).await?;
    Ok(format!("Ingested {count} chunk(s) from '{resolved_name}' as document '{document_id}'."))
}

/// Splits `text` into fixed-size, UTF-8-safe pieces. No page attribution is
/// available for freshly ingested plain text, so every chunk carries `None`.
fn naive_chunk(text: &str, chunk_size: usize) -> Vec<(String, Option<u32>)> {
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let raw_end = (start + chunk_size).min(text.len());
        let mut end = find_char_boundary(text, raw_end);
        if end <= start {
            let next_char_len = text[start..].chars().next().map_or(1, char::len_utf8);
            end = start + next_char_len;
        }
        let piece = text[start..end].trim();
        if !piece.is_empty() {
            chunks.push((piece.to_string(), None));
        }
        start = end;
    }
    chunks
}

#[allow(clippy::too_many_arguments)]
async fn execute_generate(
    cli: &Cli,
    use_case: &str,
    document_ids: &[String],
    query: Option<&str>,
    model: &str,
    config: crate::config::OrchestratorConfig,
    format: OutputFormat,
) -> Result<String> {
    let embedder = create_embedder()?;
    let store: Arc<dyn VectorStore> = Arc::new(SqliteVectorStore::open(&cli.get_db_path(), Arc::from(embedder))?);

    let rate_limiter = Arc::new(RateLimiter::new(config.llm_rate_limit_rpm));
    let llm_client = Arc::new(OpenAiLlmClient::new(model.to_string(), rate_limiter));
    let prompt_library = Arc::new(PromptLibrary::new());

    let orchestrator = Orchestrator::new(store, llm_client, prompt_library, config);

    let request = GenerationRequest {
        use_case: use_case.to_string(),
        document_ids: document_ids.to_vec(),
        query_text: query.map(str::to_string),
    };

    let result = orchestrator.generate(request, None, &CancellationToken::new()).await?;
    Ok(output::format_generation_result(&result, format))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naive_chunk_splits_on_size() {
        let text = "a".repeat(25);
        let chunks = naive_chunk(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].0.len(), 10);
        assert_eq!(chunks[2].0.len(), 5);
    }

    #[test]
    fn test_naive_chunk_empty_text() {
        assert!(naive_chunk("", 10).is_empty());
    }

    #[test]
    fn test_naive_chunk_never_splits_utf8_boundary() {
        let text = "héllo wörld".repeat(20);
        let chunks = naive_chunk(&text, 7);
        for (chunk, _) in &chunks {
            assert!(std::str::from_utf8(chunk.as_bytes()).is_ok());
        }
    }

    #[test]
    fn test_naive_chunk_drops_blank_pieces() {
        let text = format!("{}   \n\n   {}", "x".repeat(5), "y".repeat(5));
        let chunks = naive_chunk(&text, 5);
        assert!(chunks.iter().all(|(c, _)| !c.trim().is_empty()));
    }
}

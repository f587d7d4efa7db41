//! The Orchestrator (§4.7): composes retrieval, partitioning, planning,
//! generation, and merging into one end-to-end request, driving the state
//! machine `QUEUED → RETRIEVING → PARTITIONING → GENERATING(i of N) →
//! MERGING → VALIDATING → DONE | FAILED`.

use crate::config::OrchestratorConfig;
use crate::core::artifact::{
    Artifact, Checksheet, GenerationMetadata, GenerationResult, WorkInstructions,
};
use crate::core::window::ContextWindow;
use crate::error::{Error, Result, VectorStoreError};
use crate::llm::{LlmClient, LlmRequest};
use crate::merger::{
    ensure_checksheet_not_empty, ensure_work_instructions_not_empty, finalize_work_instructions,
    merge_checksheet_piece, merge_work_instructions_piece,
};
use crate::partition::partition;
use crate::planner::{WorkInstructionsState, plan_checksheet, plan_work_instructions};
use crate::progress::{ProgressEvent, ProgressSink, piece_progress};
use crate::prompt::PromptLibrary;
use crate::vector_store::VectorStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, error, warn};

/// One generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Which artifact to produce: `"checksheet"` or `"work_instructions"`.
    pub use_case: String,
    /// Document ids to retrieve chunks from.
    pub document_ids: Vec<String>,
    /// Optional free-text query to bias retrieval toward.
    pub query_text: Option<String>,
}

/// Cooperative cancellation signal checked between pieces (§5).
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a token that starts un-cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; observed the next time the orchestrator
    /// checks between pieces.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Composes the pipeline components via dependency injection (§9): no
/// module-level singletons, every collaborator is passed in at construction.
pub struct Orchestrator {
    vector_store: Arc<dyn VectorStore>,
    llm_client: Arc<dyn LlmClient>,
    prompt_library: Arc<PromptLibrary>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Builds an orchestrator over the given collaborators and configuration.
    #[must_use]
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        llm_client: Arc<dyn LlmClient>,
        prompt_library: Arc<PromptLibrary>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            vector_store,
            llm_client,
            prompt_library,
            config,
        }
    }

    /// Runs one generation end-to-end.
    ///
    /// `progress` is optional and tolerated as absent. `cancel` is checked
    /// between pieces; a cancellation request aborts before the next
    /// sub-request is issued, but an in-flight LLM call is allowed to
    /// complete.
    ///
    /// # Errors
    ///
    /// See §7 for the full error taxonomy. The generation never partially
    /// returns: either the complete artifact is produced, or the whole call
    /// fails.
    pub async fn generate(
        &self,
        request: GenerationRequest,
        progress: Option<&dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult> {
        let deadline = Duration::from_secs(self.config.generation_timeout_secs);
        match timeout(deadline, self.generate_inner(request, progress, cancel)).await {
            Ok(result) => result,
            Err(_) => Err(Error::InvalidInput {
                message: "generation exceeded its overall deadline".to_string(),
            }),
        }
    }

    async fn generate_inner(
        &self,
        request: GenerationRequest,
        progress: Option<&dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult> {
        let started = Instant::now();

        if request.document_ids.is_empty() {
            return Err(Error::invalid_input("documentIds must not be empty"));
        }
        let use_case = request.use_case.as_str();
        if use_case != "checksheet" && use_case != "work_instructions" {
            return Err(Error::invalid_input(format!("unknown use case: {use_case}")));
        }

        debug!(use_case, ?request.document_ids, "state=RETRIEVING");
        let chunks = self
            .vector_store
            .query_by_document_ids(
                &request.document_ids,
                request.query_text.as_deref(),
                self.config.top_k,
            )
            .await?;
        if chunks.is_empty() {
            error!(use_case, "state=FAILED step=RETRIEVING");
            return Err(VectorStoreError::NoDocumentsIngested {
                document_ids: request.document_ids.clone(),
            }
            .into());
        }
        let chunks_used = chunks.len();

        debug!("state=PARTITIONING");
        let window = ContextWindow::build(chunks, self.config.max_context_chars);
        let context_length = window.len();
        let source_references = window.source_references();

        let template = self.prompt_library.get_prompt(use_case, None)?;
        let piece_count = self.config.piece_count(window.len());
        let pieces = partition(&window, piece_count)?;
        let total_pieces = pieces.len();

        let mut checksheet = Checksheet::default();
        let mut work_instructions = WorkInstructions::default();
        let mut metadata = GenerationMetadata {
            model: "configured-llm".to_string(),
            call_count: 0,
            total_prompt_tokens: 0,
            total_candidate_tokens: 0,
            total_tokens: 0,
        };

        debug!(total_pieces, "state=GENERATING");
        for (index, piece) in pieces.into_iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(index, total_pieces, "generation cancelled between pieces");
                return Err(Error::invalid_input("generation was cancelled"));
            }

            let planned = if use_case == "checksheet" {
                plan_checksheet(&template, &piece, &self.config)
            } else {
                let state = WorkInstructionsState {
                    title_set: !work_instructions.title.is_empty(),
                    has_prerequisites: !work_instructions.prerequisites.tools.is_empty()
                        || !work_instructions.prerequisites.materials.is_empty()
                        || !work_instructions.prerequisites.safety.is_empty(),
                    has_steps: !work_instructions.steps.is_empty(),
                    step_count: u32::try_from(work_instructions.steps.len()).unwrap_or(u32::MAX),
                };
                plan_work_instructions(&template, &piece, index, total_pieces, state, &self.config)
            }
            .map_err(|cause| wrap_piece_error(cause, index, total_pieces))?;

            let llm_request = LlmRequest {
                system_prompt: planned.system_prompt,
                user_prompt: planned.user_prompt,
                temperature: self.config.llm_temperature,
                max_output_tokens: self.config.max_output_tokens_per_piece,
            };

            let call_deadline = Duration::from_secs(self.config.llm_call_timeout_secs);
            let outcome = timeout(call_deadline, self.llm_client.generate_json(llm_request))
                .await
                .map_err(|_| {
                    Error::invalid_input(format!(
                        "LLM call timed out on chunk {} of {total_pieces}",
                        index + 1
                    ))
                })?
                .map_err(|cause| {
                    error!(index, total_pieces, %cause, "state=FAILED step=GENERATING");
                    wrap_piece_error(cause, index, total_pieces)
                })?;

            metadata.call_count += 1;
            metadata.total_prompt_tokens += outcome.usage.prompt_tokens;
            metadata.total_candidate_tokens += outcome.usage.completion_tokens;
            metadata.total_tokens += outcome.usage.total_tokens;

            if use_case == "checksheet" {
                merge_checksheet_piece(
                    &mut checksheet,
                    outcome.json,
                    &piece.source,
                    index,
                    &self.config,
                )
                .map_err(|cause| wrap_piece_error(cause, index, total_pieces))?;
            } else {
                merge_work_instructions_piece(
                    &mut work_instructions,
                    outcome.json,
                    &piece.source,
                    index,
                    &self.config,
                )
                .map_err(|cause| wrap_piece_error(cause, index, total_pieces))?;
            }

            if let Some(sink) = progress {
                let (low, high) = if use_case == "checksheet" { (10, 40) } else { (10, 60) };
                sink.on_progress(ProgressEvent {
                    step: format!("generating_{use_case}_chunk_{index}"),
                    progress: piece_progress(index, total_pieces, low, high),
                    message: format!("Processed chunk {} of {total_pieces}", index + 1),
                });
            }
        }

        debug!("state=MERGING");
        let data = if use_case == "checksheet" {
            debug!("state=VALIDATING");
            ensure_checksheet_not_empty(&checksheet, total_pieces)?;
            Artifact::Checksheet(checksheet)
        } else {
            finalize_work_instructions(&mut work_instructions);
            debug!("state=VALIDATING");
            ensure_work_instructions_not_empty(&work_instructions, total_pieces)?;
            Artifact::WorkInstructions(Box::new(work_instructions))
        };

        let (sources, citation_text) = render_citations(&source_references);

        debug!("state=DONE");
        Ok(GenerationResult {
            use_case: request.use_case,
            document_ids: request.document_ids,
            data,
            chunks_used,
            context_length,
            processing_time_seconds: started.elapsed().as_secs_f64(),
            sources,
            citation_text,
            generation_metadata: metadata,
        })
    }
}

fn wrap_piece_error(cause: Error, index: usize, total: usize) -> Error {
    cause.context_piece(index, total)
}

/// Renders the distinct `fileName`/sorted-pages pairs recorded in a context
/// window into a flat source list and numbered citation text (§4.7).
fn render_citations(source_references: &[(String, Option<u32>)]) -> (Vec<String>, String) {
    use std::collections::{BTreeMap, BTreeSet};

    let mut pages_by_file: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();
    for (file_name, page) in source_references {
        let entry = pages_by_file.entry(file_name.clone()).or_default();
        if let Some(page) = page {
            entry.insert(*page);
        }
    }

    let mut sources = Vec::with_capacity(pages_by_file.len());
    let mut citation_lines = Vec::with_capacity(pages_by_file.len());

    for (index, (file_name, pages)) in pages_by_file.into_iter().enumerate() {
        let rendered = if pages.is_empty() {
            file_name.clone()
        } else {
            format!("{file_name} ({})", render_page_list(&pages))
        };
        sources.push(rendered.clone());
        citation_lines.push(format!("{}. {rendered}", index + 1));
    }

    (sources, citation_lines.join("\n"))
}

fn render_page_list(pages: &std::collections::BTreeSet<u32>) -> String {
    let rendered: Vec<String> = pages.iter().take(3).map(u32::to_string).collect();
    if pages.len() > 3 {
        format!("Pages {}…", rendered.join(", "))
    } else {
        format!("Pages {}", rendered.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Chunk;
    use crate::llm::LlmOutcome;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Mutex as StdMutex;

    struct StubVectorStore {
        chunks: Vec<Chunk>,
    }

    #[async_trait]
    impl VectorStore for StubVectorStore {
        async fn query_by_document_ids(
            &self,
            _document_ids: &[String],
            _query_text: Option<&str>,
            _top_k: usize,
        ) -> Result<Vec<Chunk>> {
            Ok(self.chunks.clone())
        }

        async fn ingest_document(
            &self,
            _file_id: &str,
            _file_name: &str,
            chunks: Vec<(String, Option<u32>)>,
        ) -> Result<usize> {
            Ok(chunks.len())
        }
    }

    struct ScriptedLlmClient {
        responses: StdMutex<std::collections::VecDeque<Result<Value>>>,
        calls: StdMutex<usize>,
    }

    impl ScriptedLlmClient {
        /// A client that returns `value` for every call.
        fn always(value: Value) -> Self {
            let queue = std::iter::repeat_with(|| Ok(value.clone())).take(64).collect();
            Self {
                responses: StdMutex::new(queue),
                calls: StdMutex::new(0),
            }
        }

        /// A client that fails every call with `error_factory()`.
        fn always_failing(error_factory: impl Fn() -> Error) -> Self {
            let queue = std::iter::repeat_with(|| Err(error_factory())).take(64).collect();
            Self {
                responses: StdMutex::new(queue),
                calls: StdMutex::new(0),
            }
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlmClient {
        async fn generate_json(&self, _request: LlmRequest) -> Result<LlmOutcome> {
            *self.calls.lock().unwrap() += 1;
            let next = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(json!({})));
            next.map(|json| LlmOutcome {
                json,
                usage: Default::default(),
            })
        }
    }

    fn chunk(id: i64, text: &str, page: u32) -> Chunk {
        Chunk::new(id, "doc-A".to_string(), text.to_string(), id as usize)
            .with_file_name("A.pdf")
            .with_page_number(page)
    }

    #[tokio::test]
    async fn test_happy_path_checksheet_produces_fifteen_items() {
        let store = Arc::new(StubVectorStore {
            chunks: vec![
                chunk(1, &"x".repeat(400), 3),
                chunk(2, &"y".repeat(400), 4),
                chunk(3, &"z".repeat(400), 5),
            ],
        });
        let llm = Arc::new(ScriptedLlmClient::always(json!({
            "items": [{
                "itemName": "Oil",
                "inspectionPoint": "Level",
                "frequency": "Daily",
                "expectedStatus": "Full"
            }]
        })));
        let library = Arc::new(PromptLibrary::new());
        let orchestrator = Orchestrator::new(store, llm, library, OrchestratorConfig::default());

        let result = orchestrator
            .generate(
                GenerationRequest {
                    use_case: "checksheet".to_string(),
                    document_ids: vec!["doc-A".to_string()],
                    query_text: None,
                },
                None,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let Artifact::Checksheet(sheet) = result.data else {
            panic!("expected checksheet artifact");
        };
        assert_eq!(sheet.items.len(), 15);
        assert!(sheet.items.iter().all(|item| item.source_file == "A.pdf"));
        assert_eq!(result.citation_text, "1. A.pdf (Pages 3, 4, 5)");
    }

    #[tokio::test]
    async fn test_empty_retrieval_fails_with_no_documents_ingested() {
        let store = Arc::new(StubVectorStore { chunks: vec![] });
        let llm = Arc::new(ScriptedLlmClient::always(json!({})));
        let library = Arc::new(PromptLibrary::new());
        let orchestrator = Orchestrator::new(store, llm, library, OrchestratorConfig::default());

        let result = orchestrator
            .generate(
                GenerationRequest {
                    use_case: "checksheet".to_string(),
                    document_ids: vec!["doc-A".to_string()],
                    query_text: None,
                },
                None,
                &CancellationToken::new(),
            )
            .await;

        assert!(matches!(
            result.unwrap_err(),
            Error::VectorStore(VectorStoreError::NoDocumentsIngested { .. })
        ));
    }

    #[tokio::test]
    async fn test_truncation_fails_fast_with_exactly_one_call() {
        use crate::error::LlmError;

        let store = Arc::new(StubVectorStore {
            chunks: vec![chunk(1, &"x".repeat(400), 3)],
        });
        let llm = Arc::new(ScriptedLlmClient::always_failing(|| {
            LlmError::Truncated {
                max_output_tokens: 8000,
                consumed: 8000,
            }
            .into()
        }));
        let library = Arc::new(PromptLibrary::new());
        let orchestrator = Orchestrator::new(store, Arc::clone(&llm), library, OrchestratorConfig::default());

        let result = orchestrator
            .generate(
                GenerationRequest {
                    use_case: "checksheet".to_string(),
                    document_ids: vec!["doc-A".to_string()],
                    query_text: None,
                },
                None,
                &CancellationToken::new(),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(llm.call_count(), 1);
    }

    #[test]
    fn test_render_citations_single_file_three_pages() {
        let refs = vec![
            ("A.pdf".to_string(), Some(3)),
            ("A.pdf".to_string(), Some(4)),
            ("A.pdf".to_string(), Some(5)),
        ];
        let (sources, citation) = render_citations(&refs);
        assert_eq!(sources, vec!["A.pdf (Pages 3, 4, 5)".to_string()]);
        assert_eq!(citation, "1. A.pdf (Pages 3, 4, 5)");
    }

    #[test]
    fn test_render_citations_no_pages() {
        let refs = vec![("A.pdf".to_string(), None)];
        let (sources, citation) = render_citations(&refs);
        assert_eq!(sources, vec!["A.pdf".to_string()]);
        assert_eq!(citation, "1. A.pdf");
    }

    #[test]
    fn test_render_citations_truncates_past_three_pages() {
        let refs = vec![
            ("A.pdf".to_string(), Some(1)),
            ("A.pdf".to_string(), Some(2)),
            ("A.pdf".to_string(), Some(3)),
            ("A.pdf".to_string(), Some(4)),
        ];
        let (sources, _) = render_citations(&refs);
        assert_eq!(sources, vec!["A.pdf (Pages 1, 2, 3…)".to_string()]);
    }

    #[test]
    fn test_cancellation_token_round_trip() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }
}

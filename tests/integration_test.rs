//! End-to-end integration tests for the RAG orchestrator: ingest into a
//! real `SQLite` vector store, then run a full generation against a scripted
//! LLM client.

use async_trait::async_trait;
use rag_orchestrator::config::OrchestratorConfig;
use rag_orchestrator::core::Artifact;
use rag_orchestrator::embedding::FallbackEmbedder;
use rag_orchestrator::error::Result;
use rag_orchestrator::llm::{LlmClient, LlmOutcome, LlmRequest, TokenUsage};
use rag_orchestrator::orchestrator::{CancellationToken, GenerationRequest, Orchestrator};
use rag_orchestrator::prompt::PromptLibrary;
use rag_orchestrator::vector_store::{SqliteVectorStore, VectorStore};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

struct FixedJsonClient {
    value: serde_json::Value,
    calls: AtomicUsize,
}

impl FixedJsonClient {
    fn new(value: serde_json::Value) -> Self {
        Self {
            value,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LlmClient for FixedJsonClient {
    async fn generate_json(&self, _request: LlmRequest) -> Result<LlmOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(LlmOutcome {
            json: self.value.clone(),
            usage: TokenUsage {
                prompt_tokens: 50,
                completion_tokens: 20,
                total_tokens: 70,
            },
        })
    }
}

fn open_test_store(dir: &TempDir) -> SqliteVectorStore {
    let embedder = Arc::new(FallbackEmbedder::new(rag_orchestrator::embedding::DEFAULT_DIMENSIONS));
    SqliteVectorStore::open(&dir.path().join("test.db"), embedder).expect("open store")
}

#[tokio::test]
async fn test_ingest_then_generate_checksheet() {
    let dir = TempDir::new().expect("temp dir");
    let store = open_test_store(&dir);

    let chunks = vec![
        ("Check the oil level daily and top off as needed.".to_string(), Some(3)),
        ("Inspect belt tension weekly for signs of wear.".to_string(), Some(4)),
    ];
    let inserted = store
        .ingest_document("doc-A", "Maintenance Manual.pdf", chunks)
        .await
        .expect("ingest");
    assert_eq!(inserted, 2);

    let store: Arc<dyn VectorStore> = Arc::new(store);
    let llm_client = Arc::new(FixedJsonClient::new(json!({
        "items": [{
            "itemName": "Oil Level",
            "inspectionPoint": "Dipstick reading",
            "frequency": "Daily",
            "expectedStatus": "Full",
        }]
    })));
    let prompt_library = Arc::new(PromptLibrary::new());
    let config = OrchestratorConfig {
        min_pieces: 1,
        ..OrchestratorConfig::default()
    };

    let orchestrator = Orchestrator::new(store, llm_client.clone(), prompt_library, config);
    let request = GenerationRequest {
        use_case: "checksheet".to_string(),
        document_ids: vec!["doc-A".to_string()],
        query_text: None,
    };

    let result = orchestrator
        .generate(request, None, &CancellationToken::new())
        .await
        .expect("generation should succeed");

    match result.data {
        Artifact::Checksheet(sheet) => assert!(!sheet.items.is_empty()),
        Artifact::WorkInstructions(_) => panic!("expected a checksheet artifact"),
    }
    assert!(!result.citation_text.is_empty());
    assert!(result.generation_metadata.call_count >= 1);
}

#[tokio::test]
async fn test_generate_fails_without_ingested_documents() {
    let dir = TempDir::new().expect("temp dir");
    let store: Arc<dyn VectorStore> = Arc::new(open_test_store(&dir));
    let llm_client = Arc::new(FixedJsonClient::new(json!({"items": []})));
    let prompt_library = Arc::new(PromptLibrary::new());

    let orchestrator = Orchestrator::new(store, llm_client, prompt_library, OrchestratorConfig::default());
    let request = GenerationRequest {
        use_case: "checksheet".to_string(),
        document_ids: vec!["doc-missing".to_string()],
        query_text: None,
    };

    let result = orchestrator.generate(request, None, &CancellationToken::new()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_generate_rejects_unknown_use_case() {
    let dir = TempDir::new().expect("temp dir");
    let store = open_test_store(&dir);
    store
        .ingest_document("doc-A", "Manual.pdf", vec![("Some text.".to_string(), None)])
        .await
        .expect("ingest");
    let store: Arc<dyn VectorStore> = Arc::new(store);
    let llm_client = Arc::new(FixedJsonClient::new(json!({"items": []})));
    let prompt_library = Arc::new(PromptLibrary::new());

    let orchestrator = Orchestrator::new(store, llm_client, prompt_library, OrchestratorConfig::default());
    let request = GenerationRequest {
        use_case: "unknown_case".to_string(),
        document_ids: vec!["doc-A".to_string()],
        query_text: None,
    };

    let result = orchestrator.generate(request, None, &CancellationToken::new()).await;
    assert!(result.is_err());
}

//! The structured artifacts a generation produces, and the envelope that
//! wraps one for the caller.

use serde::{Deserialize, Serialize};

/// Inspection frequency, shared by checksheet items and work-instructions
/// metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Frequency {
    /// Performed daily.
    Daily,
    /// Performed weekly.
    Weekly,
    /// Performed monthly.
    Monthly,
    /// Performed quarterly.
    Quarterly,
    /// Performed annually.
    Annual,
}

/// One checklist row in a [`Checksheet`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Short item name (≤3 words per the per-piece constraint block).
    pub item_name: String,
    /// What to inspect or measure.
    pub inspection_point: String,
    /// How often this item is inspected.
    pub frequency: Frequency,
    /// The expected/passing status or reading.
    pub expected_status: String,
    /// Free-form notes (≤5 words per the per-piece constraint block).
    pub notes: Option<String>,
    /// Human-readable file name this item was sourced from.
    pub source_file: String,
    /// User-facing page number, if known.
    pub source_page: Option<u32>,
}

/// An ordered inspection checksheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Checksheet {
    /// Checklist rows, in piece order then original order within a piece.
    pub items: Vec<Item>,
}

impl Checksheet {
    /// Whether the checksheet has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A single numbered step in a [`WorkInstructions`] artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Position in the merged, contiguous `1..M` step sequence.
    pub step_number: u32,
    /// Optional short step title.
    pub title: Option<String>,
    /// The instruction text.
    pub description: String,
    /// Optional elaboration (measurements, torque values, etc).
    pub details: Option<String>,
    /// Optional inline warning specific to this step.
    pub warning: Option<String>,
    /// Human-readable file name this step was sourced from.
    pub source_file: String,
    /// User-facing page number, if known.
    pub source_page: Option<u32>,
}

/// A single safety warning or completion-checklist entry; both share this
/// shape (text plus attribution) per the Merger's normalization rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributedEntry {
    /// The entry's text.
    pub text: String,
    /// Human-readable file name this entry was sourced from.
    pub source_file: String,
    /// User-facing page number, if known.
    pub source_page: Option<u32>,
}

/// Tools/materials/safety-precaution lists gathered before the numbered
/// steps begin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Prerequisites {
    /// Required tools, de-duplicated, first-seen order preserved.
    pub tools: Vec<String>,
    /// Required materials/parts, de-duplicated, first-seen order preserved.
    pub materials: Vec<String>,
    /// Safety precautions to take before starting, de-duplicated.
    pub safety: Vec<String>,
}

/// A complete set of step-by-step work instructions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkInstructions {
    /// Task title. Repaired to `"Work Instructions"` if still unset after
    /// merging when other fields have content.
    pub title: String,
    /// Short task overview.
    pub overview: String,
    /// How often this task is performed, if stated.
    pub frequency: Option<Frequency>,
    /// Estimated time to complete, if stated.
    pub estimated_duration: Option<String>,
    /// Tools, materials, and safety precautions gathered up front.
    pub prerequisites: Prerequisites,
    /// The numbered steps, contiguous starting at 1.
    pub steps: Vec<Step>,
    /// Safety warnings called out across the procedure.
    pub safety_warnings: Vec<AttributedEntry>,
    /// Items to verify once the procedure is complete.
    pub completion_checklist: Vec<AttributedEntry>,
    /// Free-form closing notes.
    pub notes: Option<String>,
}

impl WorkInstructions {
    /// Whether every field is absent/empty, per the emptiness rule in
    /// the Merger contract.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.overview.is_empty()
            && self.prerequisites.tools.is_empty()
            && self.prerequisites.materials.is_empty()
            && self.prerequisites.safety.is_empty()
            && self.steps.is_empty()
            && self.safety_warnings.is_empty()
            && self.completion_checklist.is_empty()
    }
}

/// The structured output of a generation: either a checksheet or a set of
/// work instructions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    /// An inspection checksheet.
    Checksheet(Checksheet),
    /// Step-by-step work instructions.
    WorkInstructions(Box<WorkInstructions>),
}

impl Artifact {
    /// Whether the artifact has no produced content, per §4.5's emptiness
    /// rule (distinct per variant).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Checksheet(c) => c.is_empty(),
            Self::WorkInstructions(w) => w.is_empty(),
        }
    }
}

/// Reproducibility metadata for a completed generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Name of the LLM model used.
    pub model: String,
    /// Number of LLM sub-requests issued.
    pub call_count: usize,
    /// Summed prompt-token usage across every sub-request.
    pub total_prompt_tokens: u32,
    /// Summed candidate-token usage across every sub-request.
    pub total_candidate_tokens: u32,
    /// Summed total-token usage across every sub-request.
    pub total_tokens: u32,
}

/// The envelope returned by the orchestrator for a completed generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    /// The use case that was requested (e.g. `"checksheet"`).
    pub use_case: String,
    /// Document ids the caller asked to retrieve from.
    pub document_ids: Vec<String>,
    /// The produced artifact.
    pub data: Artifact,
    /// Number of chunks retrieved and included in the context window.
    pub chunks_used: usize,
    /// Length, in characters, of the assembled context window.
    pub context_length: usize,
    /// Wall-clock time the generation took, in seconds.
    pub processing_time_seconds: f64,
    /// Rendered `"<fileName> (Pages p1, p2, ...)"` strings, one per source
    /// file, deduplicated.
    pub sources: Vec<String>,
    /// Numbered rendering of `sources` suitable for direct display.
    pub citation_text: String,
    /// Reproducibility metadata.
    pub generation_metadata: GenerationMetadata,
}

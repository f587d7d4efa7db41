//! Artifact merging: folds per-piece LLM output into the running artifact,
//! then finalizes it (§4.5).

pub mod merger;
pub mod raw;

pub use merger::{
    ensure_checksheet_not_empty, ensure_work_instructions_not_empty, finalize_work_instructions,
    merge_checksheet_piece, merge_work_instructions_piece,
};
pub use raw::RawPieceOutput;

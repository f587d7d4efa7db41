//! Prompt resolution and structured rendering (§4.4, §6, §9).

pub mod builder;
pub mod defaults;
pub mod library;

pub use builder::{ConstraintBlock, PromptSections, render_piece_prompt};
pub use defaults::PromptTemplate;
pub use library::PromptLibrary;

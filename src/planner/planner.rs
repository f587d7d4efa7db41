//! Sub-request planner (§4.4): decides which sections and constraints each
//! piece's LLM call should ask for, based on the piece's position and the
//! artifact state accumulated by prior pieces.

use crate::config::OrchestratorConfig;
use crate::core::piece::ContextPiece;
use crate::error::Result;
use crate::prompt::{ConstraintBlock, PromptSections, PromptTemplate, render_piece_prompt};

/// Accumulated state the planner consults to decide a work-instructions
/// piece's role. The merger owns the authoritative artifact; this is a thin
/// read-only view into the fields planning depends on.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkInstructionsState {
    /// Whether a title has been set by a prior piece.
    pub title_set: bool,
    /// Whether any prerequisites have been recorded.
    pub has_prerequisites: bool,
    /// Whether any steps have been recorded yet.
    pub has_steps: bool,
    /// Number of steps recorded so far (for numbering continuation).
    pub step_count: u32,
}

/// A fully-rendered sub-request ready to send to the LLM adapter.
#[derive(Debug, Clone)]
pub struct PlannedRequest {
    /// System prompt, unchanged across pieces.
    pub system_prompt: String,
    /// Rendered user prompt for this specific piece.
    pub user_prompt: String,
}

/// Plans the checksheet sub-request for `piece`: every piece is symmetric,
/// capped at `config.max_items_per_piece` items.
///
/// # Errors
///
/// Propagates a [`PromptError::MissingContextPlaceholder`](crate::error::PromptError::MissingContextPlaceholder)
/// if `template` lacks the mandatory `{context}` placeholder.
pub fn plan_checksheet(
    template: &PromptTemplate,
    piece: &ContextPiece,
    config: &OrchestratorConfig,
) -> Result<PlannedRequest> {
    let constraints = ConstraintBlock {
        max_items: Some(config.max_items_per_piece),
        item_name_max_words: Some(3),
        notes_max_words: Some(5),
        ..Default::default()
    };
    let user_prompt = render_piece_prompt(
        &template.user_template,
        "checksheet",
        &piece.text,
        PromptSections::none(),
        &constraints,
    )?;

    Ok(PlannedRequest {
        system_prompt: template.system.clone(),
        user_prompt,
    })
}

/// Plans the work-instructions sub-request for piece `index` of `total`,
/// per the role table in §4.4.
///
/// # Errors
///
/// Propagates a [`PromptError::MissingContextPlaceholder`](crate::error::PromptError::MissingContextPlaceholder)
/// if `template` lacks the mandatory `{context}` placeholder.
pub fn plan_work_instructions(
    template: &PromptTemplate,
    piece: &ContextPiece,
    index: usize,
    total: usize,
    state: WorkInstructionsState,
    config: &OrchestratorConfig,
) -> Result<PlannedRequest> {
    let is_first = index == 0;
    let is_last = index + 1 == total;

    let (sections, constraints) = if is_first && !state.title_set {
        (
            PromptSections::none().with_title().with_overview(),
            ConstraintBlock::default(),
        )
    } else if (index == 1 || (is_first && state.title_set)) && !state.has_prerequisites {
        (
            PromptSections::none().with_prerequisites(),
            ConstraintBlock::default(),
        )
    } else if is_last && !state.has_steps {
        (
            PromptSections::none().with_steps(),
            ConstraintBlock {
                max_steps: Some(config.max_steps_per_piece),
                starting_step_number: Some(state.step_count + 1),
                ..Default::default()
            },
        )
    } else if is_last {
        (
            PromptSections::none().with_safety().with_checklist(),
            ConstraintBlock::default(),
        )
    } else {
        (
            PromptSections::none().with_steps(),
            ConstraintBlock {
                max_steps: Some(config.max_steps_per_piece),
                starting_step_number: Some(state.step_count + 1),
                ..Default::default()
            },
        )
    };

    let user_prompt = render_piece_prompt(
        &template.user_template,
        "work_instructions",
        &piece.text,
        sections,
        &constraints,
    )?;

    Ok(PlannedRequest {
        system_prompt: template.system.clone(),
        user_prompt,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::piece::Source;
    use crate::prompt::defaults::{default_checksheet, default_work_instructions};

    fn piece(text: &str) -> ContextPiece {
        ContextPiece {
            text: text.to_string(),
            start_char: 0,
            end_char: text.len(),
            source: Source::unknown(),
        }
    }

    #[test]
    fn test_checksheet_caps_items_per_piece() {
        let config = OrchestratorConfig::default();
        let request = plan_checksheet(&default_checksheet(), &piece("excerpt"), &config).unwrap();
        assert!(request.user_prompt.contains("at most 8 item(s)"));
    }

    #[test]
    fn test_work_instructions_first_piece_requests_title() {
        let config = OrchestratorConfig::default();
        let request = plan_work_instructions(
            &default_work_instructions(),
            &piece("excerpt"),
            0,
            15,
            WorkInstructionsState::default(),
            &config,
        )
        .unwrap();
        assert!(request.user_prompt.contains("- title"));
        assert!(request.user_prompt.contains("- overview"));
    }

    #[test]
    fn test_work_instructions_second_piece_requests_prerequisites() {
        let config = OrchestratorConfig::default();
        let state = WorkInstructionsState {
            title_set: true,
            ..Default::default()
        };
        let request = plan_work_instructions(
            &default_work_instructions(),
            &piece("excerpt"),
            1,
            15,
            state,
            &config,
        )
        .unwrap();
        assert!(request.user_prompt.contains("prerequisites"));
    }

    #[test]
    fn test_work_instructions_middle_piece_requests_steps_with_continuation() {
        let config = OrchestratorConfig::default();
        let state = WorkInstructionsState {
            title_set: true,
            has_prerequisites: true,
            has_steps: true,
            step_count: 4,
        };
        let request = plan_work_instructions(
            &default_work_instructions(),
            &piece("excerpt"),
            5,
            15,
            state,
            &config,
        )
        .unwrap();
        assert!(request.user_prompt.contains("numbered steps"));
        assert!(request.user_prompt.contains("starting at 5"));
    }

    #[test]
    fn test_work_instructions_last_piece_without_steps_requests_steps() {
        let config = OrchestratorConfig::default();
        let state = WorkInstructionsState {
            title_set: true,
            has_prerequisites: true,
            ..Default::default()
        };
        let request = plan_work_instructions(
            &default_work_instructions(),
            &piece("excerpt"),
            14,
            15,
            state,
            &config,
        )
        .unwrap();
        assert!(request.user_prompt.contains("numbered steps"));
    }

    #[test]
    fn test_work_instructions_last_piece_with_steps_requests_safety_and_checklist() {
        let config = OrchestratorConfig::default();
        let state = WorkInstructionsState {
            title_set: true,
            has_prerequisites: true,
            has_steps: true,
            step_count: 24,
        };
        let request = plan_work_instructions(
            &default_work_instructions(),
            &piece("excerpt"),
            14,
            15,
            state,
            &config,
        )
        .unwrap();
        assert!(request.user_prompt.contains("safety warnings"));
        assert!(request.user_prompt.contains("completion checklist"));
    }
}

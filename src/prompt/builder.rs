//! Structured prompt builder (§4.4, §9).
//!
//! Replaces the teacher's substring-mutation approach to toggling prompt
//! content ("Include:" → "Include ONLY:") with named, independently
//! toggleable sections rendered into an explicit "Include ONLY the
//! following" list plus a constraint block, so the planner never edits
//! rendered text in place.

use crate::error::{PromptError, Result};

/// Which named sections a sub-request should ask the model to produce.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptSections {
    /// Task title.
    pub title: bool,
    /// Short overview.
    pub overview: bool,
    /// Tools/materials/safety precaution lists.
    pub prerequisites: bool,
    /// Numbered procedure steps.
    pub steps: bool,
    /// Safety warnings.
    pub safety: bool,
    /// Completion checklist.
    pub checklist: bool,
}

impl PromptSections {
    /// All sections disabled.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            title: false,
            overview: false,
            prerequisites: false,
            steps: false,
            safety: false,
            checklist: false,
        }
    }

    #[must_use]
    pub const fn with_title(mut self) -> Self {
        self.title = true;
        self
    }

    #[must_use]
    pub const fn with_overview(mut self) -> Self {
        self.overview = true;
        self
    }

    #[must_use]
    pub const fn with_prerequisites(mut self) -> Self {
        self.prerequisites = true;
        self
    }

    #[must_use]
    pub const fn with_steps(mut self) -> Self {
        self.steps = true;
        self
    }

    #[must_use]
    pub const fn with_safety(mut self) -> Self {
        self.safety = true;
        self
    }

    #[must_use]
    pub const fn with_checklist(mut self) -> Self {
        self.checklist = true;
        self
    }

    fn names(self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.title {
            names.push("title");
        }
        if self.overview {
            names.push("overview");
        }
        if self.prerequisites {
            names.push("prerequisites (tools, materials, safety precautions)");
        }
        if self.steps {
            names.push("numbered steps");
        }
        if self.safety {
            names.push("safety warnings");
        }
        if self.checklist {
            names.push("completion checklist");
        }
        names
    }
}

/// Per-call limits rendered into the constraint block appended to every
/// sub-request's user prompt.
#[derive(Debug, Clone, Default)]
pub struct ConstraintBlock {
    /// Maximum checksheet items this call may return.
    pub max_items: Option<u32>,
    /// Maximum steps this call may return.
    pub max_steps: Option<u32>,
    /// First step number this call's steps should start counting from.
    pub starting_step_number: Option<u32>,
    /// Word cap on short name-like fields (`itemName`).
    pub item_name_max_words: Option<u32>,
    /// Word cap on free-form notes fields.
    pub notes_max_words: Option<u32>,
}

impl ConstraintBlock {
    fn render(&self) -> String {
        let mut lines = Vec::new();
        if let Some(n) = self.max_items {
            lines.push(format!("- Return at most {n} item(s)."));
        }
        if let Some(n) = self.max_steps {
            let start = self.starting_step_number.unwrap_or(1);
            lines.push(format!(
                "- Return at most {n} step(s), numbered starting at {start}."
            ));
        }
        if let Some(n) = self.item_name_max_words {
            lines.push(format!("- Keep each item name to at most {n} words."));
        }
        if let Some(n) = self.notes_max_words {
            lines.push(format!("- Keep notes to at most {n} words."));
        }
        lines.join("\n")
    }
}

/// Renders a user prompt by substituting `{context}` in `template`, then
/// appending an "Include ONLY" list of enabled sections and the constraint
/// block, in that order.
///
/// # Errors
///
/// Returns [`PromptError::MissingContextPlaceholder`] if `template` has no
/// `{context}` placeholder to substitute into.
pub fn render_piece_prompt(
    template: &str,
    use_case: &str,
    context: &str,
    sections: PromptSections,
    constraints: &ConstraintBlock,
) -> Result<String> {
    if !template.contains("{context}") {
        return Err(PromptError::MissingContextPlaceholder {
            use_case: use_case.to_string(),
        }
        .into());
    }

    let mut rendered = template.replace("{context}", context);

    let names = sections.names();
    if !names.is_empty() {
        rendered.push_str("\n\nInclude ONLY the following information:\n");
        for name in names {
            rendered.push_str("- ");
            rendered.push_str(name);
            rendered.push('\n');
        }
    }

    let constraint_text = constraints.render();
    if !constraint_text.is_empty() {
        rendered.push_str("\nConstraints:\n");
        rendered.push_str(&constraint_text);
    }

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_context() {
        let result = render_piece_prompt(
            "Excerpt: {context}",
            "work_instructions",
            "replace the filter",
            PromptSections::none(),
            &ConstraintBlock::default(),
        )
        .unwrap();
        assert!(result.starts_with("Excerpt: replace the filter"));
    }

    #[test]
    fn test_render_lists_enabled_sections_only() {
        let sections = PromptSections::none().with_title().with_overview();
        let result = render_piece_prompt(
            "{context}",
            "work_instructions",
            "text",
            sections,
            &ConstraintBlock::default(),
        )
        .unwrap();
        assert!(result.contains("- title"));
        assert!(result.contains("- overview"));
        assert!(!result.contains("numbered steps"));
    }

    #[test]
    fn test_render_includes_constraint_block() {
        let constraints = ConstraintBlock {
            max_steps: Some(2),
            starting_step_number: Some(5),
            ..Default::default()
        };
        let result = render_piece_prompt(
            "{context}",
            "work_instructions",
            "text",
            PromptSections::none().with_steps(),
            &constraints,
        )
        .unwrap();
        assert!(result.contains("at most 2 step(s), numbered starting at 5"));
    }

    #[test]
    fn test_render_missing_placeholder_errors() {
        let result = render_piece_prompt(
            "no placeholder here",
            "checksheet",
            "text",
            PromptSections::none(),
            &ConstraintBlock::default(),
        );
        assert!(result.is_err());
    }
}

//! Built-in prompt templates, used when the library has no registered
//! override for a use case (§6).

/// A resolved prompt pair: the system instruction and a user template
/// containing the literal `{context}` placeholder.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// Stable identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// System prompt, fixed across pieces.
    pub system: String,
    /// User prompt template; must contain `{context}`.
    pub user_template: String,
}

/// The built-in default for `"checksheet"`.
#[must_use]
pub fn default_checksheet() -> PromptTemplate {
    PromptTemplate {
        id: "checksheet.default".to_string(),
        name: "Default Inspection Checksheet".to_string(),
        system: "You are a maintenance engineer producing an inspection checksheet \
                 from equipment manual excerpts. Respond with JSON only, matching \
                 the requested shape exactly."
            .to_string(),
        user_template: "Manual excerpt:\n{context}\n\n\
                         Extract inspection checklist items from this excerpt."
            .to_string(),
    }
}

/// The built-in default for `"work_instructions"`.
#[must_use]
pub fn default_work_instructions() -> PromptTemplate {
    PromptTemplate {
        id: "work_instructions.default".to_string(),
        name: "Default Work Instructions".to_string(),
        system: "You are a maintenance engineer producing step-by-step work \
                 instructions from equipment manual excerpts. Respond with JSON \
                 only, matching the requested shape exactly."
            .to_string(),
        user_template: "Manual excerpt:\n{context}\n\n\
                         Extract the task information described in this excerpt."
            .to_string(),
    }
}

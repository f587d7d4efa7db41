//! Prompt library: resolves `(useCase, promptId?)` to a [`PromptTemplate`],
//! falling back to the built-in default when nothing is registered (§6).

use crate::error::{PromptError, Result};
use crate::prompt::defaults::{PromptTemplate, default_checksheet, default_work_instructions};
use std::collections::HashMap;
use std::sync::RwLock;

/// Read-mostly cache of registered prompt overrides, guarded by a single
/// writer / multiple reader lock per the shared-resource model (§5).
pub struct PromptLibrary {
    overrides: RwLock<HashMap<String, PromptTemplate>>,
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptLibrary {
    /// Creates a library with no registered overrides; every lookup resolves
    /// to a built-in default.
    #[must_use]
    pub fn new() -> Self {
        Self {
            overrides: RwLock::new(HashMap::new()),
        }
    }

    /// Registers or replaces the override for `use_case`.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::LockPoisoned`] if a previous holder of the
    /// override map's lock panicked while holding it.
    pub fn register(&self, use_case: impl Into<String>, template: PromptTemplate) -> Result<()> {
        self.overrides
            .write()
            .map_err(|e| PromptError::LockPoisoned(e.to_string()))?
            .insert(use_case.into(), template);
        Ok(())
    }

    /// Resolves the prompt pair for `use_case`.
    ///
    /// `prompt_id` is accepted for interface parity with the contract in §6
    /// but is not currently used to disambiguate between multiple
    /// registrations for the same use case; the most recently registered
    /// override wins.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::UnknownUseCase`] if `use_case` has no override
    /// and no built-in default exists (only `"checksheet"` and
    /// `"work_instructions"` have built-ins).
    pub fn get_prompt(&self, use_case: &str, _prompt_id: Option<&str>) -> Result<PromptTemplate> {
        if let Some(template) = self
            .overrides
            .read()
            .map_err(|e| PromptError::LockPoisoned(e.to_string()))?
            .get(use_case)
        {
            return Ok(template.clone());
        }

        let template = match use_case {
            "checksheet" => default_checksheet(),
            "work_instructions" => default_work_instructions(),
            other => {
                return Err(PromptError::UnknownUseCase {
                    use_case: other.to_string(),
                }
                .into());
            }
        };

        if !template.user_template.contains("{context}") {
            return Err(PromptError::MissingContextPlaceholder {
                use_case: use_case.to_string(),
            }
            .into());
        }

        Ok(template)
    }
}

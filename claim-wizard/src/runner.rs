//! WizardRunner – loads a session, submits its current step, and saves it back.
//!
//! One call per form submission. Use [`Wizard::submit`] directly when the
//! session is already in hand.

use std::sync::Arc;

use crate::{
    error::{Result, WizardError},
    storage::SessionStorage,
    wizard::{ExecutionResult, Wizard},
};

/// Orchestrates the _load → submit → save_ pattern
#[derive(Clone)]
pub struct WizardRunner {
    wizard: Arc<Wizard>,
    storage: Arc<dyn SessionStorage>,
}

impl WizardRunner {
    pub fn new(wizard: Arc<Wizard>, storage: Arc<dyn SessionStorage>) -> Self {
        Self { wizard, storage }
    }

    pub fn wizard(&self) -> &Arc<Wizard> {
        &self.wizard
    }

    /// Submit exactly one step for `session_id` and persist the updated session
    pub async fn run(&self, session_id: &str) -> Result<ExecutionResult> {
        let mut session = self
            .storage
            .get(session_id)
            .await?
            .ok_or_else(|| WizardError::SessionNotFound(session_id.to_string()))?;

        let result = self.wizard.submit(&mut session).await?;

        self.storage.save(session).await?;

        Ok(result)
    }
}

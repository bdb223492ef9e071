use async_trait::async_trait;

use crate::{
    context::Context,
    error::Result,
    step::{NextAction, Step, StepHandler, StepResult},
};

/// Confirmation page; there is nothing to submit
pub struct ClaimCompletedStep;

#[async_trait]
impl StepHandler for ClaimCompletedStep {
    fn step(&self) -> Step {
        Step::ClaimCompleted
    }

    async fn submit(&self, _context: Context) -> Result<StepResult> {
        Ok(StepResult::new(NextAction::End))
    }
}

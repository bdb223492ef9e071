//! One [`StepHandler`] per wizard page.
//!
//! Handlers share the same submission protocol: validate the slice, make sure
//! a claim exists, send the sub-resource update, then report a [`NextAction`]
//! for the wizard to apply. None of them touch navigation directly.

mod additional_information;
mod completed;
mod contact_information;
mod disruption_reason;
mod search;

use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    api::{ApiError, ClaimApi},
    context::Context,
    forms::FieldErrors,
    i18n::Locale,
    state,
    step::{NextAction, Step, StepHandler, StepResult},
    violations::{ResolvedErrors, resolve_error},
};

pub use additional_information::AdditionalInformationStep;
pub use completed::ClaimCompletedStep;
pub use contact_information::ContactInformationStep;
pub use disruption_reason::DisruptionReasonStep;
pub use search::SearchStep;

/// Handlers for every step, backed by `api`
pub fn default_handlers(api: Arc<dyn ClaimApi>) -> Vec<Arc<dyn StepHandler>> {
    vec![
        Arc::new(SearchStep::new(api.clone())),
        Arc::new(DisruptionReasonStep::new(api.clone())),
        Arc::new(AdditionalInformationStep::new(api.clone())),
        Arc::new(ContactInformationStep::new(api)),
        Arc::new(ClaimCompletedStep),
    ]
}

fn invalid(step: Step, errors: FieldErrors) -> StepResult {
    info!(%step, fields = errors.len(), "Form validation failed");
    StepResult::with_errors(ResolvedErrors::from_form_errors(errors))
}

fn rejected(step: Step, error: &ApiError, fields: &[&str], locale: Locale) -> StepResult {
    warn!(%step, error = %error, "Step submission rejected");
    StepResult::with_errors(resolve_error(error, fields, locale))
}

/// Claim id for steps that update an existing claim, or the redirect result when there is none
async fn require_claim_id(step: Step, context: &Context) -> std::result::Result<String, StepResult> {
    match state::claim_id(context).await {
        Some(claim_id) => Ok(claim_id),
        None => {
            warn!(%step, "No claim id, redirecting to search");
            Err(StepResult::new(NextAction::RedirectToSearch))
        }
    }
}

fn advanced(step: Step, claim_id: &str) -> StepResult {
    info!(%step, %claim_id, "Step submitted");
    StepResult::new_with_status(
        NextAction::Continue,
        Some(format!("{step} saved for claim {claim_id}")),
    )
}

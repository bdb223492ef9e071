use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    api::{ClaimApi, DisruptionPayload},
    context::Context,
    error::Result,
    forms::{fields, validate_disruption_reason},
    reasons::{AIRLINE_DISRUPTION_REASONS, USER_DISRUPTION_REASONS, option_text},
    state::{self, DisruptionReasonState},
    step::{Step, StepHandler, StepResult},
};

use super::{advanced, invalid, rejected, require_claim_id};

/// What went wrong and what the airline blamed it on
pub struct DisruptionReasonStep {
    api: Arc<dyn ClaimApi>,
}

impl DisruptionReasonStep {
    pub fn new(api: Arc<dyn ClaimApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl StepHandler for DisruptionReasonStep {
    fn step(&self) -> Step {
        Step::DisruptionReason
    }

    async fn submit(&self, context: Context) -> Result<StepResult> {
        let locale = state::locale(&context).await;
        let form: DisruptionReasonState = state::slice(&context).await;

        let errors = validate_disruption_reason(&form, locale);
        if !errors.is_empty() {
            return Ok(invalid(self.step(), errors));
        }
        let claim_id = match require_claim_id(self.step(), &context).await {
            Ok(claim_id) => claim_id,
            Err(redirect) => return Ok(redirect),
        };

        // the backend stores display text, not option ids
        let payload = DisruptionPayload {
            user_reason: option_text(
                USER_DISRUPTION_REASONS,
                form.user_reason.as_deref().unwrap_or_default(),
                locale,
            ),
            airline_reason: option_text(
                AIRLINE_DISRUPTION_REASONS,
                form.airline_reason.as_deref().unwrap_or_default(),
                locale,
            ),
            details: form.details.clone(),
        };

        match self.api.update_disruption(&claim_id, payload).await {
            Ok(()) => {
                state::set_slice(&context, &form).await?;
                Ok(advanced(self.step(), &claim_id))
            }
            Err(e) => Ok(rejected(self.step(), &e, fields::DISRUPTION_REASON, locale)),
        }
    }
}

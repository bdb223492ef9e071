use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    api::{ClaimApi, FlightDetailsPayload},
    context::Context,
    error::Result,
    forms::{fields, validate_additional_information},
    reasons::{DELAYED_REASONS, INFORMED_REASONS, option_text},
    state::{self, AdditionalInformationState},
    step::{Step, StepHandler, StepResult},
};

use super::{advanced, invalid, rejected, require_claim_id};

pub struct AdditionalInformationStep {
    api: Arc<dyn ClaimApi>,
}

impl AdditionalInformationStep {
    pub fn new(api: Arc<dyn ClaimApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl StepHandler for AdditionalInformationStep {
    fn step(&self) -> Step {
        Step::AdditionalInformation
    }

    async fn submit(&self, context: Context) -> Result<StepResult> {
        let locale = state::locale(&context).await;
        let form: AdditionalInformationState = state::slice(&context).await;

        let errors = validate_additional_information(&form, locale);
        if !errors.is_empty() {
            return Ok(invalid(self.step(), errors));
        }
        let claim_id = match require_claim_id(self.step(), &context).await {
            Ok(claim_id) => claim_id,
            Err(redirect) => return Ok(redirect),
        };

        let payload = FlightDetailsPayload {
            informed: option_text(
                INFORMED_REASONS,
                form.informed.as_deref().unwrap_or_default(),
                locale,
            ),
            delayed: option_text(
                DELAYED_REASONS,
                form.delayed.as_deref().unwrap_or_default(),
                locale,
            ),
        };

        match self.api.update_flight_details(&claim_id, payload).await {
            Ok(()) => {
                state::set_slice(&context, &form).await?;
                Ok(advanced(self.step(), &claim_id))
            }
            Err(e) => Ok(rejected(self.step(), &e, fields::ADDITIONAL_INFORMATION, locale)),
        }
    }
}

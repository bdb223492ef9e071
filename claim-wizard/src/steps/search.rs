use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::{
    api::{ClaimApi, CreateClaimRequest, DestinationPayload},
    context::Context,
    error::Result,
    forms::{fields, validate_destination},
    state::{self, DestinationState},
    step::{NextAction, Step, StepHandler, StepResult},
};

use super::{advanced, invalid, rejected};

/// Collects the purchase code and route, and creates the claim
pub struct SearchStep {
    api: Arc<dyn ClaimApi>,
}

impl SearchStep {
    pub fn new(api: Arc<dyn ClaimApi>) -> Self {
        Self { api }
    }
}

fn create_request(form: &DestinationState) -> CreateClaimRequest {
    let departure = form.departure_airport.as_ref();
    let arrival = form.arrival_airport.as_ref();
    CreateClaimRequest {
        purchase_code: form.purchase_code.clone().unwrap_or_default(),
        destination: DestinationPayload {
            departure_airport: departure.map(|a| a.title.clone()).unwrap_or_default(),
            departure_airport_iata_code: departure.map(|a| a.code.iata.clone()).unwrap_or_default(),
            arrival_airport: arrival.map(|a| a.title.clone()).unwrap_or_default(),
            arrival_airport_iata_code: arrival.map(|a| a.code.iata.clone()).unwrap_or_default(),
        },
    }
}

#[async_trait]
impl StepHandler for SearchStep {
    fn step(&self) -> Step {
        Step::Search
    }

    async fn submit(&self, context: Context) -> Result<StepResult> {
        let locale = state::locale(&context).await;
        let form: DestinationState = state::slice(&context).await;

        let errors = validate_destination(&form, locale);
        if !errors.is_empty() {
            return Ok(invalid(self.step(), errors));
        }

        // the route is fixed once a claim exists
        if let Some(claim_id) = state::claim_id(&context).await {
            info!(%claim_id, "Claim already created, moving on");
            return Ok(StepResult::new(NextAction::Continue));
        }

        let request = create_request(&form);
        info!(
            from = %request.destination.departure_airport_iata_code,
            to = %request.destination.arrival_airport_iata_code,
            "Creating claim"
        );

        match self.api.create_claim(request).await {
            Ok(created) => {
                state::set_claim_id(&context, Some(created.id.clone())).await?;
                state::set_slice(&context, &form).await?;
                Ok(advanced(self.step(), &created.id))
            }
            Err(e) => Ok(rejected(self.step(), &e, fields::DESTINATION, locale)),
        }
    }
}

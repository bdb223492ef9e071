use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    api::{ClaimApi, ContactPayload},
    context::Context,
    error::Result,
    forms::{fields, format_birth_date, validate_contact},
    state::{self, ContactState},
    step::{Step, StepHandler, StepResult},
};

use super::{advanced, invalid, rejected, require_claim_id};

/// Last input step: who to pay out to
pub struct ContactInformationStep {
    api: Arc<dyn ClaimApi>,
}

impl ContactInformationStep {
    pub fn new(api: Arc<dyn ClaimApi>) -> Self {
        Self { api }
    }
}

fn contact_payload(form: &ContactState) -> ContactPayload {
    ContactPayload {
        first_name: form.first_name.clone(),
        last_name: form.last_name.clone(),
        birth_date: form
            .birth_date
            .as_deref()
            .and_then(format_birth_date)
            .unwrap_or_default(),
        email: form.email.clone(),
        address: form.address.clone(),
        city: form.city.clone(),
        country: form.country.as_ref().map(|c| c.name.clone()).unwrap_or_default(),
        country_code: form.country.as_ref().map(|c| c.id.clone()).unwrap_or_default(),
        phone_number: form.phone_number.clone(),
        phone_code: form
            .phone_code
            .as_ref()
            .map(|p| p.phone_code.clone())
            .unwrap_or_default(),
    }
}

#[async_trait]
impl StepHandler for ContactInformationStep {
    fn step(&self) -> Step {
        Step::ContactInformation
    }

    async fn submit(&self, context: Context) -> Result<StepResult> {
        let locale = state::locale(&context).await;
        let form: ContactState = state::slice(&context).await;

        let errors = validate_contact(&form, locale);
        if !errors.is_empty() {
            return Ok(invalid(self.step(), errors));
        }
        let claim_id = match require_claim_id(self.step(), &context).await {
            Ok(claim_id) => claim_id,
            Err(redirect) => return Ok(redirect),
        };

        match self.api.update_contact(&claim_id, contact_payload(&form)).await {
            Ok(()) => {
                state::set_slice(&context, &form).await?;
                Ok(advanced(self.step(), &claim_id))
            }
            Err(e) => Ok(rejected(self.step(), &e, fields::CONTACT, locale)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CountryOption, PhoneCodeOption};

    #[test]
    fn payload_flattens_selections_and_normalises_birth_date() {
        let form = ContactState {
            first_name: "Ada".to_string(),
            birth_date: Some("1990-02-03T10:00:00Z".to_string()),
            country: Some(CountryOption {
                id: "LT".to_string(),
                name: "Lithuania".to_string(),
            }),
            phone_code: Some(PhoneCodeOption {
                id: "LT".to_string(),
                name: "Lithuania".to_string(),
                phone_code: "+370".to_string(),
            }),
            ..ContactState::default()
        };

        let payload = contact_payload(&form);
        assert_eq!(payload.birth_date, "1990-02-03");
        assert_eq!(payload.country, "Lithuania");
        assert_eq!(payload.country_code, "LT");
        assert_eq!(payload.phone_code, "+370");
    }
}

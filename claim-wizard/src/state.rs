//! Global claim state and the per-step form slices kept in a [`Context`].
//!
//! The functions here are the only place that knows which context key holds
//! what; step handlers and the wizard go through them.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    api::{Airport, Country},
    context::Context,
    error::Result,
    i18n::Locale,
    step::{Step, StepProgress},
};

pub mod state_keys {
    pub const CLAIM_FORM_ID: &str = "claim_form_id";
    pub const STEPS: &str = "claim_form_steps";
    pub const LOCALE: &str = "locale";
    pub const DESTINATION: &str = "claim_destination_form";
    pub const DISRUPTION_REASON: &str = "claim_disruption_reason_form";
    pub const ADDITIONAL_INFORMATION: &str = "claim_additional_info_form";
    pub const CONTACT: &str = "claim_contact_form";
}

/// A form slice stored under a fixed context key
pub trait FormSlice: Default + Serialize + DeserializeOwned + Send + Sync {
    const KEY: &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DestinationState {
    pub purchase_code: Option<String>,
    pub departure_airport: Option<Airport>,
    pub arrival_airport: Option<Airport>,
}

impl FormSlice for DestinationState {
    const KEY: &'static str = state_keys::DESTINATION;
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisruptionReasonState {
    pub user_reason: Option<String>,
    pub airline_reason: Option<String>,
    #[serde(default)]
    pub details: String,
}

impl FormSlice for DisruptionReasonState {
    const KEY: &'static str = state_keys::DISRUPTION_REASON;
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdditionalInformationState {
    pub informed: Option<String>,
    pub delayed: Option<String>,
}

impl FormSlice for AdditionalInformationState {
    const KEY: &'static str = state_keys::ADDITIONAL_INFORMATION;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryOption {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneCodeOption {
    pub id: String,
    pub name: String,
    pub phone_code: String,
}

impl From<&Country> for CountryOption {
    fn from(country: &Country) -> Self {
        Self {
            id: country.id.clone(),
            name: country.name.clone(),
        }
    }
}

impl From<&Country> for PhoneCodeOption {
    fn from(country: &Country) -> Self {
        Self {
            id: country.id.clone(),
            name: country.name.clone(),
            phone_code: country.phone_code.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactState {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<String>,
    pub email: String,
    pub repeat_email: String,
    pub address: String,
    pub city: String,
    pub country: Option<CountryOption>,
    pub phone_code: Option<PhoneCodeOption>,
    pub phone_number: String,
}

impl ContactState {
    /// Choosing a dial code restarts the phone number with that code
    pub fn select_phone_code(&mut self, option: PhoneCodeOption) {
        let unchanged = self
            .phone_code
            .as_ref()
            .is_some_and(|current| current.phone_code == option.phone_code);
        if unchanged {
            return;
        }
        self.phone_number = option.phone_code.clone();
        self.phone_code = Some(option);
    }
}

impl FormSlice for ContactState {
    const KEY: &'static str = state_keys::CONTACT;
}

pub async fn slice<T: FormSlice>(context: &Context) -> T {
    context.get(T::KEY).await.unwrap_or_default()
}

pub async fn set_slice<T: FormSlice>(context: &Context, value: &T) -> Result<()> {
    context.set(T::KEY, value).await
}

/// Server-issued claim id, if the first step has been submitted
pub async fn claim_id(context: &Context) -> Option<String> {
    context
        .get::<String>(state_keys::CLAIM_FORM_ID)
        .await
        .filter(|id| !id.is_empty())
}

pub async fn set_claim_id(context: &Context, claim_id: Option<String>) -> Result<()> {
    match claim_id {
        Some(id) => context.set(state_keys::CLAIM_FORM_ID, id).await,
        None => {
            context.remove(state_keys::CLAIM_FORM_ID).await;
            Ok(())
        }
    }
}

pub async fn step_progress(context: &Context) -> Option<StepProgress> {
    context.get(state_keys::STEPS).await
}

/// Merge a single step into the progress map
pub async fn record_step(context: &Context, step: Step) -> Result<()> {
    let mut steps = step_progress(context).await.unwrap_or_default();
    steps.insert(step.segment().to_string(), step.index());
    context.set(state_keys::STEPS, steps).await
}

pub async fn reset_step_progress(context: &Context) {
    context.remove(state_keys::STEPS).await;
}

pub async fn locale(context: &Context) -> Locale {
    context.get(state_keys::LOCALE).await.unwrap_or_default()
}

pub async fn set_locale(context: &Context, locale: Locale) -> Result<()> {
    context.set(state_keys::LOCALE, locale).await
}

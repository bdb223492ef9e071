use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    api::{Airport, ClaimApi},
    context::Context,
    error::{Result, WizardError},
    resume::{self, ResumeOutcome},
    route::{Location, Navigator},
    state::{
        self, AdditionalInformationState, ContactState, DestinationState, DisruptionReasonState,
        FormSlice,
    },
    step::{NextAction, Step, StepHandler},
    steps,
    typeahead::DEFAULT_ITEMS_PER_PAGE,
    violations::ResolvedErrors,
};

/// One user's pass through the wizard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub navigator: Navigator,
    pub errors: Option<ResolvedErrors>,
    pub status_message: Option<String>,
    /// Claim id whose entity has already been loaded into the context
    pub loaded_claim: Option<String>,
    #[serde(skip)]
    pub context: Context,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            navigator: Navigator::new(Location::for_step(Step::Search, None)),
            errors: None,
            status_message: None,
            loaded_claim: None,
            context: Context::new(),
        }
    }

    pub fn current_step(&self) -> Option<Step> {
        self.navigator.current_step()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// On a step, waiting for the form to be filled in
    WaitingForInput,
    /// Sent back to the search step because no claim exists
    RedirectedToSearch,
    /// On the confirmation page
    Completed,
}

/// Where a wizard operation left the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub location: String,
    pub step: Option<Step>,
    pub errors: Option<ResolvedErrors>,
    pub status_message: Option<String>,
    /// First airport page fetched while resuming a claim, for seeding the picker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airports: Option<Vec<Airport>>,
}

impl ExecutionResult {
    fn from_session(session: &Session, status: ExecutionStatus) -> Self {
        let status = match (status, session.current_step()) {
            (ExecutionStatus::WaitingForInput, Some(Step::ClaimCompleted)) => ExecutionStatus::Completed,
            (status, _) => status,
        };
        Self {
            status,
            location: session.navigator.current().to_url(),
            step: session.current_step(),
            errors: session.errors.clone(),
            status_message: session.status_message.clone(),
            airports: None,
        }
    }
}

/// Maps each step to its handler and applies handler outcomes to sessions.
///
/// A `Wizard` holds no per-user state and is shared across sessions.
pub struct Wizard {
    handlers: DashMap<Step, Arc<dyn StepHandler>>,
    api: Arc<dyn ClaimApi>,
    items_per_page: u32,
}

impl Wizard {
    pub fn new(api: Arc<dyn ClaimApi>) -> Self {
        Self {
            handlers: DashMap::new(),
            api,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
        }
    }

    pub fn add_handler(&self, handler: Arc<dyn StepHandler>) -> &Self {
        self.handlers.insert(handler.step(), handler);
        self
    }

    pub fn api(&self) -> Arc<dyn ClaimApi> {
        self.api.clone()
    }

    pub fn items_per_page(&self) -> u32 {
        self.items_per_page
    }

    pub fn get_handler(&self, step: Step) -> Option<Arc<dyn StepHandler>> {
        self.handlers.get(&step).map(|entry| entry.clone())
    }

    /// Open `url` in the session, as on a full page load.
    ///
    /// A claim id in the URL that has not been loaded yet is resumed from the
    /// backend. Without any step progress and without a claim id the wizard is
    /// sent to the search step.
    pub async fn enter(&self, session: &mut Session, url: &str) -> Result<ExecutionResult> {
        let location = Location::parse(url)?;
        self.leave_completed(session, location.step()).await;
        session.navigator.replace(location.clone());
        session.errors = None;
        session.status_message = None;

        let mut airports = None;
        if let Some(claim_id) = location.claim_id.as_deref() {
            if session.loaded_claim.as_deref() != Some(claim_id) {
                airports = self.resume(session, claim_id).await?;
            }
        }

        let has_progress = state::step_progress(&session.context).await.is_some();
        if !has_progress && session.navigator.current().claim_id.is_none() {
            if session.current_step() != Some(Step::Search) {
                info!(session_id = %session.id, "No progress and no claim, redirecting to search");
            }
            session
                .navigator
                .replace(Location::for_step(Step::Search, None));
            return Ok(ExecutionResult::from_session(
                session,
                ExecutionStatus::WaitingForInput,
            ));
        }

        if session.current_step().is_none() {
            return Err(WizardError::UnknownRoute(
                session.navigator.current().path.clone(),
            ));
        }
        let mut result = ExecutionResult::from_session(session, ExecutionStatus::WaitingForInput);
        result.airports = airports;
        Ok(result)
    }

    /// Returns the first airport page when the claim was loaded
    async fn resume(&self, session: &mut Session, claim_id: &str) -> Result<Option<Vec<Airport>>> {
        let outcome = resume::initialize_claim_entity(
            self.api.as_ref(),
            &session.context,
            claim_id,
            self.items_per_page,
        )
        .await?;

        match outcome {
            ResumeOutcome::Loaded { airports } => {
                session.loaded_claim = Some(claim_id.to_string());
                Ok(Some(airports))
            }
            ResumeOutcome::NotFound(errors) => {
                let without_id = session.navigator.current().without_claim_id();
                session.navigator.replace(without_id);
                session.loaded_claim = None;
                session.errors = Some(errors);
                Ok(None)
            }
            ResumeOutcome::Failed(errors) => {
                session.errors = Some(errors);
                Ok(None)
            }
        }
    }

    /// Submit the current step and apply the handler's [`NextAction`]
    pub async fn submit(&self, session: &mut Session) -> Result<ExecutionResult> {
        let step = session
            .current_step()
            .ok_or_else(|| WizardError::UnknownRoute(session.navigator.current().path.clone()))?;
        let handler = self
            .get_handler(step)
            .ok_or_else(|| WizardError::StepNotFound(step.to_string()))?;

        session.errors = None;
        debug!(session_id = %session.id, %step, "Submitting step");
        let result = handler.submit(session.context.clone()).await?;
        session.status_message = result.status_message.clone();

        let status = match result.next_action {
            NextAction::Continue => {
                state::record_step(&session.context, step).await?;
                let claim_id = state::claim_id(&session.context).await;
                session.loaded_claim = claim_id.clone();
                if let Some(next) = step.next() {
                    session.navigator.navigate_to_step(next, claim_id.as_deref());
                }
                ExecutionStatus::WaitingForInput
            }
            NextAction::RedirectToSearch => {
                session.navigator.navigate_to_step(Step::Search, None);
                state::record_step(&session.context, Step::Search).await?;
                ExecutionStatus::RedirectedToSearch
            }
            NextAction::Stay => {
                session.errors = result.errors;
                ExecutionStatus::WaitingForInput
            }
            NextAction::End => ExecutionStatus::Completed,
        };

        Ok(ExecutionResult::from_session(session, status))
    }

    /// Jump to any step, carrying the claim id. Step order is not enforced here.
    pub async fn navigate(&self, session: &mut Session, step: Step) -> Result<ExecutionResult> {
        self.leave_completed(session, Some(step)).await;
        let claim_id = state::claim_id(&session.context).await;
        session.navigator.navigate_to_step(step, claim_id.as_deref());
        session.errors = None;
        Ok(ExecutionResult::from_session(
            session,
            ExecutionStatus::WaitingForInput,
        ))
    }

    /// Go one entry back in the session's history
    pub async fn back(&self, session: &mut Session) -> Result<ExecutionResult> {
        let was_completed = session.current_step() == Some(Step::ClaimCompleted);
        let previous = session.navigator.back().and_then(Location::step);
        if previous.is_some() {
            session.errors = None;
        }
        if was_completed && previous.is_some_and(|step| step != Step::ClaimCompleted) {
            self.reset_after_completion(session).await;
        }
        Ok(ExecutionResult::from_session(
            session,
            ExecutionStatus::WaitingForInput,
        ))
    }

    /// Tear the session down, resetting progress if it ends on the confirmation page
    pub async fn close(&self, session: &mut Session) {
        self.leave_completed(session, None).await;
    }

    /// Replace the current step's form values
    pub async fn update_form(&self, session: &Session, values: Value) -> Result<()> {
        let step = session
            .current_step()
            .ok_or_else(|| WizardError::UnknownRoute(session.navigator.current().path.clone()))?;
        let context = &session.context;

        match step {
            Step::Search => {
                if state::claim_id(context).await.is_some() {
                    return Err(WizardError::FormLocked(step));
                }
                store::<DestinationState>(context, values).await
            }
            Step::DisruptionReason => store::<DisruptionReasonState>(context, values).await,
            Step::AdditionalInformation => store::<AdditionalInformationState>(context, values).await,
            Step::ContactInformation => {
                let previous: ContactState = state::slice(context).await;
                let mut next: ContactState = serde_json::from_value(values)?;
                if let Some(option) = next.phone_code.take() {
                    next.phone_code = previous.phone_code;
                    next.select_phone_code(option);
                }
                state::set_slice(context, &next).await
            }
            Step::ClaimCompleted => Err(WizardError::FormLocked(step)),
        }
    }

    async fn leave_completed(&self, session: &Session, destination: Option<Step>) {
        if session.current_step() == Some(Step::ClaimCompleted)
            && destination != Some(Step::ClaimCompleted)
        {
            self.reset_after_completion(session).await;
        }
    }

    async fn reset_after_completion(&self, session: &Session) {
        if state::step_progress(&session.context).await.is_some() {
            info!(session_id = %session.id, "Leaving completed claim, clearing step progress");
            state::reset_step_progress(&session.context).await;
        }
    }
}

async fn store<T: FormSlice>(context: &Context, values: Value) -> Result<()> {
    let slice: T = serde_json::from_value(values).map_err(|e| {
        warn!(key = T::KEY, error = %e, "Rejected form values");
        WizardError::Serialization(e)
    })?;
    state::set_slice(context, &slice).await
}

/// Builder for a [`Wizard`]
pub struct WizardBuilder {
    wizard: Wizard,
}

impl WizardBuilder {
    pub fn new(api: Arc<dyn ClaimApi>) -> Self {
        Self {
            wizard: Wizard::new(api),
        }
    }

    pub fn add_handler(self, handler: Arc<dyn StepHandler>) -> Self {
        self.wizard.add_handler(handler);
        self
    }

    /// Register the stock handler for every step
    pub fn with_default_handlers(self) -> Self {
        let api = self.wizard.api();
        steps::default_handlers(api)
            .into_iter()
            .fold(self, |builder, handler| builder.add_handler(handler))
    }

    pub fn items_per_page(mut self, items_per_page: u32) -> Self {
        self.wizard.items_per_page = items_per_page;
        self
    }

    pub fn build(self) -> Wizard {
        self.wizard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{InMemoryClaimApi, memory::operations};
    use crate::state::{ContactState, PhoneCodeOption};
    use serde_json::json;

    fn wizard() -> (Wizard, InMemoryClaimApi) {
        let api = InMemoryClaimApi::new();
        let wizard = WizardBuilder::new(Arc::new(api.clone()))
            .with_default_handlers()
            .build();
        (wizard, api)
    }

    #[tokio::test]
    async fn entering_without_progress_or_claim_lands_on_search() {
        let (wizard, api) = wizard();
        let mut session = Session::new("s1");

        let result = wizard
            .enter(&mut session, "/claim-form/contact-information")
            .await
            .unwrap();

        assert_eq!(result.step, Some(Step::Search));
        assert_eq!(result.location, "/claim-form/search");
        assert_eq!(api.total_calls(), 0);
    }

    #[tokio::test]
    async fn unknown_route_with_progress_is_an_error() {
        let (wizard, _) = wizard();
        let mut session = Session::new("s1");
        state::record_step(&session.context, Step::Search)
            .await
            .unwrap();

        let err = wizard
            .enter(&mut session, "/claim-form/payment")
            .await
            .unwrap_err();
        assert!(matches!(err, WizardError::UnknownRoute(_)));
    }

    #[tokio::test]
    async fn invalid_form_stays_on_step_with_field_errors() {
        let (wizard, api) = wizard();
        let mut session = Session::new("s1");
        wizard.enter(&mut session, "/claim-form/search").await.unwrap();

        let result = wizard.submit(&mut session).await.unwrap();

        assert_eq!(result.step, Some(Step::Search));
        let form_errors = result.errors.unwrap().form_errors.unwrap();
        assert!(form_errors.contains_key("purchaseCode"));
        assert_eq!(api.call_count(operations::CREATE_CLAIM), 0);
        assert!(state::step_progress(&session.context).await.is_none());
    }

    #[tokio::test]
    async fn search_form_is_locked_once_claim_exists() {
        let (wizard, _) = wizard();
        let mut session = Session::new("s1");
        state::set_claim_id(&session.context, Some("c1".to_string()))
            .await
            .unwrap();

        let err = wizard
            .update_form(&mut session, json!({ "purchase_code": "ZZZZZZZZ" }))
            .await
            .unwrap_err();
        assert!(matches!(err, WizardError::FormLocked(Step::Search)));
    }

    #[tokio::test]
    async fn choosing_phone_code_prefills_number() {
        let (wizard, _) = wizard();
        let mut session = Session::new("s1");
        wizard
            .navigate(&mut session, Step::ContactInformation)
            .await
            .unwrap();

        wizard
            .update_form(
                &mut session,
                json!({
                    "first_name": "Ada",
                    "phone_number": "",
                    "phone_code": { "id": "LT", "name": "Lithuania", "phone_code": "+370" }
                }),
            )
            .await
            .unwrap();

        let contact: ContactState = state::slice(&session.context).await;
        assert_eq!(contact.phone_number, "+370");
        assert_eq!(
            contact.phone_code,
            Some(PhoneCodeOption {
                id: "LT".to_string(),
                name: "Lithuania".to_string(),
                phone_code: "+370".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn back_returns_to_previous_location() {
        let (wizard, _) = wizard();
        let mut session = Session::new("s1");
        wizard.navigate(&mut session, Step::DisruptionReason).await.unwrap();
        wizard
            .navigate(&mut session, Step::AdditionalInformation)
            .await
            .unwrap();

        let result = wizard.back(&mut session).await.unwrap();
        assert_eq!(result.step, Some(Step::DisruptionReason));
    }
}

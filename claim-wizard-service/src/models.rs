use claim_wizard::{
    ExecutionStatus, ResolvedErrors, Step,
    reasons::RenderedOption,
    route::WizardNavigation,
    step::StepProgress,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    /// Wizard URL to open, e.g. `/claim-form/disruption-reason?id=...`
    pub url: Option<String>,
    pub locale: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NavigateRequest {
    pub step: Step,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LookupInputRequest {
    pub text: String,
}

/// Everything a front end needs to render the session's current page
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub status: ExecutionStatus,
    pub location: String,
    pub step: Option<Step>,
    pub claim_id: Option<String>,
    pub locale: String,
    pub progress: Option<StepProgress>,
    pub errors: Option<ResolvedErrors>,
    pub status_message: Option<String>,
    pub back_visible: bool,
    pub continue_visible: bool,
    pub continue_label: String,
    pub navigation: WizardNavigation,
    /// Answer options per field, for steps that offer choices
    pub options: BTreeMap<String, Vec<RenderedOption>>,
    /// Stored form slices keyed by context key
    pub forms: BTreeMap<String, Value>,
}

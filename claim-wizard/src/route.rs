//! Wizard step controller: URL ↔ step resolution and navigation history.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, WizardError},
    i18n::{self, Locale},
    step::Step,
};

/// Query parameter carrying the claim id between steps
pub const CLAIM_ID_PARAM: &str = "id";

// Only used to resolve relative wizard URLs
const URL_BASE: &str = "http://wizard.local";

/// Last non-empty path segment, ignoring any query string
pub fn last_path_segment(path: &str) -> Option<&str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').rev().find(|segment| !segment.is_empty())
}

pub fn resolve_step(path: &str) -> Option<Step> {
    last_path_segment(path).and_then(Step::from_segment)
}

/// Where the wizard currently is: a path plus the optional claim id parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub path: String,
    pub claim_id: Option<String>,
}

impl Location {
    pub fn for_step(step: Step, claim_id: Option<&str>) -> Self {
        Self {
            path: step.path(),
            claim_id: claim_id.filter(|id| !id.is_empty()).map(str::to_string),
        }
    }

    pub fn step(&self) -> Option<Step> {
        resolve_step(&self.path)
    }

    /// Parse a relative or absolute wizard URL such as `/claim-form/search?id=abc`
    pub fn parse(url: &str) -> Result<Self> {
        let base = Url::parse(URL_BASE).map_err(|e| WizardError::UnknownRoute(e.to_string()))?;
        let parsed = base
            .join(url)
            .map_err(|e| WizardError::UnknownRoute(format!("{url}: {e}")))?;
        let claim_id = parsed
            .query_pairs()
            .find(|(key, _)| key == CLAIM_ID_PARAM)
            .map(|(_, value)| value.into_owned())
            .filter(|id| !id.is_empty());
        Ok(Self {
            path: parsed.path().to_string(),
            claim_id,
        })
    }

    /// Path with the claim id appended as a query parameter when present
    pub fn to_url(&self) -> String {
        match &self.claim_id {
            Some(id) => {
                let mut url = match Url::parse(URL_BASE).and_then(|base| base.join(&self.path)) {
                    Ok(url) => url,
                    Err(_) => return format!("{}?{}={}", self.path, CLAIM_ID_PARAM, id),
                };
                url.query_pairs_mut().append_pair(CLAIM_ID_PARAM, id);
                format!("{}?{}", url.path(), url.query().unwrap_or_default())
            }
            None => self.path.clone(),
        }
    }

    pub fn without_claim_id(&self) -> Self {
        Self {
            path: self.path.clone(),
            claim_id: None,
        }
    }
}

/// Current location plus the history needed for "back"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Navigator {
    current: Location,
    history: Vec<Location>,
}

impl Navigator {
    pub fn new(start: Location) -> Self {
        Self {
            current: start,
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> &Location {
        &self.current
    }

    pub fn current_step(&self) -> Option<Step> {
        self.current.step()
    }

    pub fn navigate(&mut self, to: Location) {
        let from = std::mem::replace(&mut self.current, to);
        self.history.push(from);
    }

    /// Jump to `step`, carrying the claim id when one exists
    pub fn navigate_to_step(&mut self, step: Step, claim_id: Option<&str>) {
        self.navigate(Location::for_step(step, claim_id));
    }

    /// Swap the current location without adding a history entry
    pub fn replace(&mut self, to: Location) {
        self.current = to;
    }

    pub fn back(&mut self) -> Option<&Location> {
        let previous = self.history.pop()?;
        self.current = previous;
        Some(&self.current)
    }
}

pub fn back_visible(step: Step) -> bool {
    !matches!(step, Step::Search | Step::ClaimCompleted)
}

pub fn continue_visible(step: Step) -> bool {
    step != Step::ClaimCompleted
}

/// The step whose submit button completes the claim
pub fn is_last_input_step(step: Step) -> bool {
    step.next() == Some(Step::ClaimCompleted)
}

/// Message id of the submit button label
pub fn continue_label_id(step: Step) -> &'static str {
    if is_last_input_step(step) {
        "claim.form.complete.button"
    } else {
        "claim.form.continue.button"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationItem {
    pub step: Step,
    pub label: String,
    pub url: String,
}

/// The wizard header: labelled steps and which one is active
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardNavigation {
    pub active_step: Option<u8>,
    pub items: Vec<NavigationItem>,
}

pub fn navigation_items(locale: Locale, active: Option<Step>, claim_id: Option<&str>) -> WizardNavigation {
    let labelled = [
        (Step::Search, "claim.form.wizard.navigation.destination"),
        (Step::DisruptionReason, "claim.form.wizard.navigation.disruption"),
        (Step::AdditionalInformation, "claim.form.wizard.navigation.additional.info"),
        (Step::ContactInformation, "claim.form.wizard.navigation.contact"),
    ];
    WizardNavigation {
        active_step: active.map(|step| step.index()),
        items: labelled
            .into_iter()
            .map(|(step, message_id)| NavigationItem {
                step,
                label: i18n::translate(locale, message_id),
                url: Location::for_step(step, claim_id).to_url(),
            })
            .collect(),
    }
}

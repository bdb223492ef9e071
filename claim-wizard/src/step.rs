use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{context::Context, error::Result, violations::ResolvedErrors};

/// Root path every wizard route hangs off
pub const ROOT_PATH: &str = "/claim-form";

/// The wizard steps, in the only order they advance in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    Search,
    DisruptionReason,
    AdditionalInformation,
    ContactInformation,
    ClaimCompleted,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::Search,
        Step::DisruptionReason,
        Step::AdditionalInformation,
        Step::ContactInformation,
        Step::ClaimCompleted,
    ];

    /// Route segment used in URLs and as the progress map key
    pub fn segment(&self) -> &'static str {
        match self {
            Step::Search => "search",
            Step::DisruptionReason => "disruption-reason",
            Step::AdditionalInformation => "additional-information",
            Step::ContactInformation => "contact-information",
            Step::ClaimCompleted => "claim-completed",
        }
    }

    pub fn from_segment(segment: &str) -> Option<Step> {
        Step::ALL.into_iter().find(|step| step.segment() == segment)
    }

    pub fn index(&self) -> u8 {
        match self {
            Step::Search => 0,
            Step::DisruptionReason => 1,
            Step::AdditionalInformation => 2,
            Step::ContactInformation => 3,
            Step::ClaimCompleted => 4,
        }
    }

    pub fn next(&self) -> Option<Step> {
        Step::ALL.get(self.index() as usize + 1).copied()
    }

    pub fn previous(&self) -> Option<Step> {
        (self.index() as usize)
            .checked_sub(1)
            .and_then(|i| Step::ALL.get(i).copied())
    }

    /// Absolute path of the step route
    pub fn path(&self) -> String {
        format!("{}/{}", ROOT_PATH, self.segment())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// Steps the user has passed through, keyed by route segment.
///
/// Only used to tell whether the wizard has been started in this session; the
/// individual steps re-check their own preconditions.
pub type StepProgress = BTreeMap<String, u8>;

/// What the wizard should do once a step handler has finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextAction {
    /// Record the step and advance to the next one
    Continue,
    /// No claim exists yet, start over from the search step
    RedirectToSearch,
    /// Stay on the current step, usually to show errors
    Stay,
    /// Nothing left to submit
    End,
}

/// Result of submitting a step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub errors: Option<ResolvedErrors>,
    pub next_action: NextAction,
    pub status_message: Option<String>,
}

impl StepResult {
    pub fn new(next_action: NextAction) -> Self {
        Self {
            errors: None,
            next_action,
            status_message: None,
        }
    }

    pub fn new_with_status(next_action: NextAction, status_message: Option<String>) -> Self {
        Self {
            errors: None,
            next_action,
            status_message,
        }
    }

    pub fn with_errors(errors: ResolvedErrors) -> Self {
        Self {
            errors: Some(errors),
            next_action: NextAction::Stay,
            status_message: None,
        }
    }
}

/// One page of the wizard: reads its slice from the context and submits it
#[async_trait]
pub trait StepHandler: Send + Sync {
    fn step(&self) -> Step;

    async fn submit(&self, context: Context) -> Result<StepResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_advance_in_fixed_order() {
        let mut order = vec![Step::Search];
        while let Some(next) = order.last().and_then(Step::next) {
            order.push(next);
        }
        assert_eq!(order, Step::ALL.to_vec());
        assert_eq!(Step::ClaimCompleted.next(), None);
        assert_eq!(Step::Search.previous(), None);
        assert_eq!(Step::ContactInformation.previous(), Some(Step::AdditionalInformation));
    }

    #[test]
    fn segments_round_trip_through_lookup_table() {
        for step in Step::ALL {
            assert_eq!(Step::from_segment(step.segment()), Some(step));
        }
        assert_eq!(Step::from_segment("payment"), None);
        assert_eq!(Step::DisruptionReason.path(), "/claim-form/disruption-reason");
    }
}

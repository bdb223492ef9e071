pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod forms;
pub mod i18n;
pub mod reasons;
pub mod resume;
pub mod route;
pub mod runner;
pub mod state;
pub mod step;
pub mod steps;
pub mod storage;
pub mod typeahead;
pub mod violations;
pub mod wizard;

// Re-export commonly used types
pub use api::{ApiError, ClaimApi, HttpClaimApi, InMemoryClaimApi};
pub use config::WizardConfig;
pub use context::Context;
pub use error::{Result, WizardError};
pub use i18n::Locale;
pub use route::{Location, Navigator};
pub use runner::WizardRunner;
pub use step::{NextAction, Step, StepHandler, StepResult};
pub use storage::{InMemorySessionStorage, SessionStorage};
pub use typeahead::{AirportList, CountryList, Typeahead, TypeaheadConfig, TypeaheadSnapshot};
pub use violations::{ResolvedErrors, Violation};
pub use wizard::{ExecutionResult, ExecutionStatus, Session, Wizard, WizardBuilder};

use thiserror::Error;

use crate::{api::ApiError, step::Step};

/// Errors produced by the wizard runtime
#[derive(Error, Debug)]
pub enum WizardError {
    #[error("Unknown wizard route: {0}")]
    UnknownRoute(String),

    #[error("No handler registered for step: {0}")]
    StepNotFound(String),

    #[error("Form for step {0} can no longer be changed")]
    FormLocked(Step),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Context error: {0}")]
    ContextError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

pub type Result<T> = std::result::Result<T, WizardError>;

//! Client side of the claims backend.
//!
//! [`ClaimApi`] is the seam every step handler and loader talks through.
//! [`HttpClaimApi`] speaks JSON over HTTP; [`InMemoryClaimApi`] implements the
//! same contract in process and is used when no backend URL is configured.

pub mod http;
pub mod memory;
pub mod models;

use async_trait::async_trait;
use thiserror::Error;

use crate::violations::Violation;

pub use http::HttpClaimApi;
pub use memory::InMemoryClaimApi;
pub use models::*;

/// Backend resource paths, relative to the API base URL
pub mod routes {
    pub const CLAIMS: &str = "claims";
    pub const DISRUPTION: &str = "disruption";
    pub const FLIGHT_DETAILS: &str = "flight-details";
    pub const CONTACT: &str = "contact";
    pub const AIRPORTS: &str = "airports";
    pub const COUNTRIES: &str = "countries";

    pub fn claim(id: &str) -> String {
        format!("{CLAIMS}/{id}")
    }

    pub fn claim_resource(id: &str, resource: &str) -> String {
        format!("{CLAIMS}/{id}/{resource}")
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed with status {status} ({} violations)", .violations.len())]
    Status {
        status: u16,
        violations: Vec<Violation>,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn not_found() -> Self {
        ApiError::Status {
            status: 404,
            violations: Vec::new(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }

    /// Violations carried by the error body; empty for transport failures
    pub fn violations(&self) -> &[Violation] {
        match self {
            ApiError::Status { violations, .. } => violations,
            _ => &[],
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Operations the wizard needs from the claims backend
#[async_trait]
pub trait ClaimApi: Send + Sync {
    async fn create_claim(&self, request: CreateClaimRequest) -> ApiResult<ClaimCreated>;

    async fn update_disruption(&self, claim_id: &str, payload: DisruptionPayload) -> ApiResult<()>;

    async fn update_flight_details(
        &self,
        claim_id: &str,
        payload: FlightDetailsPayload,
    ) -> ApiResult<()>;

    async fn update_contact(&self, claim_id: &str, payload: ContactPayload) -> ApiResult<()>;

    async fn get_claim(&self, claim_id: &str) -> ApiResult<ClaimEntity>;

    async fn list_airports(&self, query: ListQuery) -> ApiResult<ListPage<Airport>>;

    async fn list_countries(&self, query: ListQuery) -> ApiResult<ListPage<Country>>;
}

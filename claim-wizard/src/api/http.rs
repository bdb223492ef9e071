use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::{
    ApiError, ApiResult, ClaimApi, routes,
    models::{
        Airport, ClaimCreated, ClaimEntity, ContactPayload, Country, CreateClaimRequest,
        DisruptionPayload, FlightDetailsPayload, ListPage, ListQuery,
    },
};
use crate::violations::Violation;

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    violations: Vec<Violation>,
}

/// JSON-over-HTTP client for the claims backend
#[derive(Clone)]
pub struct HttpClaimApi {
    client: Client,
    base_url: Url,
}

impl HttpClaimApi {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        // Url::join drops the last segment unless the base ends with a slash
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url =
            Url::parse(&normalized).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = Self::check(request.send().await?).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send_unit(&self, request: RequestBuilder) -> ApiResult<()> {
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn check(response: reqwest::Response) -> ApiResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().clone();
        let body = response.text().await.unwrap_or_default();
        let violations = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.violations)
            .unwrap_or_default();
        warn!(
            url = %url,
            status = status.as_u16(),
            violations = violations.len(),
            "Claims backend rejected request"
        );
        Err(ApiError::Status {
            status: status.as_u16(),
            violations,
        })
    }

    async fn list<T: DeserializeOwned>(&self, path: &str, query: ListQuery) -> ApiResult<ListPage<T>> {
        let url = self.url(path)?;
        debug!(url = %url, query = ?query, "Fetching list page");
        self.send_json(self.client.get(url).query(&query.to_query_pairs()))
            .await
    }
}

#[async_trait]
impl ClaimApi for HttpClaimApi {
    async fn create_claim(&self, request: CreateClaimRequest) -> ApiResult<ClaimCreated> {
        let url = self.url(routes::CLAIMS)?;
        self.send_json(self.client.post(url).json(&request)).await
    }

    async fn update_disruption(&self, claim_id: &str, payload: DisruptionPayload) -> ApiResult<()> {
        let url = self.url(&routes::claim_resource(claim_id, routes::DISRUPTION))?;
        self.send_unit(self.client.put(url).json(&payload)).await
    }

    async fn update_flight_details(
        &self,
        claim_id: &str,
        payload: FlightDetailsPayload,
    ) -> ApiResult<()> {
        let url = self.url(&routes::claim_resource(claim_id, routes::FLIGHT_DETAILS))?;
        self.send_unit(self.client.put(url).json(&payload)).await
    }

    async fn update_contact(&self, claim_id: &str, payload: ContactPayload) -> ApiResult<()> {
        let url = self.url(&routes::claim_resource(claim_id, routes::CONTACT))?;
        self.send_unit(self.client.put(url).json(&payload)).await
    }

    async fn get_claim(&self, claim_id: &str) -> ApiResult<ClaimEntity> {
        let url = self.url(&routes::claim(claim_id))?;
        self.send_json(self.client.get(url)).await
    }

    async fn list_airports(&self, query: ListQuery) -> ApiResult<ListPage<Airport>> {
        self.list(routes::AIRPORTS, query).await
    }

    async fn list_countries(&self, query: ListQuery) -> ApiResult<ListPage<Country>> {
        self.list(routes::COUNTRIES, query).await
    }
}

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::{
    ApiError, ApiResult, ClaimApi,
    models::{
        Airport, AirportCode, ClaimCreated, ClaimEntity, ContactPayload, Country,
        CreateClaimRequest, DisruptionPayload, FlightDetailsPayload, ListMeta, ListPage, ListQuery,
    },
};
use crate::violations::Violation;

/// Operation names used for call counting and injected failures
pub mod operations {
    pub const CREATE_CLAIM: &str = "create_claim";
    pub const UPDATE_DISRUPTION: &str = "update_disruption";
    pub const UPDATE_FLIGHT_DETAILS: &str = "update_flight_details";
    pub const UPDATE_CONTACT: &str = "update_contact";
    pub const GET_CLAIM: &str = "get_claim";
    pub const LIST_AIRPORTS: &str = "list_airports";
    pub const LIST_COUNTRIES: &str = "list_countries";
}

const SEED_AIRPORTS: &[(&str, &str)] = &[
    ("LHR", "London Heathrow"),
    ("LGW", "London Gatwick"),
    ("LCY", "London City"),
    ("STN", "London Stansted"),
    ("LTN", "London Luton"),
    ("FRA", "Frankfurt am Main"),
    ("MUC", "Munich"),
    ("BER", "Berlin Brandenburg"),
    ("VNO", "Vilnius"),
    ("RIX", "Riga"),
    ("CDG", "Paris Charles de Gaulle"),
    ("AMS", "Amsterdam Schiphol"),
    ("MAD", "Madrid Barajas"),
    ("BCN", "Barcelona El Prat"),
    ("FCO", "Rome Fiumicino"),
    ("DUB", "Dublin"),
    ("CPH", "Copenhagen"),
    ("VIE", "Vienna"),
    ("WAW", "Warsaw Chopin"),
    ("LIS", "Lisbon"),
    ("ATH", "Athens"),
    ("OSL", "Oslo Gardermoen"),
];

const SEED_COUNTRIES: &[(&str, &str, &str)] = &[
    ("GB", "United Kingdom", "+44"),
    ("DE", "Germany", "+49"),
    ("LT", "Lithuania", "+370"),
    ("LV", "Latvia", "+371"),
    ("FR", "France", "+33"),
    ("NL", "Netherlands", "+31"),
    ("ES", "Spain", "+34"),
    ("IT", "Italy", "+39"),
    ("IE", "Ireland", "+353"),
    ("DK", "Denmark", "+45"),
    ("AT", "Austria", "+43"),
    ("PL", "Poland", "+48"),
    ("PT", "Portugal", "+351"),
    ("GR", "Greece", "+30"),
    ("NO", "Norway", "+47"),
];

/// In-process claims backend with the same contract as the HTTP one.
///
/// Counts calls per operation and can be told to fail an operation, which is
/// what the wizard's tests rely on.
#[derive(Clone)]
pub struct InMemoryClaimApi {
    claims: Arc<DashMap<String, ClaimEntity>>,
    airports: Arc<Vec<Airport>>,
    countries: Arc<Vec<Country>>,
    calls: Arc<DashMap<&'static str, usize>>,
    failures: Arc<DashMap<&'static str, (u16, Vec<Violation>)>>,
}

impl InMemoryClaimApi {
    pub fn new() -> Self {
        let airports = SEED_AIRPORTS
            .iter()
            .enumerate()
            .map(|(i, (iata, title))| Airport {
                id: (i + 1).to_string(),
                title: title.to_string(),
                code: AirportCode {
                    iata: iata.to_string(),
                },
            })
            .collect();
        let countries = SEED_COUNTRIES
            .iter()
            .map(|(id, name, phone_code)| Country {
                id: id.to_string(),
                name: name.to_string(),
                phone_code: phone_code.to_string(),
            })
            .collect();

        Self {
            claims: Arc::new(DashMap::new()),
            airports: Arc::new(airports),
            countries: Arc::new(countries),
            calls: Arc::new(DashMap::new()),
            failures: Arc::new(DashMap::new()),
        }
    }

    /// Number of times `operation` has been called
    pub fn call_count(&self, operation: &str) -> usize {
        self.calls.get(operation).map(|c| *c).unwrap_or(0)
    }

    /// Total calls across all operations
    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|entry| *entry.value()).sum()
    }

    /// Make every subsequent call of `operation` fail with the given status
    pub fn fail_with(&self, operation: &'static str, status: u16, violations: Vec<Violation>) {
        self.failures.insert(operation, (status, violations));
    }

    pub fn clear_failures(&self) {
        self.failures.clear();
    }

    pub fn insert_claim(&self, claim: ClaimEntity) {
        self.claims.insert(claim.id.clone(), claim);
    }

    pub fn claim(&self, claim_id: &str) -> Option<ClaimEntity> {
        self.claims.get(claim_id).map(|entry| entry.clone())
    }

    fn enter(&self, operation: &'static str) -> ApiResult<()> {
        *self.calls.entry(operation).or_insert(0) += 1;
        debug!(operation, "In-memory claims backend call");
        match self.failures.get(operation) {
            Some(failure) => Err(ApiError::Status {
                status: failure.0,
                violations: failure.1.clone(),
            }),
            None => Ok(()),
        }
    }

    fn update_claim(&self, claim_id: &str, update: impl FnOnce(&mut ClaimEntity)) -> ApiResult<()> {
        let mut claim = self
            .claims
            .get_mut(claim_id)
            .ok_or_else(ApiError::not_found)?;
        update(&mut claim);
        claim.updated_at = chrono::Utc::now().to_rfc3339();
        Ok(())
    }

    fn find_airport(&self, iata: &str) -> Option<&Airport> {
        self.airports.iter().find(|a| a.code.iata == iata)
    }
}

impl Default for InMemoryClaimApi {
    fn default() -> Self {
        Self::new()
    }
}

fn violation(path: &str, code: &str, message: &str) -> Violation {
    Violation {
        property_path: path.to_string(),
        message: message.to_string(),
        code: Some(code.to_string()),
    }
}

fn reject(violations: Vec<Violation>) -> ApiResult<()> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Status {
            status: 422,
            violations,
        })
    }
}

fn paginate<T: Clone>(items: Vec<T>, query: &ListQuery) -> ListPage<T> {
    let per_page = query.items_per_page.max(1);
    let page = query.page.unwrap_or(1).max(1);
    let total = items.len();
    let offset = (page as usize - 1).saturating_mul(per_page as usize);
    let data = items
        .into_iter()
        .skip(offset)
        .take(per_page as usize)
        .collect();
    ListPage {
        data,
        meta: ListMeta {
            current_page: page,
            items_per_page: per_page,
            total_items: total as u64,
        },
    }
}

#[async_trait]
impl ClaimApi for InMemoryClaimApi {
    async fn create_claim(&self, request: CreateClaimRequest) -> ApiResult<ClaimCreated> {
        self.enter(operations::CREATE_CLAIM)?;

        let mut violations = Vec::new();
        if request.purchase_code.chars().count() != 8 {
            violations.push(violation(
                "purchaseCode",
                "invalid_length",
                "Purchase code must be 8 characters long",
            ));
        }
        let destination = &request.destination;
        if self.find_airport(&destination.departure_airport_iata_code).is_none() {
            violations.push(violation("departureAirport", "invalid_airport", "Unknown airport"));
        }
        if self.find_airport(&destination.arrival_airport_iata_code).is_none() {
            violations.push(violation("arrivalAirport", "invalid_airport", "Unknown airport"));
        }
        reject(violations)?;

        let id = Uuid::new_v4().to_string();
        self.claims.insert(
            id.clone(),
            ClaimEntity {
                id: id.clone(),
                destination: request.destination,
                purchase_code: request.purchase_code,
                state: "draft".to_string(),
                updated_at: chrono::Utc::now().to_rfc3339(),
                ..ClaimEntity::default()
            },
        );
        Ok(ClaimCreated { id })
    }

    async fn update_disruption(&self, claim_id: &str, payload: DisruptionPayload) -> ApiResult<()> {
        self.enter(operations::UPDATE_DISRUPTION)?;

        let mut violations = Vec::new();
        if payload.user_reason.trim().is_empty() {
            violations.push(violation("userReason", "not_blank", "Value should not be blank"));
        }
        if payload.airline_reason.trim().is_empty() {
            violations.push(violation("airlineReason", "not_blank", "Value should not be blank"));
        }
        reject(violations)?;

        self.update_claim(claim_id, |claim| claim.disruption = payload)
    }

    async fn update_flight_details(
        &self,
        claim_id: &str,
        payload: FlightDetailsPayload,
    ) -> ApiResult<()> {
        self.enter(operations::UPDATE_FLIGHT_DETAILS)?;

        let mut violations = Vec::new();
        if payload.informed.trim().is_empty() {
            violations.push(violation("informed", "not_blank", "Value should not be blank"));
        }
        if payload.delayed.trim().is_empty() {
            violations.push(violation("delayed", "not_blank", "Value should not be blank"));
        }
        reject(violations)?;

        self.update_claim(claim_id, |claim| claim.flight_details = payload)
    }

    async fn update_contact(&self, claim_id: &str, payload: ContactPayload) -> ApiResult<()> {
        self.enter(operations::UPDATE_CONTACT)?;

        let mut violations = Vec::new();
        if !payload.email.contains('@') {
            violations.push(violation("email", "invalid_email", "Invalid email address"));
        }
        for (path, value) in [
            ("firstName", &payload.first_name),
            ("lastName", &payload.last_name),
            ("birthDate", &payload.birth_date),
            ("address", &payload.address),
            ("city", &payload.city),
            ("country", &payload.country),
            ("phoneNumber", &payload.phone_number),
        ] {
            if value.trim().is_empty() {
                violations.push(violation(path, "not_blank", "Value should not be blank"));
            }
        }
        reject(violations)?;

        self.update_claim(claim_id, |claim| {
            claim.contact = payload;
            claim.state = "submitted".to_string();
        })
    }

    async fn get_claim(&self, claim_id: &str) -> ApiResult<ClaimEntity> {
        self.enter(operations::GET_CLAIM)?;
        self.claim(claim_id).ok_or_else(ApiError::not_found)
    }

    async fn list_airports(&self, query: ListQuery) -> ApiResult<ListPage<Airport>> {
        self.enter(operations::LIST_AIRPORTS)?;

        let mut matches: Vec<Airport> = match &query.search {
            Some(search) => {
                let needle = search.to_lowercase();
                self.airports
                    .iter()
                    .filter(|a| {
                        a.title.to_lowercase().contains(&needle)
                            || a.code.iata.to_lowercase().contains(&needle)
                    })
                    .cloned()
                    .collect()
            }
            None => self.airports.to_vec(),
        };
        if let Some(search) = &query.search {
            // exact IATA hits first so a code lookup returns its airport on top
            matches.sort_by_key(|a| !a.code.iata.eq_ignore_ascii_case(search));
        }
        Ok(paginate(matches, &query))
    }

    async fn list_countries(&self, query: ListQuery) -> ApiResult<ListPage<Country>> {
        self.enter(operations::LIST_COUNTRIES)?;

        let matches: Vec<Country> = match &query.search {
            Some(search) => {
                let needle = search.to_lowercase();
                self.countries
                    .iter()
                    .filter(|c| {
                        c.name.to_lowercase().contains(&needle)
                            || c.phone_code.contains(&needle)
                            || c.id.eq_ignore_ascii_case(&needle)
                    })
                    .cloned()
                    .collect()
            }
            None => self.countries.to_vec(),
        };
        Ok(paginate(matches, &query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DestinationPayload;

    fn destination(from: &str, to: &str) -> DestinationPayload {
        DestinationPayload {
            departure_airport: String::new(),
            departure_airport_iata_code: from.to_string(),
            arrival_airport: String::new(),
            arrival_airport_iata_code: to.to_string(),
        }
    }

    #[tokio::test]
    async fn paginates_and_filters_airports() {
        let api = InMemoryClaimApi::new();

        let first = api.list_airports(ListQuery::first_page(10)).await.unwrap();
        assert_eq!(first.data.len(), 10);
        assert_eq!(first.meta.current_page, 1);

        let third = api
            .list_airports(ListQuery::first_page(10).with_page(3))
            .await
            .unwrap();
        assert_eq!(third.data.len(), SEED_AIRPORTS.len() - 20);

        let far = api
            .list_airports(ListQuery::first_page(u32::MAX).with_page(u32::MAX))
            .await
            .unwrap();
        assert!(far.data.is_empty());
        assert_eq!(far.meta.current_page, u32::MAX);

        let london = api
            .list_airports(ListQuery::first_page(10).with_search("London"))
            .await
            .unwrap();
        assert_eq!(london.data.len(), 5);
        assert!(london.data.iter().all(|a| a.title.starts_with("London")));

        let by_code = api
            .list_airports(ListQuery::first_page(10).with_search("VNO"))
            .await
            .unwrap();
        assert_eq!(by_code.data[0].code.iata, "VNO");
        assert_eq!(api.call_count(operations::LIST_AIRPORTS), 4);
    }

    #[tokio::test]
    async fn create_claim_reports_field_violations() {
        let api = InMemoryClaimApi::new();
        let err = api
            .create_claim(CreateClaimRequest {
                purchase_code: "short".to_string(),
                destination: destination("VNO", "XXX"),
            })
            .await
            .unwrap_err();

        let paths: Vec<_> = err.violations().iter().map(|v| v.property_path.as_str()).collect();
        assert_eq!(paths, vec!["purchaseCode", "arrivalAirport"]);
    }

    #[tokio::test]
    async fn updates_unknown_claim_as_not_found() {
        let api = InMemoryClaimApi::new();
        let err = api
            .update_flight_details(
                "missing",
                FlightDetailsPayload {
                    informed: "a".to_string(),
                    delayed: "b".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn injected_failures_apply_until_cleared() {
        let api = InMemoryClaimApi::new();
        api.fail_with(operations::LIST_COUNTRIES, 503, Vec::new());
        assert!(api.list_countries(ListQuery::first_page(10)).await.is_err());
        api.clear_failures();
        assert!(api.list_countries(ListQuery::first_page(10)).await.is_ok());
        assert_eq!(api.call_count(operations::LIST_COUNTRIES), 2);
    }
}

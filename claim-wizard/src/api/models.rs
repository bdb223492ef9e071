use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AirportCode {
    pub iata: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airport {
    pub id: String,
    pub title: String,
    pub code: AirportCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub id: String,
    pub name: String,
    pub phone_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListMeta {
    pub current_page: u32,
    pub items_per_page: u32,
    #[serde(default)]
    pub total_items: u64,
}

/// One page of a paginated list resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPage<T> {
    pub data: Vec<T>,
    pub meta: ListMeta,
}

/// Query parameters accepted by the list endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub items_per_page: u32,
    pub page: Option<u32>,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn first_page(items_per_page: u32) -> Self {
        Self {
            items_per_page,
            page: None,
            search: None,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("itemsPerPage", self.items_per_page.to_string())];
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DestinationPayload {
    pub departure_airport: String,
    pub departure_airport_iata_code: String,
    pub arrival_airport: String,
    pub arrival_airport_iata_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClaimRequest {
    pub purchase_code: String,
    pub destination: DestinationPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimCreated {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DisruptionPayload {
    pub user_reason: String,
    pub airline_reason: String,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FlightDetailsPayload {
    pub informed: String,
    pub delayed: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactPayload {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub country_code: String,
    pub phone_number: String,
    pub phone_code: String,
}

/// Claim record as returned by `GET /claims/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ClaimEntity {
    pub id: String,
    pub contact: ContactPayload,
    pub destination: DestinationPayload,
    pub disruption: DisruptionPayload,
    pub flight_details: FlightDetailsPayload,
    pub purchase_code: String,
    pub state: String,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_emits_expected_parameters() {
        let query = ListQuery::first_page(10).with_search("Lon");
        assert_eq!(
            query.to_query_pairs(),
            vec![("itemsPerPage", "10".to_string()), ("search", "Lon".to_string())]
        );

        let query = ListQuery::first_page(10).with_page(3);
        assert_eq!(
            query.to_query_pairs(),
            vec![("itemsPerPage", "10".to_string()), ("page", "3".to_string())]
        );
    }

    #[test]
    fn claim_entity_tolerates_partial_documents() {
        let entity: ClaimEntity = serde_json::from_str(
            r#"{"id":"c1","purchaseCode":"AB12CD34","destination":{"departureAirportIataCode":"VNO"}}"#,
        )
        .unwrap();
        assert_eq!(entity.purchase_code, "AB12CD34");
        assert_eq!(entity.destination.departure_airport_iata_code, "VNO");
        assert!(entity.contact.email.is_empty());
    }
}

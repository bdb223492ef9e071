//! Per-session typeahead loaders for the airport and country pickers.

use claim_wizard::{
    AirportList, ClaimApi,
    api::Airport, CountryList, Typeahead, TypeaheadConfig,
    typeahead::ListSource,
};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupList {
    Airports,
    Countries,
}

impl FromStr for LookupList {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "airports" => Ok(LookupList::Airports),
            "countries" => Ok(LookupList::Countries),
            other => Err(format!("unknown lookup list: {other}")),
        }
    }
}

pub struct SessionLookups {
    airports: Typeahead<AirportList>,
    countries: Typeahead<CountryList>,
}

impl SessionLookups {
    pub fn new(api: Arc<dyn ClaimApi>, config: TypeaheadConfig) -> Self {
        Self {
            airports: Typeahead::new(AirportList::new(api.clone()), config.clone()),
            countries: Typeahead::new(CountryList::new(api), config),
        }
    }

    /// Use an airport page the wizard already fetched instead of loading it again
    pub async fn seed_airports(&self, airports: Vec<Airport>) {
        self.airports.seed(airports).await;
    }

    pub async fn input(&self, list: LookupList, text: String) -> Value {
        match list {
            LookupList::Airports => input(&self.airports, text).await,
            LookupList::Countries => input(&self.countries, text).await,
        }
    }

    pub async fn load_more(&self, list: LookupList) -> Value {
        match list {
            LookupList::Airports => load_more(&self.airports).await,
            LookupList::Countries => load_more(&self.countries).await,
        }
    }

    pub async fn snapshot(&self, list: LookupList) -> Value {
        match list {
            LookupList::Airports => snapshot(&self.airports).await,
            LookupList::Countries => snapshot(&self.countries).await,
        }
    }
}

/// First access loads page one
async fn ensure_mounted<S: ListSource>(typeahead: &Typeahead<S>) {
    if typeahead.snapshot().await.current_page == 0 {
        if let Err(e) = typeahead.mount().await {
            warn!(error = %e, "Failed to load lookup list");
        }
    }
}

async fn input<S: ListSource>(typeahead: &Typeahead<S>, text: String) -> Value {
    ensure_mounted(typeahead).await;
    typeahead.input(text).await;
    snapshot(typeahead).await
}

async fn load_more<S: ListSource>(typeahead: &Typeahead<S>) -> Value {
    ensure_mounted(typeahead).await;
    if let Err(e) = typeahead.load_more().await {
        warn!(error = %e, "Failed to load more lookup items");
    }
    snapshot(typeahead).await
}

async fn snapshot<S: ListSource>(typeahead: &Typeahead<S>) -> Value {
    ensure_mounted(typeahead).await;
    serde_json::to_value(typeahead.snapshot().await).unwrap_or(Value::Null)
}

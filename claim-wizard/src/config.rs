use std::{env, fmt::Display, str::FromStr, sync::Arc, time::Duration};

use tracing::{info, warn};

use crate::{
    api::{ClaimApi, HttpClaimApi, InMemoryClaimApi},
    error::{Result, WizardError},
    i18n::Locale,
    typeahead::TypeaheadConfig,
};

pub mod env_keys {
    pub const CLAIM_API_URL: &str = "CLAIM_API_URL";
    pub const WIZARD_LOCALE: &str = "WIZARD_LOCALE";
    pub const ITEMS_PER_PAGE: &str = "ITEMS_PER_PAGE";
    pub const TYPEAHEAD_DEBOUNCE_MS: &str = "TYPEAHEAD_DEBOUNCE_MS";
    pub const TYPEAHEAD_CANCEL_STALE: &str = "TYPEAHEAD_CANCEL_STALE";
    pub const HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";
    pub const PORT: &str = "PORT";
}

#[derive(Debug, Clone)]
pub struct WizardConfig {
    /// Claims backend base URL; `None` runs against the in-memory backend
    pub claim_api_url: Option<String>,
    pub locale: Locale,
    pub items_per_page: u32,
    pub debounce: Duration,
    pub cancel_stale_searches: bool,
    pub http_timeout: Duration,
    pub port: u16,
}

impl WizardConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from any key lookup; `from_env` passes the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let claim_api_url = lookup(env_keys::CLAIM_API_URL).filter(|url| !url.trim().is_empty());
        if claim_api_url.is_none() {
            warn!("{} not set, using in-memory claims backend", env_keys::CLAIM_API_URL);
        }

        let items_per_page: u32 = try_load(&lookup, env_keys::ITEMS_PER_PAGE, "10")?;
        if items_per_page == 0 {
            return Err(WizardError::Config(format!(
                "{} must be positive",
                env_keys::ITEMS_PER_PAGE
            )));
        }

        Ok(Self {
            claim_api_url,
            locale: try_load(&lookup, env_keys::WIZARD_LOCALE, "en")?,
            items_per_page,
            debounce: Duration::from_millis(try_load(&lookup, env_keys::TYPEAHEAD_DEBOUNCE_MS, "500")?),
            cancel_stale_searches: load_flag(&lookup, env_keys::TYPEAHEAD_CANCEL_STALE)?,
            http_timeout: Duration::from_secs(try_load(&lookup, env_keys::HTTP_TIMEOUT_SECS, "30")?),
            port: try_load(&lookup, env_keys::PORT, "3000")?,
        })
    }

    pub fn typeahead(&self) -> TypeaheadConfig {
        TypeaheadConfig {
            items_per_page: self.items_per_page,
            debounce: self.debounce,
            cancel_stale_searches: self.cancel_stale_searches,
            locale: self.locale,
        }
    }

    pub fn build_api(&self) -> Result<Arc<dyn ClaimApi>> {
        match &self.claim_api_url {
            Some(url) => {
                info!(%url, "Using HTTP claims backend");
                Ok(Arc::new(HttpClaimApi::new(url, self.http_timeout)?))
            }
            None => Ok(Arc::new(InMemoryClaimApi::new())),
        }
    }
}

fn try_load<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .trim()
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            WizardError::Config(format!("invalid {key}: {e}"))
        })
}

fn load_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<bool> {
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("0") | Some("false") | Some("no") => Ok(false),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some(other) => Err(WizardError::Config(format!("invalid {key}: {other}"))),
    }
}

//! Translate backend validation failures into what a form can display.
//!
//! A failed request carries a list of [`Violation`]s. Those whose property path
//! names one of the form's fields are shown inline next to that field; the rest
//! end up in a global banner. Messages are localised by violation code when a
//! translation exists and otherwise passed through as the backend wrote them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::api::ApiError;
use crate::i18n::{self, Locale};

/// Key used for the banner message when the failure carried no violations
pub const GENERAL_ERROR_KEY: &str = "general";

/// One structured validation failure from the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    #[serde(default)]
    pub property_path: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// Field-keyed errors for inline display, and everything else for the banner
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolvedErrors {
    pub form_errors: Option<BTreeMap<String, String>>,
    pub global_errors: Option<BTreeMap<String, String>>,
}

impl ResolvedErrors {
    pub fn from_form_errors(form_errors: BTreeMap<String, String>) -> Self {
        Self {
            form_errors: (!form_errors.is_empty()).then_some(form_errors),
            global_errors: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.form_errors.is_none() && self.global_errors.is_none()
    }
}

fn localise(violation: &Violation, locale: Locale) -> String {
    violation
        .code
        .as_deref()
        .and_then(|code| i18n::lookup(locale, &format!("api.error.{code}")))
        .map(str::to_string)
        .or_else(|| (!violation.message.is_empty()).then(|| violation.message.clone()))
        .unwrap_or_else(|| i18n::translate(locale, "api.error.unknown"))
}

/// Split `violations` into field errors (for `fields`) and global errors.
///
/// Without any violations at all, a single generic global error is returned so
/// the banner always has something to say.
pub fn resolve_api_errors(violations: &[Violation], fields: &[&str], locale: Locale) -> ResolvedErrors {
    if violations.is_empty() {
        return ResolvedErrors {
            form_errors: None,
            global_errors: Some(BTreeMap::from([(
                GENERAL_ERROR_KEY.to_string(),
                i18n::translate(locale, "api.error.unknown"),
            )])),
        };
    }

    let mut form_errors = BTreeMap::new();
    let mut global_errors = BTreeMap::new();

    for (i, violation) in violations.iter().enumerate() {
        let message = localise(violation, locale);
        let path = violation.property_path.as_str();
        if fields.contains(&path) {
            // first violation per field wins, like a form library shows one message
            form_errors.entry(path.to_string()).or_insert(message);
        } else {
            let key = if path.is_empty() {
                format!("{GENERAL_ERROR_KEY}.{i}")
            } else {
                path.to_string()
            };
            global_errors.insert(key, message);
        }
    }

    ResolvedErrors {
        form_errors: (!form_errors.is_empty()).then_some(form_errors),
        global_errors: (!global_errors.is_empty()).then_some(global_errors),
    }
}

/// Resolve an [`ApiError`] for display; a 404 gets its own banner message
pub fn resolve_error(error: &ApiError, fields: &[&str], locale: Locale) -> ResolvedErrors {
    if error.is_not_found() && error.violations().is_empty() {
        return ResolvedErrors {
            form_errors: None,
            global_errors: Some(BTreeMap::from([(
                GENERAL_ERROR_KEY.to_string(),
                i18n::translate(locale, "api.error.not.found"),
            )])),
        };
    }
    resolve_api_errors(error.violations(), fields, locale)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(path: &str, code: Option<&str>, message: &str) -> Violation {
        Violation {
            property_path: path.to_string(),
            message: message.to_string(),
            code: code.map(str::to_string),
        }
    }

    #[test]
    fn splits_field_and_global_violations() {
        let violations = vec![
            v("purchaseCode", Some("invalid_length"), "bad length"),
            v("", None, "Claim is locked"),
            v("internalRef", None, "Duplicate reference"),
        ];

        let resolved = resolve_api_errors(&violations, &["purchaseCode", "departureAirport"], Locale::En);

        let form = resolved.form_errors.unwrap();
        assert_eq!(form.len(), 1);
        assert_eq!(form["purchaseCode"], "This value has an invalid length");

        let global = resolved.global_errors.unwrap();
        assert_eq!(global["general.1"], "Claim is locked");
        assert_eq!(global["internalRef"], "Duplicate reference");
    }

    #[test]
    fn localises_by_code_and_falls_back_to_backend_message() {
        let violations = vec![
            v("email", Some("invalid_email"), "not an email"),
            v("city", Some("city_unknown"), "City not served"),
        ];
        let resolved = resolve_api_errors(&violations, &["email", "city"], Locale::De);
        let form = resolved.form_errors.unwrap();
        assert_eq!(form["email"], "Dieser Wert ist keine gültige E-Mail-Adresse");
        assert_eq!(form["city"], "City not served");
        assert!(resolved.global_errors.is_none());
    }

    #[test]
    fn empty_violation_list_yields_generic_banner() {
        let resolved = resolve_api_errors(&[], &["email"], Locale::En);
        assert!(resolved.form_errors.is_none());
        assert_eq!(
            resolved.global_errors.unwrap()[GENERAL_ERROR_KEY],
            "Something went wrong. Please try again later"
        );
    }

    #[test]
    fn keeps_first_violation_per_field() {
        let violations = vec![
            v("email", None, "first"),
            v("email", None, "second"),
        ];
        let resolved = resolve_api_errors(&violations, &["email"], Locale::En);
        assert_eq!(resolved.form_errors.unwrap()["email"], "first");
    }
}

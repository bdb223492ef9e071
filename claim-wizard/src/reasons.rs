use serde::Serialize;

use crate::i18n::{self, Locale};

/// A selectable answer: stable id plus the message id of its display text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReasonOption {
    pub id: &'static str,
    pub message_id: &'static str,
    pub icon: Option<&'static str>,
}

impl ReasonOption {
    const fn new(id: &'static str, message_id: &'static str) -> Self {
        Self {
            id,
            message_id,
            icon: None,
        }
    }

    const fn with_icon(id: &'static str, message_id: &'static str, icon: &'static str) -> Self {
        Self {
            id,
            message_id,
            icon: Some(icon),
        }
    }

    pub fn text(&self, locale: Locale) -> String {
        i18n::translate(locale, self.message_id)
    }
}

pub const USER_DISRUPTION_REASONS: &[ReasonOption] = &[
    ReasonOption::new("1", "claim.form.disruption.what.flight.delay"),
    ReasonOption::new("2", "claim.form.disruption.what.flight.cancelled"),
    ReasonOption::new("3", "claim.form.disruption.what.flight.denied.boarding"),
    ReasonOption::new("4", "claim.form.disruption.what.flight.something.else"),
];

pub const AIRLINE_DISRUPTION_REASONS: &[ReasonOption] = &[
    ReasonOption::with_icon("1", "claim.form.disruption.airline.reason.technical", "construction"),
    ReasonOption::with_icon("2", "claim.form.disruption.airline.reason.weather", "thunderstorm"),
    ReasonOption::with_icon("3", "claim.form.disruption.airline.reason.strike", "campaign"),
    ReasonOption::with_icon("4", "claim.form.disruption.airline.reason.airport", "connecting_airports"),
    ReasonOption::with_icon("5", "claim.form.disruption.airline.reason.other", "pending"),
];

pub const INFORMED_REASONS: &[ReasonOption] = &[
    ReasonOption::new("1", "claim.form.additional.information.when.informed.less.than.24"),
    ReasonOption::new("2", "claim.form.additional.information.when.informed.up.to.14.d"),
    ReasonOption::new("3", "claim.form.additional.information.when.informed.more.than.14.d"),
];

pub const DELAYED_REASONS: &[ReasonOption] = &[
    ReasonOption::new("1", "claim.form.additional.information.fly.late.time.less.than.2.h"),
    ReasonOption::new("2", "claim.form.additional.information.fly.late.time.2.3.h"),
    ReasonOption::new("3", "claim.form.additional.information.fly.late.time.more.than.3.h"),
    ReasonOption::new("4", "claim.form.additional.information.fly.late.time.missed.connecting"),
    ReasonOption::new("5", "claim.form.additional.information.fly.late.time.never.arrived"),
];

pub fn option_by_id<'a>(options: &'a [ReasonOption], id: &str) -> Option<&'a ReasonOption> {
    options.iter().find(|option| option.id == id)
}

/// Localised display text for an option id; empty when the id is unknown
pub fn option_text(options: &[ReasonOption], id: &str, locale: Locale) -> String {
    option_by_id(options, id)
        .map(|option| option.text(locale))
        .unwrap_or_default()
}

/// Recover an option id from the display text the backend stored.
///
/// The backend keeps only the localised text, so this is an equality match on
/// that text in the current locale. Text stored under another locale, or after
/// a translation change, no longer matches and yields `None`.
pub fn option_id_by_text(options: &[ReasonOption], text: &str, locale: Locale) -> Option<String> {
    options
        .iter()
        .find(|option| option.text(locale) == text)
        .map(|option| option.id.to_string())
}

/// Option rendered for a front end
#[derive(Debug, Clone, Serialize)]
pub struct RenderedOption {
    pub id: &'static str,
    pub reason: String,
    pub icon: Option<&'static str>,
}

pub fn render_options(options: &[ReasonOption], locale: Locale) -> Vec<RenderedOption> {
    options
        .iter()
        .map(|option| RenderedOption {
            id: option.id,
            reason: option.text(locale),
            icon: option.icon,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_lookup_matches_display_text_in_same_locale() {
        let text = option_text(DELAYED_REASONS, "3", Locale::En);
        assert_eq!(text, "More than 3 hours");
        assert_eq!(
            option_id_by_text(DELAYED_REASONS, &text, Locale::En),
            Some("3".to_string())
        );
    }

    #[test]
    fn reverse_lookup_fails_across_locales() {
        let stored = option_text(USER_DISRUPTION_REASONS, "2", Locale::De);
        assert_eq!(option_id_by_text(USER_DISRUPTION_REASONS, &stored, Locale::En), None);
    }

    #[test]
    fn unknown_id_renders_as_empty_text() {
        assert_eq!(option_text(INFORMED_REASONS, "9", Locale::En), "");
    }

    #[test]
    fn airline_reasons_carry_icons() {
        assert!(AIRLINE_DISRUPTION_REASONS.iter().all(|o| o.icon.is_some()));
        assert!(USER_DISRUPTION_REASONS.iter().all(|o| o.icon.is_none()));
    }
}

//! Client-side validation for each step's form.
//!
//! Every validator returns field-keyed, localised messages; an empty map means
//! the form may be submitted.

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::{
    i18n::{self, Locale},
    state::{AdditionalInformationState, ContactState, DestinationState, DisruptionReasonState},
};

pub type FieldErrors = BTreeMap<String, String>;

pub const PURCHASE_CODE_LENGTH: usize = 8;
pub const BIRTH_DATE_FORMAT: &str = "%Y-%m-%d";

pub mod fields {
    pub const PURCHASE_CODE: &str = "purchaseCode";
    pub const DEPARTURE_AIRPORT: &str = "departureAirport";
    pub const ARRIVAL_AIRPORT: &str = "arrivalAirport";

    pub const USER_REASON: &str = "userReason";
    pub const AIRLINE_REASON: &str = "airlineReason";
    pub const DETAILS: &str = "details";

    pub const INFORMED: &str = "informed";
    pub const DELAYED: &str = "delayed";

    pub const FIRST_NAME: &str = "firstName";
    pub const LAST_NAME: &str = "lastName";
    pub const BIRTH_DATE: &str = "birthDate";
    pub const EMAIL: &str = "email";
    pub const REPEAT_EMAIL: &str = "repeatEmail";
    pub const ADDRESS: &str = "address";
    pub const CITY: &str = "city";
    pub const COUNTRY: &str = "country";
    pub const PHONE_NUMBER: &str = "phoneNumber";
    pub const PHONE_CODE: &str = "phoneCode";

    pub const DESTINATION: &[&str] = &[PURCHASE_CODE, DEPARTURE_AIRPORT, ARRIVAL_AIRPORT];
    pub const DISRUPTION_REASON: &[&str] = &[USER_REASON, AIRLINE_REASON, DETAILS];
    pub const ADDITIONAL_INFORMATION: &[&str] = &[INFORMED, DELAYED];
    pub const CONTACT: &[&str] = &[
        FIRST_NAME,
        LAST_NAME,
        BIRTH_DATE,
        EMAIL,
        REPEAT_EMAIL,
        ADDRESS,
        CITY,
        COUNTRY,
        PHONE_NUMBER,
        PHONE_CODE,
    ];
}

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Accepts a plain date or an RFC 3339 timestamp, as date pickers produce either
pub fn parse_birth_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, BIRTH_DATE_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// Birth date in the wire format the backend expects
pub fn format_birth_date(value: &str) -> Option<String> {
    parse_birth_date(value).map(|date| date.format(BIRTH_DATE_FORMAT).to_string())
}

struct Validator {
    locale: Locale,
    errors: FieldErrors,
}

impl Validator {
    fn new(locale: Locale) -> Self {
        Self {
            locale,
            errors: FieldErrors::new(),
        }
    }

    fn fail(&mut self, field: &str, message_id: &str) {
        if !self.errors.contains_key(field) {
            self.errors
                .insert(field.to_string(), i18n::translate(self.locale, message_id));
        }
    }

    fn required(&mut self, field: &str, present: bool) -> &mut Self {
        if !present {
            self.fail(field, "form.field.required");
        }
        self
    }

    fn required_text(&mut self, field: &str, value: &str) -> &mut Self {
        self.required(field, !value.trim().is_empty())
    }

    fn check(&mut self, field: &str, ok: bool, message_id: &str) -> &mut Self {
        if !ok {
            self.fail(field, message_id);
        }
        self
    }

    fn finish(self) -> FieldErrors {
        self.errors
    }
}

pub fn validate_destination(form: &DestinationState, locale: Locale) -> FieldErrors {
    let mut v = Validator::new(locale);
    let purchase_code = form.purchase_code.as_deref().unwrap_or_default();
    v.required_text(fields::PURCHASE_CODE, purchase_code);
    if !purchase_code.trim().is_empty() {
        v.check(
            fields::PURCHASE_CODE,
            purchase_code.chars().count() == PURCHASE_CODE_LENGTH,
            "claim.form.purchase.code.length",
        );
    }
    v.required(fields::DEPARTURE_AIRPORT, form.departure_airport.is_some())
        .required(fields::ARRIVAL_AIRPORT, form.arrival_airport.is_some());
    v.finish()
}

pub fn validate_disruption_reason(form: &DisruptionReasonState, locale: Locale) -> FieldErrors {
    let mut v = Validator::new(locale);
    v.required(fields::USER_REASON, form.user_reason.as_deref().is_some_and(|r| !r.is_empty()))
        .required(
            fields::AIRLINE_REASON,
            form.airline_reason.as_deref().is_some_and(|r| !r.is_empty()),
        );
    v.finish()
}

pub fn validate_additional_information(form: &AdditionalInformationState, locale: Locale) -> FieldErrors {
    let mut v = Validator::new(locale);
    v.required(fields::INFORMED, form.informed.as_deref().is_some_and(|r| !r.is_empty()))
        .required(fields::DELAYED, form.delayed.as_deref().is_some_and(|r| !r.is_empty()));
    v.finish()
}

pub fn validate_contact(form: &ContactState, locale: Locale) -> FieldErrors {
    let mut v = Validator::new(locale);
    let birth_date = form.birth_date.as_deref().unwrap_or_default();

    v.required_text(fields::FIRST_NAME, &form.first_name)
        .required_text(fields::LAST_NAME, &form.last_name)
        .required_text(fields::BIRTH_DATE, birth_date)
        .required_text(fields::EMAIL, &form.email)
        .required_text(fields::REPEAT_EMAIL, &form.repeat_email)
        .required_text(fields::ADDRESS, &form.address)
        .required_text(fields::CITY, &form.city)
        .required(fields::COUNTRY, form.country.is_some())
        .required(fields::PHONE_CODE, form.phone_code.is_some())
        .required_text(fields::PHONE_NUMBER, &form.phone_number);

    if !birth_date.trim().is_empty() {
        v.check(fields::BIRTH_DATE, parse_birth_date(birth_date).is_some(), "form.field.date");
    }
    if !form.email.is_empty() {
        v.check(fields::EMAIL, is_valid_email(&form.email), "form.field.email");
    }
    if !form.repeat_email.is_empty() {
        v.check(fields::REPEAT_EMAIL, is_valid_email(&form.repeat_email), "form.field.email")
            .check(
                fields::REPEAT_EMAIL,
                form.repeat_email == form.email,
                "claim.form.email.fields.should.match",
            );
    }
    v.finish()
}

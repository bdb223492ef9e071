use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Locales the wizard ships translations for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    De,
}

impl Locale {
    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::De => "de",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lang = s.split(['-', '_']).next().unwrap_or_default();
        match lang.to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "de" => Ok(Locale::De),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

type Catalogue = HashMap<&'static str, &'static str>;

static EN: LazyLock<Catalogue> = LazyLock::new(|| {
    HashMap::from([
        ("form.field.required", "This field is required"),
        ("form.field.email", "Enter a valid email address"),
        ("form.field.date", "Enter a valid date"),
        ("claim.form.purchase.code.length", "The purchase code must be exactly 8 characters"),
        ("claim.form.email.fields.should.match", "Email addresses should match"),
        ("claim.form.wizard.navigation.destination", "Destination"),
        ("claim.form.wizard.navigation.disruption", "Disruption"),
        ("claim.form.wizard.navigation.additional.info", "Additional info"),
        ("claim.form.wizard.navigation.contact", "Contact"),
        ("claim.form.disruption.what.flight.delay", "My flight was delayed"),
        ("claim.form.disruption.what.flight.cancelled", "My flight was cancelled"),
        ("claim.form.disruption.what.flight.denied.boarding", "I was denied boarding"),
        ("claim.form.disruption.what.flight.something.else", "Something else"),
        ("claim.form.disruption.airline.reason.technical", "Technical problems"),
        ("claim.form.disruption.airline.reason.weather", "Bad weather"),
        ("claim.form.disruption.airline.reason.strike", "Strike"),
        ("claim.form.disruption.airline.reason.airport", "Airport issues"),
        ("claim.form.disruption.airline.reason.other", "Other or not stated"),
        ("claim.form.additional.information.when.informed.less.than.24", "Less than 24 hours before departure"),
        ("claim.form.additional.information.when.informed.up.to.14.d", "Up to 14 days before departure"),
        ("claim.form.additional.information.when.informed.more.than.14.d", "More than 14 days before departure"),
        ("claim.form.additional.information.fly.late.time.less.than.2.h", "Less than 2 hours"),
        ("claim.form.additional.information.fly.late.time.2.3.h", "Between 2 and 3 hours"),
        ("claim.form.additional.information.fly.late.time.more.than.3.h", "More than 3 hours"),
        ("claim.form.additional.information.fly.late.time.missed.connecting", "I missed a connecting flight"),
        ("claim.form.additional.information.fly.late.time.never.arrived", "I never arrived"),
        ("claim.form.continue.button", "Continue"),
        ("claim.form.complete.button", "Complete"),
        ("claim.form.back.button", "Back"),
        ("api.error.unknown", "Something went wrong. Please try again later"),
        ("api.error.not.found", "The claim could not be found"),
        ("api.error.not_blank", "This value should not be blank"),
        ("api.error.invalid_length", "This value has an invalid length"),
        ("api.error.invalid_email", "This value is not a valid email address"),
        ("api.error.invalid_airport", "Unknown airport"),
    ])
});

static DE: LazyLock<Catalogue> = LazyLock::new(|| {
    HashMap::from([
        ("form.field.required", "Dieses Feld ist erforderlich"),
        ("form.field.email", "Bitte eine gültige E-Mail-Adresse eingeben"),
        ("form.field.date", "Bitte ein gültiges Datum eingeben"),
        ("claim.form.purchase.code.length", "Der Buchungscode muss genau 8 Zeichen lang sein"),
        ("claim.form.email.fields.should.match", "Die E-Mail-Adressen müssen übereinstimmen"),
        ("claim.form.wizard.navigation.destination", "Reiseziel"),
        ("claim.form.wizard.navigation.disruption", "Störung"),
        ("claim.form.wizard.navigation.additional.info", "Weitere Angaben"),
        ("claim.form.wizard.navigation.contact", "Kontakt"),
        ("claim.form.disruption.what.flight.delay", "Mein Flug war verspätet"),
        ("claim.form.disruption.what.flight.cancelled", "Mein Flug wurde annulliert"),
        ("claim.form.disruption.what.flight.denied.boarding", "Mir wurde die Beförderung verweigert"),
        ("claim.form.disruption.what.flight.something.else", "Etwas anderes"),
        ("claim.form.disruption.airline.reason.technical", "Technische Probleme"),
        ("claim.form.disruption.airline.reason.weather", "Schlechtes Wetter"),
        ("claim.form.disruption.airline.reason.strike", "Streik"),
        ("claim.form.disruption.airline.reason.airport", "Probleme am Flughafen"),
        ("claim.form.disruption.airline.reason.other", "Sonstiges oder nicht angegeben"),
        ("claim.form.additional.information.when.informed.less.than.24", "Weniger als 24 Stunden vor Abflug"),
        ("claim.form.additional.information.when.informed.up.to.14.d", "Bis zu 14 Tage vor Abflug"),
        ("claim.form.additional.information.when.informed.more.than.14.d", "Mehr als 14 Tage vor Abflug"),
        ("claim.form.additional.information.fly.late.time.less.than.2.h", "Weniger als 2 Stunden"),
        ("claim.form.additional.information.fly.late.time.2.3.h", "Zwischen 2 und 3 Stunden"),
        ("claim.form.additional.information.fly.late.time.more.than.3.h", "Mehr als 3 Stunden"),
        ("claim.form.additional.information.fly.late.time.missed.connecting", "Ich habe einen Anschlussflug verpasst"),
        ("claim.form.additional.information.fly.late.time.never.arrived", "Ich bin nie angekommen"),
        ("claim.form.continue.button", "Weiter"),
        ("claim.form.complete.button", "Abschließen"),
        ("claim.form.back.button", "Zurück"),
        ("api.error.unknown", "Etwas ist schiefgelaufen. Bitte später erneut versuchen"),
        ("api.error.not.found", "Der Antrag wurde nicht gefunden"),
        ("api.error.not_blank", "Dieser Wert darf nicht leer sein"),
        ("api.error.invalid_length", "Dieser Wert hat eine ungültige Länge"),
        ("api.error.invalid_email", "Dieser Wert ist keine gültige E-Mail-Adresse"),
    ])
});

fn catalogue(locale: Locale) -> &'static Catalogue {
    match locale {
        Locale::En => &EN,
        Locale::De => &DE,
    }
}

/// Look up a message without any fallback
pub fn lookup(locale: Locale, id: &str) -> Option<&'static str> {
    catalogue(locale).get(id).copied()
}

/// Resolve a message id, falling back to English and then to the id itself
pub fn translate(locale: Locale, id: &str) -> String {
    lookup(locale, id)
        .or_else(|| lookup(Locale::En, id))
        .map(str::to_string)
        .unwrap_or_else(|| id.to_string())
}

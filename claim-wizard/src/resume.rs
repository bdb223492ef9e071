//! Rebuild wizard state from an existing claim, for deep links carrying `?id=`.

use tracing::{info, warn};

use crate::{
    api::{Airport, ApiError, ClaimApi, ClaimEntity, ListQuery},
    context::Context,
    error::Result,
    i18n::Locale,
    reasons::{
        AIRLINE_DISRUPTION_REASONS, DELAYED_REASONS, INFORMED_REASONS, USER_DISRUPTION_REASONS,
        option_id_by_text,
    },
    state::{
        self, AdditionalInformationState, ContactState, CountryOption, DestinationState,
        DisruptionReasonState, PhoneCodeOption,
    },
    violations::{ResolvedErrors, resolve_error},
};

#[derive(Debug, Clone)]
pub enum ResumeOutcome {
    /// State hydrated; `airports` is the first page of the airport list
    Loaded { airports: Vec<Airport> },
    /// The claim does not exist; the stored claim id has been dropped
    NotFound(ResolvedErrors),
    Failed(ResolvedErrors),
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

async fn hydrate(context: &Context, entity: &ClaimEntity, locale: Locale) -> Result<()> {
    let disruption = DisruptionReasonState {
        user_reason: option_id_by_text(USER_DISRUPTION_REASONS, &entity.disruption.user_reason, locale),
        airline_reason: option_id_by_text(
            AIRLINE_DISRUPTION_REASONS,
            &entity.disruption.airline_reason,
            locale,
        ),
        details: entity.disruption.details.clone(),
    };
    state::set_slice(context, &disruption).await?;

    let additional = AdditionalInformationState {
        informed: option_id_by_text(INFORMED_REASONS, &entity.flight_details.informed, locale),
        delayed: option_id_by_text(DELAYED_REASONS, &entity.flight_details.delayed, locale),
    };
    state::set_slice(context, &additional).await?;

    let mut destination: DestinationState = state::slice(context).await;
    destination.purchase_code = non_empty(&entity.purchase_code);
    state::set_slice(context, &destination).await?;

    let contact = &entity.contact;
    let country = (!contact.country_code.is_empty() || !contact.country.is_empty()).then(|| {
        CountryOption {
            id: contact.country_code.clone(),
            name: contact.country.clone(),
        }
    });
    let phone_code = non_empty(&contact.phone_code).map(|code| PhoneCodeOption {
        id: code.clone(),
        name: contact.country.clone(),
        phone_code: code,
    });
    let contact_state = ContactState {
        first_name: contact.first_name.clone(),
        last_name: contact.last_name.clone(),
        birth_date: non_empty(&contact.birth_date),
        email: contact.email.clone(),
        repeat_email: contact.email.clone(),
        address: contact.address.clone(),
        city: contact.city.clone(),
        country,
        phone_code,
        phone_number: contact.phone_number.clone(),
    };
    state::set_slice(context, &contact_state).await
}

async fn find_airport(api: &dyn ClaimApi, iata: &str, items_per_page: u32) -> std::result::Result<Option<Airport>, ApiError> {
    let page = api
        .list_airports(ListQuery::first_page(items_per_page).with_search(iata))
        .await?;
    Ok(page.data.into_iter().next())
}

/// Load `claim_id` and the airport list concurrently, then hydrate every slice.
///
/// A missing claim clears the stored claim id so the wizard starts over; any
/// other failure is reported as global errors and leaves state as it was.
pub async fn initialize_claim_entity(
    api: &dyn ClaimApi,
    context: &Context,
    claim_id: &str,
    items_per_page: u32,
) -> Result<ResumeOutcome> {
    let locale = state::locale(context).await;
    info!(%claim_id, "Resuming claim");

    let loaded = tokio::try_join!(
        api.get_claim(claim_id),
        api.list_airports(ListQuery::first_page(items_per_page)),
    );
    let (entity, airports) = match loaded {
        Ok(loaded) => loaded,
        Err(e) if e.is_not_found() => {
            warn!(%claim_id, "Claim not found, starting over");
            state::set_claim_id(context, None).await?;
            return Ok(ResumeOutcome::NotFound(resolve_error(&e, &[], locale)));
        }
        Err(e) => {
            warn!(%claim_id, error = %e, "Failed to load claim");
            return Ok(ResumeOutcome::Failed(resolve_error(&e, &[], locale)));
        }
    };

    hydrate(context, &entity, locale).await?;
    state::set_claim_id(context, Some(claim_id.to_string())).await?;

    let destination = &entity.destination;
    if !destination.departure_airport_iata_code.is_empty()
        && !destination.arrival_airport_iata_code.is_empty()
    {
        let selected = tokio::try_join!(
            find_airport(api, &destination.departure_airport_iata_code, items_per_page),
            find_airport(api, &destination.arrival_airport_iata_code, items_per_page),
        );
        match selected {
            Ok((departure, arrival)) => {
                let mut form: DestinationState = state::slice(context).await;
                form.departure_airport = departure;
                form.arrival_airport = arrival;
                state::set_slice(context, &form).await?;
            }
            Err(e) => {
                warn!(%claim_id, error = %e, "Failed to look up selected airports");
                return Ok(ResumeOutcome::Failed(resolve_error(&e, &[], locale)));
            }
        }
    }

    Ok(ResumeOutcome::Loaded {
        airports: airports.data,
    })
}

use claim_wizard::api::memory::operations;
use claim_wizard::api::{Airport, ClaimApi, ListQuery};
use claim_wizard::state::{self, DestinationState};
use claim_wizard::{
    AirportList, ExecutionStatus, InMemoryClaimApi, Session, Step, Typeahead, TypeaheadConfig,
    Violation, Wizard, WizardBuilder,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

fn wizard() -> (Wizard, InMemoryClaimApi) {
    let api = InMemoryClaimApi::new();
    let wizard = WizardBuilder::new(Arc::new(api.clone()))
        .with_default_handlers()
        .build();
    (wizard, api)
}

async fn airport(api: &InMemoryClaimApi, iata: &str) -> Airport {
    let page = api
        .list_airports(ListQuery::first_page(10).with_search(iata))
        .await
        .unwrap();
    page.data.into_iter().next().unwrap()
}

async fn destination_form(api: &InMemoryClaimApi) -> Value {
    json!({
        "purchase_code": "AB12CD34",
        "departure_airport": airport(api, "VNO").await,
        "arrival_airport": airport(api, "LHR").await,
    })
}

fn contact_form(phone_number: &str) -> Value {
    json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "birth_date": "1990-02-03",
        "email": "ada@example.com",
        "repeat_email": "ada@example.com",
        "address": "Gedimino pr. 1",
        "city": "Vilnius",
        "country": { "id": "LT", "name": "Lithuania" },
        "phone_code": { "id": "LT", "name": "Lithuania", "phone_code": "+370" },
        "phone_number": phone_number,
    })
}

#[tokio::test]
async fn happy_path_walks_every_step_in_order() {
    let (wizard, api) = wizard();
    let mut session = Session::new("s1");

    wizard.enter(&mut session, "/claim-form/search").await.unwrap();
    wizard
        .update_form(&session, destination_form(&api).await)
        .await
        .unwrap();
    let result = wizard.submit(&mut session).await.unwrap();

    let claim_id = state::claim_id(&session.context).await.unwrap();
    assert_eq!(result.step, Some(Step::DisruptionReason));
    assert_eq!(
        result.location,
        format!("/claim-form/disruption-reason?id={claim_id}")
    );
    let progress = state::step_progress(&session.context).await.unwrap();
    assert_eq!(progress.len(), 1);
    assert_eq!(progress["search"], 0);

    wizard
        .update_form(
            &session,
            json!({ "user_reason": "1", "airline_reason": "2", "details": "Storm" }),
        )
        .await
        .unwrap();
    let result = wizard.submit(&mut session).await.unwrap();
    assert_eq!(result.step, Some(Step::AdditionalInformation));
    let progress = state::step_progress(&session.context).await.unwrap();
    assert_eq!(progress.len(), 2);
    assert_eq!(progress["disruption-reason"], 1);

    let stored = api.claim(&claim_id).unwrap();
    assert_eq!(stored.disruption.user_reason, "My flight was delayed");
    assert_eq!(stored.disruption.details, "Storm");

    wizard
        .update_form(&session, json!({ "informed": "1", "delayed": "3" }))
        .await
        .unwrap();
    let result = wizard.submit(&mut session).await.unwrap();
    assert_eq!(result.step, Some(Step::ContactInformation));

    wizard.update_form(&session, contact_form("")).await.unwrap();
    wizard
        .update_form(&session, contact_form("+37061234567"))
        .await
        .unwrap();
    let result = wizard.submit(&mut session).await.unwrap();
    assert_eq!(result.step, Some(Step::ClaimCompleted));
    assert_eq!(result.status, ExecutionStatus::Completed);

    let stored = api.claim(&claim_id).unwrap();
    assert_eq!(stored.state, "submitted");
    assert_eq!(stored.contact.phone_number, "+37061234567");
    assert_eq!(stored.contact.birth_date, "1990-02-03");
    assert_eq!(
        state::step_progress(&session.context).await.unwrap().len(),
        4
    );

    // leaving the confirmation page clears progress
    wizard.navigate(&mut session, Step::Search).await.unwrap();
    assert!(state::step_progress(&session.context).await.is_none());
}

#[tokio::test]
async fn steps_without_claim_redirect_to_search_without_calling_backend() {
    let forms = [
        (
            Step::DisruptionReason,
            json!({ "user_reason": "1", "airline_reason": "1" }),
        ),
        (
            Step::AdditionalInformation,
            json!({ "informed": "2", "delayed": "2" }),
        ),
        (Step::ContactInformation, contact_form("+37061234567")),
    ];

    for (step, form) in forms {
        let (wizard, api) = wizard();
        let mut session = Session::new("s1");
        wizard.navigate(&mut session, step).await.unwrap();
        wizard.update_form(&session, form).await.unwrap();

        let result = wizard.submit(&mut session).await.unwrap();

        assert_eq!(result.status, ExecutionStatus::RedirectedToSearch, "{step}");
        assert_eq!(result.location, "/claim-form/search");
        assert_eq!(api.total_calls(), 0, "{step}");
        let progress = state::step_progress(&session.context).await.unwrap();
        assert_eq!(progress.len(), 1);
        assert_eq!(progress["search"], 0);
    }
}

#[tokio::test]
async fn search_with_existing_claim_moves_on_without_creating_another() {
    let (wizard, api) = wizard();
    let mut session = Session::new("s1");
    wizard.enter(&mut session, "/claim-form/search").await.unwrap();
    wizard
        .update_form(&session, destination_form(&api).await)
        .await
        .unwrap();
    wizard.submit(&mut session).await.unwrap();

    wizard.back(&mut session).await.unwrap();
    assert_eq!(session.current_step(), Some(Step::Search));
    wizard.submit(&mut session).await.unwrap();

    assert_eq!(api.call_count(operations::CREATE_CLAIM), 1);
    assert_eq!(session.current_step(), Some(Step::DisruptionReason));
}

#[tokio::test]
async fn backend_violations_split_into_field_and_banner_errors() {
    let (wizard, api) = wizard();
    let mut session = Session::new("s1");
    wizard.enter(&mut session, "/claim-form/search").await.unwrap();
    wizard
        .update_form(&session, destination_form(&api).await)
        .await
        .unwrap();
    wizard.submit(&mut session).await.unwrap();

    api.fail_with(
        operations::UPDATE_DISRUPTION,
        422,
        vec![
            Violation {
                property_path: "airlineReason".to_string(),
                message: "Not accepted".to_string(),
                code: None,
            },
            Violation {
                property_path: String::new(),
                message: "Claim is locked".to_string(),
                code: None,
            },
        ],
    );
    wizard
        .update_form(
            &session,
            json!({ "user_reason": "1", "airline_reason": "5" }),
        )
        .await
        .unwrap();
    let result = wizard.submit(&mut session).await.unwrap();

    assert_eq!(result.step, Some(Step::DisruptionReason));
    let errors = result.errors.unwrap();
    assert_eq!(errors.form_errors.unwrap()["airlineReason"], "Not accepted");
    assert_eq!(errors.global_errors.unwrap()["general.1"], "Claim is locked");
    let progress = state::step_progress(&session.context).await.unwrap();
    assert!(!progress.contains_key("disruption-reason"));
}

#[tokio::test]
async fn unknown_claim_in_url_clears_id_and_starts_over() {
    let (wizard, api) = wizard();
    let mut session = Session::new("s1");

    let result = wizard
        .enter(&mut session, "/claim-form/disruption-reason?id=missing")
        .await
        .unwrap();

    assert_eq!(api.call_count(operations::GET_CLAIM), 1);
    assert_eq!(state::claim_id(&session.context).await, None);
    assert!(session.navigator.current().claim_id.is_none());
    assert_eq!(result.location, "/claim-form/search");
    assert!(result.errors.unwrap().global_errors.is_some());
}

#[tokio::test]
async fn deep_link_resumes_existing_claim() {
    let (wizard, api) = wizard();
    let mut first = Session::new("s1");
    wizard.enter(&mut first, "/claim-form/search").await.unwrap();
    wizard
        .update_form(&first, destination_form(&api).await)
        .await
        .unwrap();
    wizard.submit(&mut first).await.unwrap();
    let claim_id = state::claim_id(&first.context).await.unwrap();

    let mut second = Session::new("s2");
    let result = wizard
        .enter(
            &mut second,
            &format!("/claim-form/disruption-reason?id={claim_id}"),
        )
        .await
        .unwrap();

    assert_eq!(result.step, Some(Step::DisruptionReason));
    assert!(result.errors.is_none());
    assert_eq!(result.airports.as_ref().map(Vec::len), Some(10));
    let destination: DestinationState = state::slice(&second.context).await;
    assert_eq!(destination.purchase_code.as_deref(), Some("AB12CD34"));
    assert_eq!(destination.departure_airport.unwrap().code.iata, "VNO");

    // entering again with the same id does not refetch
    let result = wizard
        .enter(
            &mut second,
            &format!("/claim-form/additional-information?id={claim_id}"),
        )
        .await
        .unwrap();
    assert_eq!(api.call_count(operations::GET_CLAIM), 1);
    assert!(result.airports.is_none());
}

#[tokio::test]
async fn closing_on_confirmation_page_clears_progress() {
    let (wizard, _) = wizard();
    let mut session = Session::new("s1");
    state::record_step(&session.context, Step::ContactInformation)
        .await
        .unwrap();
    wizard
        .navigate(&mut session, Step::ClaimCompleted)
        .await
        .unwrap();

    wizard.close(&mut session).await;

    assert!(state::step_progress(&session.context).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn airport_typeahead_fetches_once_for_settled_input() {
    let api = InMemoryClaimApi::new();
    let typeahead = Typeahead::new(
        AirportList::new(Arc::new(api.clone())),
        TypeaheadConfig::default(),
    );

    for text in ["L", "Lo", "Lon"] {
        typeahead.input(text).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(api.call_count(operations::LIST_AIRPORTS), 1);
    let snapshot = typeahead.snapshot().await;
    assert_eq!(snapshot.search.as_deref(), Some("Lon"));
    assert!(
        snapshot
            .items
            .iter()
            .all(|a| a.title.to_lowercase().contains("lon"))
    );
}

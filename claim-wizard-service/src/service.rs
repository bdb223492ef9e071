use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::{Next, from_fn},
    response::Json,
    routing::{get, post, put},
};
use claim_wizard::{
    ClaimApi, ExecutionResult, ExecutionStatus, InMemorySessionStorage, Locale, Session,
    SessionStorage, Step, Wizard, WizardBuilder, WizardConfig, WizardError, WizardRunner,
    i18n,
    reasons::{self, RenderedOption},
    route::{self, navigation_items},
    state::{self, state_keys},
};
use dashmap::DashMap;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info, warn};
use uuid::Uuid;

use crate::{
    lookups::{LookupList, SessionLookups},
    models::{CreateSessionRequest, LookupInputRequest, NavigateRequest, SessionResponse},
};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "session_id": id
        })),
    )
}

fn conflict_error(message: &str) -> ApiError {
    (StatusCode::CONFLICT, Json(json!({ "error": message })))
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

fn wizard_error(e: WizardError, session_id: &str) -> ApiError {
    match &e {
        WizardError::SessionNotFound(_) => not_found_error("Session not found", session_id),
        WizardError::UnknownRoute(_) | WizardError::Serialization(_) => {
            bad_request_error(&e.to_string())
        }
        WizardError::FormLocked(_) => conflict_error(&e.to_string()),
        _ => {
            error!("Wizard operation failed for session {}: {}", session_id, e);
            internal_error("Wizard operation failed", &e.to_string())
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub session_storage: Arc<dyn SessionStorage>,
    pub wizard: Arc<Wizard>,
    pub runner: WizardRunner,
    pub lookups: Arc<DashMap<String, Arc<SessionLookups>>>,
    /// Serialises load, mutate and save of a single session
    pub session_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    pub config: Arc<WizardConfig>,
}

impl AppState {
    pub fn new(config: WizardConfig, api: Arc<dyn ClaimApi>) -> Self {
        let session_storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());
        let wizard = Arc::new(
            WizardBuilder::new(api)
                .with_default_handlers()
                .items_per_page(config.items_per_page)
                .build(),
        );
        let runner = WizardRunner::new(wizard.clone(), session_storage.clone());

        Self {
            session_storage,
            wizard,
            runner,
            lookups: Arc::new(DashMap::new()),
            session_locks: Arc::new(DashMap::new()),
            config: Arc::new(config),
        }
    }

    fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        self.session_locks
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }
}

pub fn create_app(config: WizardConfig) -> claim_wizard::Result<Router> {
    let api = config.build_api()?;
    Ok(build_router(AppState::new(config, api)))
}

/// Middleware to add correlation ID to all requests
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();
    let header = HeaderValue::from_str(&correlation_id).ok();

    if let Some(value) = &header {
        request.headers_mut().insert("x-correlation-id", value.clone());
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    let mut response = next.run(request).instrument(span).await;

    if let Some(value) = header {
        response.headers_mut().insert("x-correlation-id", value);
    }
    response
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/wizard/sessions", post(create_session))
        .route(
            "/wizard/sessions/{session_id}",
            get(get_session).delete(close_session),
        )
        .route("/wizard/sessions/{session_id}/form", put(update_form))
        .route("/wizard/sessions/{session_id}/submit", post(submit_step))
        .route("/wizard/sessions/{session_id}/navigate", post(navigate))
        .route("/wizard/sessions/{session_id}/back", post(go_back))
        .route(
            "/wizard/sessions/{session_id}/lookup/{list}",
            get(lookup_snapshot),
        )
        .route(
            "/wizard/sessions/{session_id}/lookup/{list}/input",
            post(lookup_input),
        )
        .route(
            "/wizard/sessions/{session_id}/lookup/{list}/more",
            post(lookup_more),
        )
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Claim Wizard Service",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /wizard/sessions": "Open a wizard session at a URL",
            "GET /wizard/sessions/{session_id}": "Current page, forms and errors",
            "PUT /wizard/sessions/{session_id}/form": "Replace the current step's form values",
            "POST /wizard/sessions/{session_id}/submit": "Submit the current step",
            "POST /wizard/sessions/{session_id}/navigate": "Jump to a step",
            "POST /wizard/sessions/{session_id}/back": "Go back one page",
            "DELETE /wizard/sessions/{session_id}": "Close the session",
            "GET /wizard/sessions/{session_id}/lookup/{list}": "Airport or country picker state",
            "POST /wizard/sessions/{session_id}/lookup/{list}/input": "Type into a picker",
            "POST /wizard/sessions/{session_id}/lookup/{list}/more": "Load the next picker page",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

fn step_options(step: Option<Step>, locale: Locale) -> BTreeMap<String, Vec<RenderedOption>> {
    let tables: Vec<(&str, &[reasons::ReasonOption])> = match step {
        Some(Step::DisruptionReason) => vec![
            ("userReason", reasons::USER_DISRUPTION_REASONS),
            ("airlineReason", reasons::AIRLINE_DISRUPTION_REASONS),
        ],
        Some(Step::AdditionalInformation) => vec![
            ("informed", reasons::INFORMED_REASONS),
            ("delayed", reasons::DELAYED_REASONS),
        ],
        _ => Vec::new(),
    };
    tables
        .into_iter()
        .map(|(field, options)| (field.to_string(), reasons::render_options(options, locale)))
        .collect()
}

async fn build_session_response(session: &Session, status: ExecutionStatus) -> SessionResponse {
    let context = &session.context;
    let locale = state::locale(context).await;
    let claim_id = state::claim_id(context).await;
    let step = session.current_step();

    let forms = context
        .snapshot()
        .into_iter()
        .filter(|(key, _)| {
            [
                state_keys::DESTINATION,
                state_keys::DISRUPTION_REASON,
                state_keys::ADDITIONAL_INFORMATION,
                state_keys::CONTACT,
            ]
            .contains(&key.as_str())
        })
        .collect();

    SessionResponse {
        session_id: session.id.clone(),
        status,
        location: session.navigator.current().to_url(),
        step,
        locale: locale.to_string(),
        progress: state::step_progress(context).await,
        errors: session.errors.clone(),
        status_message: session.status_message.clone(),
        back_visible: step.is_some_and(route::back_visible),
        continue_visible: step.is_some_and(route::continue_visible),
        continue_label: step
            .map(|s| i18n::translate(locale, route::continue_label_id(s)))
            .unwrap_or_default(),
        navigation: navigation_items(locale, step, claim_id.as_deref()),
        options: step_options(step, locale),
        forms,
        claim_id,
    }
}

fn status_of(session: &Session) -> ExecutionStatus {
    if session.current_step() == Some(Step::ClaimCompleted) {
        ExecutionStatus::Completed
    } else {
        ExecutionStatus::WaitingForInput
    }
}

async fn load_session(state: &AppState, session_id: &str) -> Result<Session, ApiError> {
    match state.session_storage.get(session_id).await {
        Ok(Some(session)) => Ok(session),
        Ok(None) => Err(not_found_error("Session not found", session_id)),
        Err(e) => {
            error!("Failed to load session {}: {}", session_id, e);
            Err(internal_error("Failed to load session", &e.to_string()))
        }
    }
}

async fn save_session(state: &AppState, session: Session) -> Result<(), ApiError> {
    state.session_storage.save(session).await.map_err(|e| {
        error!("Failed to save session: {}", e);
        internal_error("Failed to save session", &e.to_string())
    })
}

async fn respond(state: &AppState, session: Session, result: ExecutionResult) -> ApiResult<SessionResponse> {
    let response = build_session_response(&session, result.status).await;
    save_session(state, session).await?;
    Ok(Json(response))
}

async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> ApiResult<SessionResponse> {
    let locale = match request.locale.as_deref() {
        Some(code) => code.parse::<Locale>().map_err(|e| bad_request_error(&e))?,
        None => state.config.locale,
    };
    let url = request
        .url
        .unwrap_or_else(|| Step::Search.path());

    let mut session = Session::new(Uuid::new_v4().to_string());
    let session_id = session.id.clone();
    info!("Opening wizard session {} at {}", session_id, url);

    state::set_locale(&session.context, locale)
        .await
        .map_err(|e| wizard_error(e, &session_id))?;
    let result = state
        .wizard
        .enter(&mut session, &url)
        .await
        .map_err(|e| wizard_error(e, &session_id))?;

    let lookups = SessionLookups::new(
        state.wizard.api(),
        claim_wizard::TypeaheadConfig {
            locale,
            ..state.config.typeahead()
        },
    );
    if let Some(airports) = result.airports.clone() {
        lookups.seed_airports(airports).await;
    }
    state.lookups.insert(session_id.clone(), Arc::new(lookups));
    respond(&state, session, result).await
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionResponse> {
    let session = load_session(&state, &session_id).await?;
    Ok(Json(build_session_response(&session, status_of(&session)).await))
}

async fn update_form(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(values): Json<Value>,
) -> ApiResult<SessionResponse> {
    if !values.is_object() {
        return Err(bad_request_error("Form values must be a JSON object"));
    }
    let lock = state.session_lock(&session_id);
    let _guard = lock.lock().await;
    let session = load_session(&state, &session_id).await?;
    state
        .wizard
        .update_form(&session, values)
        .await
        .map_err(|e| wizard_error(e, &session_id))?;

    let response = build_session_response(&session, status_of(&session)).await;
    save_session(&state, session).await?;
    Ok(Json(response))
}

async fn submit_step(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionResponse> {
    let lock = state.session_lock(&session_id);
    let _guard = lock.lock().await;
    let result = state
        .runner
        .run(&session_id)
        .await
        .map_err(|e| wizard_error(e, &session_id))?;
    info!(
        "Submitted step for session {}: {:?} at {}",
        session_id, result.status, result.location
    );

    let session = load_session(&state, &session_id).await?;
    Ok(Json(build_session_response(&session, result.status).await))
}

async fn navigate(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<NavigateRequest>,
) -> ApiResult<SessionResponse> {
    let lock = state.session_lock(&session_id);
    let _guard = lock.lock().await;
    let mut session = load_session(&state, &session_id).await?;
    let result = state
        .wizard
        .navigate(&mut session, request.step)
        .await
        .map_err(|e| wizard_error(e, &session_id))?;
    respond(&state, session, result).await
}

async fn go_back(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionResponse> {
    let lock = state.session_lock(&session_id);
    let _guard = lock.lock().await;
    let mut session = load_session(&state, &session_id).await?;
    let result = state
        .wizard
        .back(&mut session)
        .await
        .map_err(|e| wizard_error(e, &session_id))?;
    respond(&state, session, result).await
}

async fn close_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Value> {
    let lock = state.session_lock(&session_id);
    let _guard = lock.lock().await;
    let mut session = load_session(&state, &session_id).await?;
    state.wizard.close(&mut session).await;

    state.session_storage.delete(&session_id).await.map_err(|e| {
        error!("Failed to delete session {}: {}", session_id, e);
        internal_error("Failed to close session", &e.to_string())
    })?;
    state.lookups.remove(&session_id);
    state.session_locks.remove(&session_id);
    info!("Closed wizard session {}", session_id);

    Ok(Json(json!({
        "session_id": session_id,
        "status": "closed"
    })))
}

fn session_lookups(
    state: &AppState,
    session_id: &str,
    list: &str,
) -> Result<(Arc<SessionLookups>, LookupList), ApiError> {
    let list = list.parse::<LookupList>().map_err(|e| {
        warn!("Rejected lookup request for session {}: {}", session_id, e);
        not_found_error(&e, session_id)
    })?;
    let lookups = state
        .lookups
        .get(session_id)
        .map(|entry| entry.clone())
        .ok_or_else(|| not_found_error("Session not found", session_id))?;
    Ok((lookups, list))
}

async fn lookup_snapshot(
    State(state): State<AppState>,
    Path((session_id, list)): Path<(String, String)>,
) -> ApiResult<Value> {
    let (lookups, list) = session_lookups(&state, &session_id, &list)?;
    Ok(Json(lookups.snapshot(list).await))
}

async fn lookup_input(
    State(state): State<AppState>,
    Path((session_id, list)): Path<(String, String)>,
    Json(request): Json<LookupInputRequest>,
) -> ApiResult<Value> {
    let (lookups, list) = session_lookups(&state, &session_id, &list)?;
    Ok(Json(lookups.input(list, request.text).await))
}

async fn lookup_more(
    State(state): State<AppState>,
    Path((session_id, list)): Path<(String, String)>,
) -> ApiResult<Value> {
    let (lookups, list) = session_lookups(&state, &session_id, &list)?;
    Ok(Json(lookups.load_more(list).await))
}

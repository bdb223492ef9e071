//! Debounced search-as-you-type over a paginated list resource.
//!
//! A [`Typeahead`] keeps a working set of items. Mounting loads the first page,
//! typing restarts a debounce timer that eventually replaces the set with a
//! filtered fetch, and "load more" appends the next page.
//!
//! Searches are not sequenced: once a debounced search has been dispatched it
//! runs to completion, so an older, slower response can overwrite a newer one.
//! Set [`TypeaheadConfig::cancel_stale_searches`] to abort the superseded
//! request instead.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    api::{Airport, ApiResult, ClaimApi, Country, ListPage, ListQuery},
    i18n::Locale,
    violations::{ResolvedErrors, resolve_error},
};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
pub const DEFAULT_ITEMS_PER_PAGE: u32 = 10;

/// A paginated, filterable list endpoint
#[async_trait]
pub trait ListSource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + Serialize + 'static;

    fn name(&self) -> &'static str;

    async fn fetch(&self, query: ListQuery) -> ApiResult<ListPage<Self::Item>>;
}

pub struct AirportList {
    api: Arc<dyn ClaimApi>,
}

impl AirportList {
    pub fn new(api: Arc<dyn ClaimApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ListSource for AirportList {
    type Item = Airport;

    fn name(&self) -> &'static str {
        "airports"
    }

    async fn fetch(&self, query: ListQuery) -> ApiResult<ListPage<Airport>> {
        self.api.list_airports(query).await
    }
}

pub struct CountryList {
    api: Arc<dyn ClaimApi>,
}

impl CountryList {
    pub fn new(api: Arc<dyn ClaimApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ListSource for CountryList {
    type Item = Country;

    fn name(&self) -> &'static str {
        "countries"
    }

    async fn fetch(&self, query: ListQuery) -> ApiResult<ListPage<Country>> {
        self.api.list_countries(query).await
    }
}

#[derive(Debug, Clone)]
pub struct TypeaheadConfig {
    pub items_per_page: u32,
    pub debounce: Duration,
    pub cancel_stale_searches: bool,
    pub locale: Locale,
}

impl Default for TypeaheadConfig {
    fn default() -> Self {
        Self {
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            debounce: DEFAULT_DEBOUNCE,
            cancel_stale_searches: false,
            locale: Locale::default(),
        }
    }
}

/// Point-in-time view of a loader, for rendering
#[derive(Debug, Clone, Serialize)]
pub struct TypeaheadSnapshot<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub is_loading: bool,
    pub search: Option<String>,
    pub errors: Option<ResolvedErrors>,
}

struct Inner<T> {
    items: Vec<T>,
    current_page: u32,
    is_loading: bool,
    debounced: Option<String>,
    errors: Option<ResolvedErrors>,
    pending_timer: Option<JoinHandle<()>>,
    in_flight: Option<AbortHandle>,
    search_seq: u64,
}

pub struct Typeahead<S: ListSource> {
    source: Arc<S>,
    config: TypeaheadConfig,
    state: Arc<Mutex<Inner<S::Item>>>,
}

impl<S: ListSource> Typeahead<S> {
    pub fn new(source: S, config: TypeaheadConfig) -> Self {
        Self {
            source: Arc::new(source),
            config,
            state: Arc::new(Mutex::new(Inner {
                items: Vec::new(),
                current_page: 0,
                is_loading: false,
                debounced: None,
                errors: None,
                pending_timer: None,
                in_flight: None,
                search_seq: 0,
            })),
        }
    }

    pub fn config(&self) -> &TypeaheadConfig {
        &self.config
    }

    /// Load the first page, replacing whatever is loaded
    pub async fn mount(&self) -> ApiResult<()> {
        {
            let mut inner = self.state.lock().await;
            inner.is_loading = true;
            inner.errors = None;
        }

        let query = ListQuery::first_page(self.config.items_per_page);
        let result = self.source.fetch(query).await;

        let mut inner = self.state.lock().await;
        inner.is_loading = false;
        match result {
            Ok(page) => {
                debug!(list = self.source.name(), count = page.data.len(), "Loaded first page");
                inner.items = page.data;
                inner.current_page = 1;
                Ok(())
            }
            Err(e) => {
                warn!(list = self.source.name(), error = %e, "Failed to load first page");
                inner.errors = Some(resolve_error(&e, &[], self.config.locale));
                Err(e)
            }
        }
    }

    /// Install an already fetched first page in place of [`Typeahead::mount`]
    pub async fn seed(&self, items: Vec<S::Item>) {
        let mut inner = self.state.lock().await;
        debug!(list = self.source.name(), count = items.len(), "Seeded first page");
        inner.items = items;
        inner.current_page = 1;
        inner.errors = None;
    }

    /// Record user input; a search fires once input stays unchanged for the debounce period
    pub async fn input(&self, text: impl Into<String>) {
        let text = text.into();
        let mut inner = self.state.lock().await;
        if let Some(timer) = inner.pending_timer.take() {
            timer.abort();
        }

        let state = self.state.clone();
        let source = self.source.clone();
        let config = self.config.clone();
        inner.pending_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(config.debounce).await;
            dispatch_search(state, source, config, text).await;
        }));
    }

    /// Fetch the next page and append it to the working set
    pub async fn load_more(&self) -> ApiResult<()> {
        let next_page = {
            let mut inner = self.state.lock().await;
            inner.is_loading = true;
            inner.current_page + 1
        };

        let query = ListQuery::first_page(self.config.items_per_page).with_page(next_page);
        let result = self.source.fetch(query).await;

        let mut inner = self.state.lock().await;
        inner.is_loading = false;
        match result {
            Ok(page) => {
                debug!(
                    list = self.source.name(),
                    page = next_page,
                    count = page.data.len(),
                    "Appending page"
                );
                inner.items.extend(page.data);
                inner.current_page = next_page;
                Ok(())
            }
            Err(e) => {
                warn!(list = self.source.name(), page = next_page, error = %e, "Failed to load more");
                inner.errors = Some(resolve_error(&e, &[], self.config.locale));
                Err(e)
            }
        }
    }

    pub async fn dismiss_errors(&self) {
        self.state.lock().await.errors = None;
    }

    pub async fn snapshot(&self) -> TypeaheadSnapshot<S::Item> {
        let inner = self.state.lock().await;
        TypeaheadSnapshot {
            items: inner.items.clone(),
            current_page: inner.current_page,
            is_loading: inner.is_loading,
            search: inner.debounced.clone(),
            errors: inner.errors.clone(),
        }
    }
}

impl<S: ListSource> Drop for Typeahead<S> {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.state.try_lock() {
            if let Some(timer) = inner.pending_timer.take() {
                timer.abort();
            }
        }
    }
}

async fn dispatch_search<S: ListSource>(
    state: Arc<Mutex<Inner<S::Item>>>,
    source: Arc<S>,
    config: TypeaheadConfig,
    text: String,
) {
    let mut inner = state.lock().await;
    // the timer has fired; detach its handle so a later input does not abort this dispatch
    inner.pending_timer = None;

    if text.is_empty() {
        // clearing the field re-arms the next search for any value
        inner.debounced = None;
        return;
    }
    if inner.debounced.as_deref() == Some(text.as_str()) {
        return;
    }
    inner.debounced = Some(text.clone());
    inner.is_loading = true;
    inner.errors = None;
    inner.search_seq += 1;

    if config.cancel_stale_searches {
        if let Some(stale) = inner.in_flight.take() {
            debug!(list = source.name(), "Aborting superseded search");
            stale.abort();
        }
    }

    let seq = inner.search_seq;
    let task = tokio::spawn(run_search(state.clone(), source, config, text, seq));
    inner.in_flight = Some(task.abort_handle());
}

async fn run_search<S: ListSource>(
    state: Arc<Mutex<Inner<S::Item>>>,
    source: Arc<S>,
    config: TypeaheadConfig,
    text: String,
    seq: u64,
) {
    info!(list = source.name(), search = %text, "Running typeahead search");
    let query = ListQuery::first_page(config.items_per_page).with_search(text.clone());
    let result = source.fetch(query).await;

    let mut inner = state.lock().await;
    match result {
        Ok(page) => {
            inner.items = page.data;
            inner.current_page = 1;
        }
        Err(e) => {
            warn!(list = source.name(), search = %text, error = %e, "Typeahead search failed");
            inner.errors = Some(resolve_error(&e, &[], config.locale));
        }
    }
    if inner.search_seq == seq {
        inner.is_loading = false;
        inner.in_flight = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, ListMeta};
    use std::sync::Mutex as StdMutex;

    /// Returns one item per query and records every query it sees
    struct RecordingSource {
        queries: Arc<StdMutex<Vec<ListQuery>>>,
        slow_search: Option<(String, Duration)>,
        fail: bool,
    }

    impl RecordingSource {
        fn new() -> (Self, Arc<StdMutex<Vec<ListQuery>>>) {
            let queries = Arc::new(StdMutex::new(Vec::new()));
            (
                Self {
                    queries: queries.clone(),
                    slow_search: None,
                    fail: false,
                },
                queries,
            )
        }
    }

    #[async_trait]
    impl ListSource for RecordingSource {
        type Item = String;

        fn name(&self) -> &'static str {
            "recording"
        }

        async fn fetch(&self, query: ListQuery) -> ApiResult<ListPage<String>> {
            self.queries.lock().unwrap().push(query.clone());

            let delay = match (&self.slow_search, &query.search) {
                (Some((slow, delay)), Some(search)) if slow == search => *delay,
                _ => Duration::from_millis(50),
            };
            tokio::time::sleep(delay).await;

            if self.fail {
                return Err(ApiError::Status {
                    status: 500,
                    violations: Vec::new(),
                });
            }

            let page = query.page.unwrap_or(1);
            let data = match &query.search {
                Some(search) => vec![format!("{search}-result")],
                None => vec![format!("p{page}-a"), format!("p{page}-b")],
            };
            Ok(ListPage {
                data,
                meta: ListMeta {
                    current_page: page,
                    items_per_page: query.items_per_page,
                    total_items: 100,
                },
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn debounces_rapid_input_into_single_search() {
        let (source, queries) = RecordingSource::new();
        let typeahead = Typeahead::new(source, TypeaheadConfig::default());

        typeahead.input("L").await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        typeahead.input("Lo").await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        typeahead.input("Lon").await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        let queries = queries.lock().unwrap().clone();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].search.as_deref(), Some("Lon"));
        assert_eq!(queries[0].items_per_page, 10);

        let snapshot = typeahead.snapshot().await;
        assert_eq!(snapshot.items, vec!["Lon-result".to_string()]);
        assert_eq!(snapshot.search.as_deref(), Some("Lon"));
        assert!(!snapshot.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_fires_before_debounce_window_elapses() {
        let (source, queries) = RecordingSource::new();
        let typeahead = Typeahead::new(source, TypeaheadConfig::default());

        typeahead.input("Lon").await;
        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(queries.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(queries.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_or_repeated_input_does_not_refetch() {
        let (source, queries) = RecordingSource::new();
        let typeahead = Typeahead::new(source, TypeaheadConfig::default());

        typeahead.input("Lon").await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        typeahead.input("Lon").await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        typeahead.input("").await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(queries.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retyping_after_clearing_searches_again() {
        let (source, queries) = RecordingSource::new();
        let typeahead = Typeahead::new(source, TypeaheadConfig::default());

        typeahead.input("Lon").await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        typeahead.load_more().await.unwrap();
        assert_eq!(typeahead.snapshot().await.items.len(), 3);

        typeahead.input("").await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(typeahead.snapshot().await.search, None);

        typeahead.input("Lon").await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        let searches: Vec<_> = queries
            .lock()
            .unwrap()
            .iter()
            .map(|q| q.search.clone())
            .collect();
        assert_eq!(searches, vec![Some("Lon".to_string()), None, Some("Lon".to_string())]);
        let snapshot = typeahead.snapshot().await;
        assert_eq!(snapshot.items, vec!["Lon-result"]);
        assert_eq!(snapshot.current_page, 1);
    }

    #[tokio::test]
    async fn seeded_first_page_skips_mount_fetch() {
        let (source, queries) = RecordingSource::new();
        let typeahead = Typeahead::new(source, TypeaheadConfig::default());

        typeahead.seed(vec!["seeded".to_string()]).await;
        let snapshot = typeahead.snapshot().await;
        assert_eq!(snapshot.items, vec!["seeded"]);
        assert_eq!(snapshot.current_page, 1);

        typeahead.load_more().await.unwrap();
        let pages: Vec<_> = queries.lock().unwrap().iter().map(|q| q.page).collect();
        assert_eq!(pages, vec![Some(2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn load_more_appends_and_advances_one_page() {
        let (source, queries) = RecordingSource::new();
        let typeahead = Typeahead::new(source, TypeaheadConfig::default());

        typeahead.mount().await.unwrap();
        assert_eq!(typeahead.snapshot().await.current_page, 1);

        typeahead.load_more().await.unwrap();
        let snapshot = typeahead.snapshot().await;
        assert_eq!(snapshot.current_page, 2);
        assert_eq!(snapshot.items, vec!["p1-a", "p1-b", "p2-a", "p2-b"]);

        typeahead.load_more().await.unwrap();
        let snapshot = typeahead.snapshot().await;
        assert_eq!(snapshot.current_page, 3);
        assert_eq!(snapshot.items.len(), 6);
        assert_eq!(snapshot.items[..4], ["p1-a", "p1-b", "p2-a", "p2-b"]);

        let pages: Vec<_> = queries.lock().unwrap().iter().map(|q| q.page).collect();
        assert_eq!(pages, vec![None, Some(2), Some(3)]);
    }

    #[tokio::test(start_paused = true)]
    async fn search_replaces_working_set() {
        let (source, _) = RecordingSource::new();
        let typeahead = Typeahead::new(source, TypeaheadConfig::default());

        typeahead.mount().await.unwrap();
        typeahead.load_more().await.unwrap();
        typeahead.input("Vil").await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        let snapshot = typeahead.snapshot().await;
        assert_eq!(snapshot.items, vec!["Vil-result"]);
        assert_eq!(snapshot.current_page, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_search_overwrites_newer_results_by_default() {
        let (mut source, queries) = RecordingSource::new();
        source.slow_search = Some(("Lo".to_string(), Duration::from_secs(3)));
        let typeahead = Typeahead::new(source, TypeaheadConfig::default());

        typeahead.input("Lo").await;
        tokio::time::sleep(Duration::from_millis(600)).await;
        typeahead.input("Lon").await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(queries.lock().unwrap().len(), 2);
        let snapshot = typeahead.snapshot().await;
        assert_eq!(snapshot.items, vec!["Lo-result"]);
        assert_eq!(snapshot.search.as_deref(), Some("Lon"));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_search_is_aborted_when_cancellation_enabled() {
        let (mut source, queries) = RecordingSource::new();
        source.slow_search = Some(("Lo".to_string(), Duration::from_secs(3)));
        let config = TypeaheadConfig {
            cancel_stale_searches: true,
            ..TypeaheadConfig::default()
        };
        let typeahead = Typeahead::new(source, config);

        typeahead.input("Lo").await;
        tokio::time::sleep(Duration::from_millis(600)).await;
        typeahead.input("Lon").await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(queries.lock().unwrap().len(), 2);
        assert_eq!(typeahead.snapshot().await.items, vec!["Lon-result"]);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_surface_as_global_errors() {
        let (mut source, _) = RecordingSource::new();
        source.fail = true;
        let typeahead = Typeahead::new(source, TypeaheadConfig::default());

        assert!(typeahead.mount().await.is_err());
        let snapshot = typeahead.snapshot().await;
        assert!(!snapshot.is_loading);
        assert!(snapshot.errors.unwrap().global_errors.is_some());

        typeahead.dismiss_errors().await;
        assert!(typeahead.snapshot().await.errors.is_none());
    }
}

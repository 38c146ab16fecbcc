// File: src/app.rs
use crate::catalog::TransportApi;
use crate::client::{AuthClient, LOGIN_FAILED, PROFILE_FAILED, REGISTER_FAILED};
use crate::config::Config;
use crate::debounce::Debouncer;
use crate::matching::find_connecting_routes;
use crate::model::{Route, Session, User};
use crate::planner::{Endpoint, JourneyPlanner, SaveOutcome, Station, save_route};
use crate::search::SearchFilter;
use crate::storage::LocalStorage;
use crate::store::{Action, AppState};
use crate::validation::{LoginForm, RegisterForm};
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Application controller: owns the state, applies actions, runs the async
/// operations around them and persists what needs persisting.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct App {
    state: Arc<Mutex<AppState>>,
    api: TransportApi,
    auth: Result<AuthClient, String>,
    storage: Option<LocalStorage>,
    debouncer: Debouncer,
}

impl App {
    /// Builds the controller and rehydrates persisted slices from `storage`.
    /// Without storage nothing is read or written.
    pub fn new(config: &Config, storage: Option<LocalStorage>) -> Self {
        let mut state = AppState::new();
        if let Some(storage) = &storage {
            let rehydrated = storage.load_or_default();
            for w in &rehydrated.warnings {
                warn!("{}", w);
            }
            state = AppState::rehydrate(rehydrated.state);
            state.warnings = rehydrated.warnings;
            info!("Rehydrated state from {:?}", storage.path());
        }

        let auth = AuthClient::new(
            &config.api_url,
            config.allow_insecure_certs,
            config.session_ttl_mins,
        );
        if let Err(e) = &auth {
            warn!("Auth client unavailable: {}", e);
        }

        Self {
            state: Arc::new(Mutex::new(state)),
            api: config.transport_api(),
            auth,
            storage,
            debouncer: Debouncer::new(config.debounce()),
        }
    }

    /// Applies `action` to a state the caller already holds locked, then writes
    /// the persisted slices if it touched one.
    fn commit(&self, state: &mut AppState, action: Action) {
        let persist = action.touches_persisted();
        state.apply(action);
        if persist
            && let Some(storage) = &self.storage
            && let Err(e) = storage.save(&state.persisted())
        {
            warn!("Failed to save state to {:?}: {:#}", storage.path(), e);
        }
    }

    pub async fn dispatch(&self, action: Action) {
        let mut state = self.state.lock().await;
        self.commit(&mut state, action);
    }

    pub async fn snapshot(&self) -> AppState {
        self.state.lock().await.clone()
    }

    // --- Transport ---

    pub async fn fetch_buses(&self) {
        self.dispatch(Action::FetchStarted).await;
        let action = match self.api.get_buses().await {
            Ok(routes) => Action::BusesLoaded(routes),
            Err(e) => Action::FetchFailed(e),
        };
        self.dispatch(action).await;
    }

    pub async fn fetch_trains(&self) {
        self.dispatch(Action::FetchStarted).await;
        let action = match self.api.get_trains().await {
            Ok(routes) => Action::TrainsLoaded(routes),
            Err(e) => Action::FetchFailed(e),
        };
        self.dispatch(action).await;
    }

    pub async fn fetch_destinations(&self) {
        self.dispatch(Action::FetchStarted).await;
        let action = match self.api.get_destinations().await {
            Ok(routes) => Action::DestinationsLoaded(routes),
            Err(e) => Action::FetchFailed(e),
        };
        self.dispatch(action).await;
    }

    /// Home screen load (and pull-to-refresh): the three lists in parallel.
    pub async fn load_home(&self) {
        futures::join!(
            self.fetch_buses(),
            self.fetch_trains(),
            self.fetch_destinations()
        );
    }

    pub async fn load_all_routes(&self) {
        self.dispatch(Action::FetchStarted).await;
        let action = match self.api.get_all_routes().await {
            Ok(routes) => Action::AllRoutesLoaded(routes),
            Err(e) => Action::FetchFailed(e),
        };
        self.dispatch(action).await;
    }

    /// Runs a search and stores its results. Results of an older search that
    /// resolves later overwrite newer ones.
    pub async fn search(&self, query: &str, filter: SearchFilter) -> Vec<Route> {
        self.dispatch(Action::FetchStarted).await;
        match self.api.search_routes(query, filter).await {
            Ok(routes) => {
                self.dispatch(Action::SearchResolved(routes.clone())).await;
                routes
            }
            Err(e) => {
                self.dispatch(Action::FetchFailed(e)).await;
                Vec::new()
            }
        }
    }

    /// Debounced [`search`](Self::search) for keystroke input.
    pub fn search_as_you_type(&self, query: impl Into<String>, filter: SearchFilter) {
        let app = self.clone();
        let query = query.into();
        self.debouncer.call(async move {
            app.search(&query, filter).await;
        });
    }

    /// Loads a route into the selection. On failure the previous selection
    /// stays and the error lands in `transport.error`.
    pub async fn fetch_route(&self, id: &str) -> Result<Route, String> {
        self.dispatch(Action::FetchStarted).await;
        match self.api.get_route_by_id(id).await {
            Ok(route) => {
                self.dispatch(Action::RouteLoaded(route.clone())).await;
                Ok(route)
            }
            Err(e) => {
                self.dispatch(Action::FetchFailed(e.clone())).await;
                Err(e)
            }
        }
    }

    pub async fn open_route(&self, route: Route) {
        self.dispatch(Action::SetSelectedRoute(route)).await;
    }

    pub async fn clear_selection(&self) {
        self.dispatch(Action::ClearSelectedRoute).await;
    }

    pub async fn clear_search_results(&self) {
        self.dispatch(Action::ClearSearchResults).await;
    }

    pub async fn selected_route(&self) -> Option<Route> {
        self.state.lock().await.selected_route().cloned()
    }

    pub async fn search_results(&self) -> Vec<Route> {
        self.state.lock().await.transport.search_results.clone()
    }

    // --- Favourites ---

    pub async fn add_favourite(&self, route: Route) {
        self.dispatch(Action::AddFavourite(route)).await;
    }

    pub async fn remove_favourite(&self, id: &str) {
        self.dispatch(Action::RemoveFavourite(id.to_string())).await;
    }

    /// Returns whether the route is a favourite afterwards.
    pub async fn toggle_favourite(&self, route: Route) -> bool {
        let id = route.id.clone();
        let mut state = self.state.lock().await;
        self.commit(&mut state, Action::ToggleFavourite(route));
        state.is_favourite(&id)
    }

    pub async fn clear_favourites(&self) {
        self.dispatch(Action::ClearFavourites).await;
    }

    pub async fn is_favourite(&self, id: &str) -> bool {
        self.state.lock().await.is_favourite(id)
    }

    pub async fn favourites(&self) -> Vec<Route> {
        self.state.lock().await.favourites.items().to_vec()
    }

    // --- Journey planner ---

    /// Buses and trains connecting two places, in either direction.
    pub async fn connecting_routes(&self, from: &str, to: &str) -> Vec<Route> {
        let routes = self.state.lock().await.timetabled_routes();
        find_connecting_routes(&routes, from, to)
    }

    pub async fn save_planned_route(&self, route: Route) -> SaveOutcome {
        let mut state = self.state.lock().await;
        let mut favourites = state.favourites.clone();
        let outcome = save_route(&mut favourites, route.clone());
        if outcome == SaveOutcome::Saved {
            self.commit(&mut state, Action::AddFavourite(route));
        }
        outcome
    }

    pub async fn begin_selecting(&self, endpoint: Endpoint) {
        self.dispatch(Action::BeginSelecting(endpoint)).await;
    }

    /// Returns false when no endpoint was being picked.
    pub async fn press_marker(&self, station: Station) -> bool {
        let mut state = self.state.lock().await;
        let picking = state.planner.selecting().is_some();
        self.commit(&mut state, Action::PressMarker(station));
        picking
    }

    pub async fn planner(&self) -> JourneyPlanner {
        self.state.lock().await.planner.clone()
    }

    /// Routes between the two picked stations; empty until both are set.
    pub async fn planned_routes(&self) -> Vec<Route> {
        let state = self.state.lock().await;
        state.planner.connecting_routes(&state.timetabled_routes())
    }

    pub async fn choose_journey(&self, route: Route) {
        self.dispatch(Action::ChooseJourney(route)).await;
    }

    pub async fn reset_planner(&self) {
        self.dispatch(Action::ResetPlanner).await;
    }

    /// Looks `id` up among the routes already in state, then asks the catalog.
    pub async fn resolve_route(&self, id: &str) -> Result<Route, String> {
        let known = self.state.lock().await.find_route(id).cloned();
        match known {
            Some(route) => Ok(route),
            None => self.api.get_route_by_id(id).await,
        }
    }

    // --- Auth ---

    fn auth_client(&self, fallback: &str) -> Result<&AuthClient, String> {
        self.auth.as_ref().map_err(|e| {
            warn!("Auth client unavailable: {}", e);
            fallback.to_string()
        })
    }

    async fn finish_auth(&self, outcome: Result<Session, String>) -> Result<User, String> {
        match outcome {
            Ok(session) => {
                let user = session.user.clone();
                self.dispatch(Action::LoggedIn(session)).await;
                Ok(user)
            }
            Err(e) => {
                self.dispatch(Action::AuthFailed(e.clone())).await;
                Err(e)
            }
        }
    }

    /// Invalid forms are rejected before anything is dispatched.
    pub async fn login(&self, form: &LoginForm) -> Result<User, String> {
        form.validate().map_err(|e| e.to_string())?;
        self.dispatch(Action::AuthStarted).await;
        let outcome = match self.auth_client(LOGIN_FAILED) {
            Ok(client) => client.login(&form.username, &form.password).await,
            Err(e) => Err(e),
        };
        self.finish_auth(outcome).await
    }

    pub async fn register(&self, form: &RegisterForm) -> Result<User, String> {
        form.validate().map_err(|e| e.to_string())?;
        self.dispatch(Action::AuthStarted).await;
        let outcome = match self.auth_client(REGISTER_FAILED) {
            Ok(client) => client.register(form).await,
            Err(e) => Err(e),
        };
        self.finish_auth(outcome).await
    }

    /// Re-reads the signed-in user's profile with the stored token.
    pub async fn refresh_profile(&self) -> Result<User, String> {
        let token = self.state.lock().await.auth.token.clone();
        self.dispatch(Action::AuthStarted).await;
        let outcome = match (token, self.auth_client(PROFILE_FAILED)) {
            (Some(token), Ok(client)) => client.profile(&token).await,
            (None, _) => Err(PROFILE_FAILED.to_string()),
            (_, Err(e)) => Err(e),
        };
        match outcome {
            Ok(user) => {
                self.dispatch(Action::ProfileLoaded(user.clone())).await;
                Ok(user)
            }
            Err(e) => {
                self.dispatch(Action::AuthFailed(e.clone())).await;
                Err(e)
            }
        }
    }

    pub async fn logout(&self) {
        self.dispatch(Action::Logout).await;
    }

    pub async fn clear_auth_error(&self) {
        self.dispatch(Action::ClearAuthError).await;
    }

    // --- Theme ---

    pub async fn toggle_dark_mode(&self) -> bool {
        let mut state = self.state.lock().await;
        self.commit(&mut state, Action::ToggleDarkMode);
        state.theme.is_dark_mode
    }

    pub async fn set_dark_mode(&self, on: bool) {
        self.dispatch(Action::SetDarkMode(on)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, ROUTE_NOT_FOUND};
    use std::time::Duration;

    fn config() -> Config {
        Config {
            simulate_latency: false,
            allow_insecure_certs: true,
            ..Config::default()
        }
    }

    fn app_in(dir: &tempfile::TempDir, config: &Config) -> App {
        App::new(config, Some(LocalStorage::new(dir.path().join("state.json"))))
    }

    fn route(id: &str) -> Route {
        Catalog::built_in().find(id).cloned().unwrap()
    }

    fn ids(routes: &[Route]) -> Vec<&str> {
        routes.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_load_home_fills_lists() {
        let app = App::new(&config(), None);
        app.load_home().await;
        let s = app.snapshot().await;
        assert_eq!(s.transport.buses.len(), 5);
        assert_eq!(s.transport.trains.len(), 5);
        assert_eq!(s.transport.destinations.len(), 8);
        assert!(!s.transport.is_loading);
        assert!(s.transport.error.is_none());
    }

    #[tokio::test]
    async fn test_catalog_file_failure_sets_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            catalog_path: Some(dir.path().join("missing.json").to_string_lossy().into()),
            ..config()
        };
        let app = App::new(&cfg, None);
        app.load_all_routes().await;
        let s = app.snapshot().await;
        assert!(s.transport.error.is_some());
        assert!(!s.transport.is_loading);
        assert!(s.transport.all_routes.is_empty());
    }

    #[tokio::test]
    async fn test_search_stores_results() {
        let app = App::new(&config(), None);
        let found = app.search("kandy", SearchFilter::Trains).await;
        assert!(ids(&found).contains(&"train-1"));
        assert_eq!(app.search_results().await, found);

        app.clear_search_results().await;
        assert!(app.search_results().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_as_you_type_debounces() {
        let app = App::new(&config(), None);
        for q in ["k", "ka", "kan", "kandy"] {
            app.search_as_you_type(q, SearchFilter::All);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(app.search_results().await.is_empty());

        tokio::time::sleep(Duration::from_secs(1)).await;
        let results = app.search_results().await;
        assert!(!results.is_empty());
        let all = Catalog::built_in().all();
        let expected = crate::search::search(&all, "kandy", SearchFilter::All);
        assert_eq!(results, expected);
    }

    #[tokio::test]
    async fn test_fetch_route_not_found_keeps_selection() {
        let app = App::new(&config(), None);
        app.fetch_route("bus-3").await.unwrap();
        let err = app.fetch_route("bus-99").await.unwrap_err();
        assert_eq!(err, ROUTE_NOT_FOUND);
        assert_eq!(app.selected_route().await.unwrap().id, "bus-3");
        assert_eq!(
            app.snapshot().await.transport.error.as_deref(),
            Some(ROUTE_NOT_FOUND)
        );

        app.clear_selection().await;
        assert!(app.selected_route().await.is_none());
    }

    #[tokio::test]
    async fn test_favourites_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        {
            let app = app_in(&dir, &config());
            app.add_favourite(route("bus-1")).await;
            assert!(app.toggle_favourite(route("dest-2")).await);
            app.set_dark_mode(true).await;
            app.open_route(route("train-3")).await;
        }
        let app = app_in(&dir, &config());
        assert_eq!(ids(&app.favourites().await), vec!["bus-1", "dest-2"]);
        assert!(app.snapshot().await.theme.is_dark_mode);
        assert!(app.selected_route().await.is_none());
        assert!(app.snapshot().await.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_storage_reports_warning() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("state.json"), "not json").unwrap();
        let app = app_in(&dir, &config());
        let s = app.snapshot().await;
        assert_eq!(s.warnings.len(), 1);
        assert!(s.favourites.is_empty());
    }

    #[tokio::test]
    async fn test_connecting_routes_and_save() {
        let app = App::new(&config(), None);
        assert!(app.connecting_routes("Colombo", "Kandy").await.is_empty());

        app.load_home().await;
        let found = app.connecting_routes("Kandy", "Colombo").await;
        let found_ids = ids(&found);
        assert!(found_ids.contains(&"bus-1"));
        assert!(found_ids.contains(&"train-1"));
        assert!(found.iter().all(|r| r.kind.is_transport()));

        assert_eq!(app.save_planned_route(route("train-1")).await, SaveOutcome::Saved);
        assert_eq!(
            app.save_planned_route(route("train-1")).await,
            SaveOutcome::AlreadySaved
        );
        assert_eq!(app.favourites().await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_report_saved_once() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_in(&dir, &config());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let app = app.clone();
                tokio::spawn(async move { app.save_planned_route(route("train-1")).await })
            })
            .collect();
        let mut saved = 0;
        for h in handles {
            if h.await.unwrap() == SaveOutcome::Saved {
                saved += 1;
            }
        }
        assert_eq!(saved, 1);
        assert_eq!(app.favourites().await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_toggles_alternate() {
        let app = App::new(&config(), None);
        let handles: Vec<_> = (0..6)
            .map(|_| {
                let app = app.clone();
                tokio::spawn(async move { app.toggle_favourite(route("dest-1")).await })
            })
            .collect();
        let mut added = 0;
        for h in handles {
            if h.await.unwrap() {
                added += 1;
            }
        }
        assert_eq!(added, 3);
        assert!(!app.is_favourite("dest-1").await);
    }

    #[tokio::test]
    async fn test_resolve_route_before_home_loads() {
        let app = App::new(&config(), None);
        app.search("kandy", SearchFilter::All).await;
        assert!(app.snapshot().await.transport.trains.is_empty());

        let found = app.resolve_route("train-1").await.unwrap();
        assert!(app.toggle_favourite(found).await);

        app.open_route(route("dest-6")).await;
        app.clear_search_results().await;
        assert_eq!(app.resolve_route("dest-6").await.unwrap().id, "dest-6");

        // Not in state at all: falls back to the catalog.
        assert_eq!(app.resolve_route("bus-4").await.unwrap().id, "bus-4");
        assert_eq!(app.resolve_route("bus-99").await.unwrap_err(), ROUTE_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_journey_planner_flow() {
        let app = App::new(&config(), None);
        app.load_home().await;
        let stations = crate::planner::london_stations();

        assert!(!app.press_marker(stations[0].clone()).await);
        app.begin_selecting(Endpoint::From).await;
        assert!(app.press_marker(stations[0].clone()).await);
        app.begin_selecting(Endpoint::To).await;
        assert!(app.press_marker(stations[6].clone()).await);

        let planner = app.planner().await;
        assert!(planner.can_search());
        assert_eq!(planner.from().unwrap().name, "Kings Cross Station");
        assert_eq!(planner.to().unwrap().name, "Heathrow Central");
        // The sample map stations are in London, the catalog in Sri Lanka.
        assert!(app.planned_routes().await.is_empty());

        app.choose_journey(route("train-1")).await;
        assert_eq!(app.planner().await.chosen().unwrap().id, "train-1");
        app.reset_planner().await;
        assert_eq!(app.planner().await, JourneyPlanner::default());
    }

    #[tokio::test]
    async fn test_toggle_dark_mode() {
        let app = App::new(&config(), None);
        assert!(app.toggle_dark_mode().await);
        assert!(!app.toggle_dark_mode().await);
    }

    #[tokio::test]
    async fn test_invalid_login_form_dispatches_nothing() {
        let app = App::new(&config(), None);
        let err = app.login(&LoginForm::new("ab", "")).await.unwrap_err();
        assert_eq!(
            err,
            "Username must be at least 3 characters; Password is required"
        );
        let s = app.snapshot().await;
        assert!(!s.auth.is_loading);
        assert!(s.auth.error.is_none());
    }

    #[tokio::test]
    async fn test_login_persists_session_and_logout_clears_it() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_body(
                r#"{"id": 1, "username": "emilys", "email": "emily@x.dummyjson.com",
                    "firstName": "Emily", "lastName": "Johnson", "image": "i",
                    "accessToken": "tok-1"}"#,
            )
            .create_async()
            .await;
        let profile = server
            .mock("GET", "/auth/me")
            .match_header("authorization", "Bearer tok-1")
            .with_status(200)
            .with_body(
                r#"{"id": 1, "username": "emilys", "email": "new@x.dummyjson.com",
                    "firstName": "Emily", "lastName": "Johnson"}"#,
            )
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            api_url: server.url(),
            ..config()
        };
        let app = app_in(&dir, &cfg);
        let user = app.login(&LoginForm::new("emilys", "emilyspass")).await.unwrap();
        assert_eq!(user.name, "Emily Johnson");

        let user = app.refresh_profile().await.unwrap();
        profile.assert_async().await;
        assert_eq!(user.email, "new@x.dummyjson.com");

        let restored = app_in(&dir, &cfg).snapshot().await;
        assert!(restored.auth.is_authenticated);
        assert_eq!(restored.auth.token.as_deref(), Some("tok-1"));
        assert_eq!(restored.auth.user.unwrap().email, "new@x.dummyjson.com");

        app.logout().await;
        let restored = app_in(&dir, &cfg).snapshot().await;
        assert!(!restored.auth.is_authenticated);
        assert!(restored.auth.token.is_none());
    }

    #[tokio::test]
    async fn test_failed_login_sets_error_until_cleared() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .with_status(400)
            .create_async()
            .await;
        let cfg = Config {
            api_url: server.url(),
            ..config()
        };
        let app = App::new(&cfg, None);
        let err = app.login(&LoginForm::new("emilys", "wrong")).await.unwrap_err();
        assert_eq!(err, LOGIN_FAILED);
        assert_eq!(app.snapshot().await.auth.error.as_deref(), Some(LOGIN_FAILED));

        app.clear_auth_error().await;
        assert!(app.snapshot().await.auth.error.is_none());
    }

    #[tokio::test]
    async fn test_refresh_profile_without_session() {
        let app = App::new(&config(), None);
        assert_eq!(app.refresh_profile().await.unwrap_err(), PROFILE_FAILED);
        assert_eq!(app.snapshot().await.auth.error.as_deref(), Some(PROFILE_FAILED));
    }
}

// File: src/store.rs
use crate::catalog::Catalog;
use crate::favourites::Favourites;
use crate::model::{Route, Session, User};
use crate::planner::{Endpoint, JourneyPlanner, Station};
use crate::selection::Selection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportState {
    pub buses: Vec<Route>,
    pub trains: Vec<Route>,
    pub destinations: Vec<Route>,
    pub all_routes: Vec<Route>,
    pub search_results: Vec<Route>,
    pub selected: Selection,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthState {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(skip)]
    pub is_loading: bool,
    #[serde(skip)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeState {
    #[serde(default)]
    pub is_dark_mode: bool,
}

/// The part of [`AppState`] that survives a restart. Transport, search and
/// planner state are always rebuilt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub auth: AuthState,
    #[serde(default)]
    pub favourites: Favourites,
    #[serde(default)]
    pub theme: ThemeState,
}

#[derive(Debug, Clone)]
pub enum Action {
    // Transport
    FetchStarted,
    BusesLoaded(Vec<Route>),
    TrainsLoaded(Vec<Route>),
    DestinationsLoaded(Vec<Route>),
    AllRoutesLoaded(Vec<Route>),
    SearchResolved(Vec<Route>),
    RouteLoaded(Route),
    FetchFailed(String),
    ClearSearchResults,
    SetSelectedRoute(Route),
    ClearSelectedRoute,

    // Favourites
    AddFavourite(Route),
    RemoveFavourite(String),
    ToggleFavourite(Route),
    ClearFavourites,

    // Auth
    AuthStarted,
    LoggedIn(Session),
    ProfileLoaded(User),
    AuthFailed(String),
    ClearAuthError,
    Logout,

    // Theme
    ToggleDarkMode,
    SetDarkMode(bool),

    // Map
    BeginSelecting(Endpoint),
    PressMarker(Station),
    ChooseJourney(Route),
    ResetPlanner,
}

impl Action {
    /// Whether applying this action can change a persisted slice.
    pub fn touches_persisted(&self) -> bool {
        matches!(
            self,
            Action::AddFavourite(_)
                | Action::RemoveFavourite(_)
                | Action::ToggleFavourite(_)
                | Action::ClearFavourites
                | Action::LoggedIn(_)
                | Action::ProfileLoaded(_)
                | Action::Logout
                | Action::ToggleDarkMode
                | Action::SetDarkMode(_)
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub transport: TransportState,
    pub favourites: Favourites,
    pub auth: AuthState,
    pub theme: ThemeState,
    pub planner: JourneyPlanner,
    /// Non-fatal problems found while rehydrating.
    pub warnings: Vec<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rehydrate(persisted: PersistedState) -> Self {
        Self {
            favourites: persisted.favourites,
            auth: AuthState {
                is_loading: false,
                error: None,
                ..persisted.auth
            },
            theme: persisted.theme,
            ..Self::default()
        }
    }

    pub fn persisted(&self) -> PersistedState {
        PersistedState {
            auth: AuthState {
                user: self.auth.user.clone(),
                token: self.auth.token.clone(),
                is_authenticated: self.auth.is_authenticated,
                is_loading: false,
                error: None,
            },
            favourites: self.favourites.clone(),
            theme: self.theme,
        }
    }

    /// Folds one action into the state. Nothing else mutates it.
    pub fn apply(&mut self, action: Action) {
        let t = &mut self.transport;
        match action {
            Action::FetchStarted => {
                t.is_loading = true;
                t.error = None;
            }
            Action::BusesLoaded(routes) => {
                t.is_loading = false;
                t.buses = routes;
            }
            Action::TrainsLoaded(routes) => {
                t.is_loading = false;
                t.trains = routes;
            }
            Action::DestinationsLoaded(routes) => {
                t.is_loading = false;
                t.destinations = routes;
            }
            Action::AllRoutesLoaded(routes) => {
                t.is_loading = false;
                let catalog = Catalog::from_routes(routes.clone());
                t.all_routes = routes;
                t.buses = catalog.buses;
                t.trains = catalog.trains;
                t.destinations = catalog.destinations;
            }
            Action::SearchResolved(routes) => {
                t.is_loading = false;
                t.search_results = routes;
            }
            Action::RouteLoaded(route) => {
                t.is_loading = false;
                t.selected.select(route);
            }
            Action::FetchFailed(message) => {
                t.is_loading = false;
                t.error = Some(message);
            }
            Action::ClearSearchResults => t.search_results.clear(),
            Action::SetSelectedRoute(route) => t.selected.select(route),
            Action::ClearSelectedRoute => t.selected.clear(),

            Action::AddFavourite(route) => {
                self.favourites.add(route);
            }
            Action::RemoveFavourite(id) => {
                self.favourites.remove(&id);
            }
            Action::ToggleFavourite(route) => {
                self.favourites.toggle(route);
            }
            Action::ClearFavourites => self.favourites.clear(),

            Action::AuthStarted => {
                self.auth.is_loading = true;
                self.auth.error = None;
            }
            Action::LoggedIn(session) => {
                self.auth = AuthState {
                    user: Some(session.user),
                    token: Some(session.token),
                    is_authenticated: true,
                    is_loading: false,
                    error: None,
                };
            }
            Action::ProfileLoaded(user) => {
                self.auth.is_loading = false;
                self.auth.user = Some(user);
            }
            Action::AuthFailed(message) => {
                self.auth.is_loading = false;
                self.auth.error = Some(message);
            }
            Action::ClearAuthError => self.auth.error = None,
            Action::Logout => self.auth = AuthState::default(),

            Action::ToggleDarkMode => self.theme.is_dark_mode = !self.theme.is_dark_mode,
            Action::SetDarkMode(on) => self.theme.is_dark_mode = on,

            Action::BeginSelecting(endpoint) => self.planner.begin_selecting(endpoint),
            Action::PressMarker(station) => {
                self.planner.press_marker(&station);
            }
            Action::ChooseJourney(route) => self.planner.choose(route),
            Action::ResetPlanner => self.planner.reset(),
        }
    }

    pub fn selected_route(&self) -> Option<&Route> {
        self.transport.selected.get()
    }

    pub fn is_favourite(&self, id: &str) -> bool {
        self.favourites.is_favourite(id)
    }

    /// Buses then trains, the routes the journey planner searches.
    pub fn timetabled_routes(&self) -> Vec<Route> {
        self.transport
            .buses
            .iter()
            .chain(&self.transport.trains)
            .cloned()
            .collect()
    }

    /// Any route currently held in state, wherever the user may be seeing it.
    pub fn find_route(&self, id: &str) -> Option<&Route> {
        let t = &self.transport;
        t.selected
            .get()
            .into_iter()
            .chain(&t.search_results)
            .chain(&t.all_routes)
            .chain(&t.buses)
            .chain(&t.trains)
            .chain(&t.destinations)
            .chain(self.favourites.items())
            .chain(self.planner.chosen())
            .find(|r| r.id == id)
    }
}

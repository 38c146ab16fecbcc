// File: ./src/mobile.rs
use crate::app::App;
use crate::config::Config;
use crate::model::{Route, User};
use crate::paths::AppPaths;
use crate::planner::{Endpoint, JourneyPlanner, SaveOutcome, Station, london_stations};
use crate::search::SearchFilter;
use crate::storage::LocalStorage;
use crate::validation::{LoginForm, RegisterForm};
use chrono::Local;

#[cfg(target_os = "android")]
use android_logger::Config as LogConfig;
#[cfg(target_os = "android")]
use log::LevelFilter;

#[derive(Debug, uniffi::Error)]
#[uniffi(flat_error)]
pub enum MobileError {
    Generic(String),
}
impl From<String> for MobileError {
    fn from(e: String) -> Self {
        Self::Generic(e)
    }
}
impl From<&str> for MobileError {
    fn from(e: &str) -> Self {
        Self::Generic(e.to_string())
    }
}
impl From<anyhow::Error> for MobileError {
    fn from(e: anyhow::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
impl std::fmt::Display for MobileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MobileError::Generic(s) => write!(f, "{}", s),
        }
    }
}
impl std::error::Error for MobileError {}

// --- DTOs ---

#[derive(uniffi::Record)]
pub struct MobileRoute {
    pub id: String,
    pub title: String,
    pub description: String,
    pub kind: String,
    pub status: String,
    pub image: String,
    pub duration: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub price: Option<String>,
    pub schedule: Vec<String>,
    pub next_departure: Option<String>,
    pub rating: Option<f32>,
    pub reviews: Option<u32>,
    pub is_favourite: bool,
}

#[derive(uniffi::Record)]
pub struct MobileUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub name: String,
    pub avatar: Option<String>,
}

#[derive(uniffi::Record)]
pub struct MobileStation {
    pub id: u32,
    pub name: String,
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(uniffi::Enum)]
pub enum MobileEndpoint {
    From,
    To,
}

#[derive(uniffi::Record)]
pub struct MobilePlanner {
    pub from: Option<MobileStation>,
    pub to: Option<MobileStation>,
    pub selecting: Option<MobileEndpoint>,
    pub can_search: bool,
    pub chosen: Option<MobileRoute>,
}

#[derive(uniffi::Record)]
pub struct MobileConfig {
    pub api_url: String,
    pub allow_insecure: bool,
    pub session_ttl_mins: u32,
    pub search_debounce_ms: u64,
    pub simulate_latency: bool,
}

fn route_to_mobile(r: &Route, is_favourite: bool) -> MobileRoute {
    let now = Local::now().time();
    MobileRoute {
        id: r.id.clone(),
        title: r.title.clone(),
        description: r.description.clone(),
        kind: r.kind.to_string(),
        status: r.status.to_string(),
        image: r.image.clone(),
        duration: r.duration.clone(),
        origin: r.origin.clone(),
        destination: r.destination.clone(),
        price: r.price.clone(),
        schedule: r.schedule.clone().unwrap_or_default(),
        next_departure: r.next_departure(now).map(|t| t.format("%H:%M").to_string()),
        rating: r.rating,
        reviews: r.reviews,
        is_favourite,
    }
}

fn user_to_mobile(u: User) -> MobileUser {
    MobileUser {
        id: u.id,
        username: u.username,
        email: u.email,
        name: u.name,
        avatar: u.avatar,
    }
}

fn station_to_mobile(s: &Station) -> MobileStation {
    MobileStation {
        id: s.id,
        name: s.name.clone(),
        label: s.label().to_string(),
        latitude: s.coordinate.latitude,
        longitude: s.coordinate.longitude,
    }
}

fn planner_to_mobile(p: &JourneyPlanner, favourites: &[Route]) -> MobilePlanner {
    MobilePlanner {
        from: p.from().map(station_to_mobile),
        to: p.to().map(station_to_mobile),
        selecting: p.selecting().map(|e| match e {
            Endpoint::From => MobileEndpoint::From,
            Endpoint::To => MobileEndpoint::To,
        }),
        can_search: p.can_search(),
        chosen: p
            .chosen()
            .map(|r| route_to_mobile(r, favourites.iter().any(|f| f.id == r.id))),
    }
}

// --- MAIN OBJECT ---

#[derive(uniffi::Object)]
pub struct RoutewiseMobile {
    app: App,
}

impl RoutewiseMobile {
    async fn to_mobile(&self, routes: Vec<Route>) -> Vec<MobileRoute> {
        let favourites = self.app.favourites().await;
        routes
            .iter()
            .map(|r| route_to_mobile(r, favourites.iter().any(|f| f.id == r.id)))
            .collect()
    }

    async fn find_route(&self, id: &str) -> Result<Route, MobileError> {
        self.app.resolve_route(id).await.map_err(MobileError::from)
    }
}

#[uniffi::export(async_runtime = "tokio")]
impl RoutewiseMobile {
    #[uniffi::constructor]
    pub fn new(android_files_dir: String) -> Self {
        #[cfg(target_os = "android")]
        android_logger::init_once(
            LogConfig::default()
                .with_max_level(LevelFilter::Debug)
                .with_tag("RoutewiseRust"),
        );
        AppPaths::init_android_path(android_files_dir);
        let config = Config::load().unwrap_or_default();
        Self {
            app: App::new(&config, LocalStorage::default_location()),
        }
    }

    pub fn get_config(&self) -> MobileConfig {
        let c = Config::load().unwrap_or_default();
        MobileConfig {
            api_url: c.api_url,
            allow_insecure: c.allow_insecure_certs,
            session_ttl_mins: c.session_ttl_mins,
            search_debounce_ms: c.search_debounce_ms,
            simulate_latency: c.simulate_latency,
        }
    }

    /// Takes effect on the next start.
    pub fn save_config(&self, config: MobileConfig) -> Result<(), MobileError> {
        let mut c = Config::load().unwrap_or_default();
        c.api_url = config.api_url;
        c.allow_insecure_certs = config.allow_insecure;
        c.session_ttl_mins = config.session_ttl_mins;
        c.search_debounce_ms = config.search_debounce_ms;
        c.simulate_latency = config.simulate_latency;
        c.save().map_err(MobileError::from)
    }

    pub async fn get_warnings(&self) -> Vec<String> {
        self.app.snapshot().await.warnings
    }

    pub fn search_filters(&self) -> Vec<String> {
        SearchFilter::ALL.iter().map(|f| f.label().to_string()).collect()
    }

    // --- Transport ---

    pub async fn load_home(&self) -> Result<(), MobileError> {
        self.app.load_home().await;
        match self.app.snapshot().await.transport.error {
            Some(e) => Err(MobileError::from(e)),
            None => Ok(()),
        }
    }

    pub async fn get_buses(&self) -> Vec<MobileRoute> {
        let routes = self.app.snapshot().await.transport.buses;
        self.to_mobile(routes).await
    }

    pub async fn get_trains(&self) -> Vec<MobileRoute> {
        let routes = self.app.snapshot().await.transport.trains;
        self.to_mobile(routes).await
    }

    pub async fn get_destinations(&self) -> Vec<MobileRoute> {
        let routes = self.app.snapshot().await.transport.destinations;
        self.to_mobile(routes).await
    }

    pub async fn search(&self, query: String, filter: String) -> Vec<MobileRoute> {
        let routes = self.app.search(&query, SearchFilter::parse(&filter)).await;
        self.to_mobile(routes).await
    }

    /// Async only so the debounce timer is spawned on the runtime.
    pub async fn search_as_you_type(&self, query: String, filter: String) {
        self.app.search_as_you_type(query, SearchFilter::parse(&filter));
    }

    pub async fn get_search_results(&self) -> Vec<MobileRoute> {
        let routes = self.app.search_results().await;
        self.to_mobile(routes).await
    }

    pub async fn clear_search_results(&self) {
        self.app.clear_search_results().await;
    }

    pub async fn open_route(&self, id: String) -> Result<MobileRoute, MobileError> {
        let route = self.app.fetch_route(&id).await.map_err(MobileError::from)?;
        let fav = self.app.is_favourite(&route.id).await;
        Ok(route_to_mobile(&route, fav))
    }

    pub async fn get_selected_route(&self) -> Option<MobileRoute> {
        let route = self.app.selected_route().await?;
        let fav = self.app.is_favourite(&route.id).await;
        Some(route_to_mobile(&route, fav))
    }

    pub async fn clear_selection(&self) {
        self.app.clear_selection().await;
    }

    // --- Favourites ---

    pub async fn get_favourites(&self) -> Vec<MobileRoute> {
        self.app
            .favourites()
            .await
            .iter()
            .map(|r| route_to_mobile(r, true))
            .collect()
    }

    pub async fn toggle_favourite(&self, id: String) -> Result<bool, MobileError> {
        let route = self.find_route(&id).await?;
        Ok(self.app.toggle_favourite(route).await)
    }

    pub async fn remove_favourite(&self, id: String) {
        self.app.remove_favourite(&id).await;
    }

    pub async fn clear_favourites(&self) {
        self.app.clear_favourites().await;
    }

    // --- Map ---

    pub fn get_stations(&self) -> Vec<MobileStation> {
        london_stations().iter().map(station_to_mobile).collect()
    }

    pub async fn connecting_routes(&self, from: String, to: String) -> Vec<MobileRoute> {
        let routes = self.app.connecting_routes(&from, &to).await;
        self.to_mobile(routes).await
    }

    /// Returns false when the route was already saved.
    pub async fn save_planned_route(&self, id: String) -> Result<bool, MobileError> {
        let route = self.find_route(&id).await?;
        Ok(self.app.save_planned_route(route).await == SaveOutcome::Saved)
    }

    pub async fn begin_selecting(&self, endpoint: MobileEndpoint) {
        let endpoint = match endpoint {
            MobileEndpoint::From => Endpoint::From,
            MobileEndpoint::To => Endpoint::To,
        };
        self.app.begin_selecting(endpoint).await;
    }

    /// Returns false when no endpoint was being picked.
    pub async fn press_marker(&self, station_id: u32) -> Result<bool, MobileError> {
        let station = london_stations()
            .into_iter()
            .find(|s| s.id == station_id)
            .ok_or_else(|| MobileError::from(format!("Unknown station {}", station_id)))?;
        Ok(self.app.press_marker(station).await)
    }

    pub async fn get_planner(&self) -> MobilePlanner {
        let planner = self.app.planner().await;
        planner_to_mobile(&planner, &self.app.favourites().await)
    }

    pub async fn planned_routes(&self) -> Vec<MobileRoute> {
        let routes = self.app.planned_routes().await;
        self.to_mobile(routes).await
    }

    pub async fn choose_journey(&self, id: String) -> Result<(), MobileError> {
        let route = self.find_route(&id).await?;
        self.app.choose_journey(route).await;
        Ok(())
    }

    pub async fn reset_planner(&self) {
        self.app.reset_planner().await;
    }

    // --- Auth ---

    pub async fn login(
        &self,
        username: String,
        password: String,
    ) -> Result<MobileUser, MobileError> {
        let form = LoginForm::new(username, password);
        let user = self.app.login(&form).await.map_err(MobileError::from)?;
        Ok(user_to_mobile(user))
    }

    pub async fn register(
        &self,
        first_name: String,
        last_name: String,
        username: String,
        email: String,
        password: String,
        confirm_password: String,
    ) -> Result<MobileUser, MobileError> {
        let form = RegisterForm {
            first_name,
            last_name,
            username,
            email,
            password,
            confirm_password,
        };
        let user = self.app.register(&form).await.map_err(MobileError::from)?;
        Ok(user_to_mobile(user))
    }

    pub async fn refresh_profile(&self) -> Result<MobileUser, MobileError> {
        let user = self.app.refresh_profile().await.map_err(MobileError::from)?;
        Ok(user_to_mobile(user))
    }

    pub async fn get_user(&self) -> Option<MobileUser> {
        let auth = self.app.snapshot().await.auth;
        if !auth.is_authenticated {
            return None;
        }
        auth.user.map(user_to_mobile)
    }

    pub async fn logout(&self) {
        self.app.logout().await;
    }

    pub async fn clear_auth_error(&self) {
        self.app.clear_auth_error().await;
    }

    // --- Theme ---

    pub async fn is_dark_mode(&self) -> bool {
        self.app.snapshot().await.theme.is_dark_mode
    }

    pub async fn toggle_dark_mode(&self) -> bool {
        self.app.toggle_dark_mode().await
    }

    pub async fn set_dark_mode(&self, on: bool) {
        self.app.set_dark_mode(on).await;
    }
}

// File: src/planner.rs
use crate::favourites::Favourites;
use crate::matching::find_connecting_routes;
use crate::model::{Route, RouteKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: u32,
    pub name: String,
    pub kind: RouteKind,
    pub coordinate: Coordinate,
}

impl Station {
    fn new(id: u32, name: &str, kind: RouteKind, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind,
            coordinate: Coordinate {
                latitude,
                longitude,
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self.kind {
            RouteKind::Train => "Train Station",
            _ => "Bus Terminal",
        }
    }
}

/// Sample markers shown on the map screen.
pub fn london_stations() -> Vec<Station> {
    use RouteKind::{Bus, Train};
    vec![
        Station::new(1, "Kings Cross Station", Train, 51.5309, -0.1235),
        Station::new(2, "Victoria Coach Station", Bus, 51.4950, -0.1451),
        Station::new(3, "Paddington Station", Train, 51.5154, -0.1755),
        Station::new(4, "Euston Station", Train, 51.5282, -0.1337),
        Station::new(5, "Liverpool Street Station", Train, 51.5179, -0.0813),
        Station::new(6, "Oxford Street Bus Stop", Bus, 51.5155, -0.1419),
        Station::new(7, "Heathrow Central", Bus, 51.4700, -0.4543),
        Station::new(8, "Victoria Station", Train, 51.4952, -0.1441),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    From,
    To,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    AlreadySaved,
}

/// Adds `route` to favourites unless it is already there.
pub fn save_route(favourites: &mut Favourites, route: Route) -> SaveOutcome {
    if favourites.add(route) {
        SaveOutcome::Saved
    } else {
        SaveOutcome::AlreadySaved
    }
}

/// State of the map screen: which endpoint is being picked, the chosen
/// stations and the route the user settled on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JourneyPlanner {
    from: Option<Station>,
    to: Option<Station>,
    selecting: Option<Endpoint>,
    chosen: Option<Route>,
}

impl JourneyPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_selecting(&mut self, endpoint: Endpoint) {
        self.selecting = Some(endpoint);
    }

    pub fn selecting(&self) -> Option<Endpoint> {
        self.selecting
    }

    /// Returns false when no endpoint was being picked.
    pub fn press_marker(&mut self, station: &Station) -> bool {
        match self.selecting.take() {
            Some(Endpoint::From) => self.from = Some(station.clone()),
            Some(Endpoint::To) => self.to = Some(station.clone()),
            None => return false,
        }
        true
    }

    pub fn from(&self) -> Option<&Station> {
        self.from.as_ref()
    }

    pub fn to(&self) -> Option<&Station> {
        self.to.as_ref()
    }

    pub fn can_search(&self) -> bool {
        self.from.is_some() && self.to.is_some()
    }

    pub fn connecting_routes(&self, routes: &[Route]) -> Vec<Route> {
        match (&self.from, &self.to) {
            (Some(from), Some(to)) => find_connecting_routes(routes, &from.name, &to.name),
            _ => vec![],
        }
    }

    pub fn choose(&mut self, route: Route) {
        self.chosen = Some(route);
    }

    pub fn chosen(&self) -> Option<&Route> {
        self.chosen.as_ref()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// File: src/catalog.rs
use crate::model::{Route, RouteKind, RouteStatus};
use crate::search::{self, SearchFilter};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ROUTE_NOT_FOUND: &str = "Route not found";

/// The three fixed partitions of the route catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub buses: Vec<Route>,
    pub trains: Vec<Route>,
    pub destinations: Vec<Route>,
}

impl Catalog {
    /// Partition a flat list by `type`, keeping the relative order.
    pub fn from_routes(routes: Vec<Route>) -> Self {
        let mut catalog = Self::default();
        for route in routes {
            match route.kind {
                RouteKind::Bus => catalog.buses.push(route),
                RouteKind::Train => catalog.trains.push(route),
                RouteKind::Destination => catalog.destinations.push(route),
            }
        }
        catalog
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog: {:?}", path))?;
        let routes: Vec<Route> = serde_json::from_str(&json)
            .with_context(|| format!("Malformed catalog: {:?}", path))?;
        let mut seen = HashSet::new();
        if let Some(dup) = routes.iter().find(|r| !seen.insert(r.id.as_str())) {
            anyhow::bail!("Duplicate route id {:?} in catalog {:?}", dup.id, path);
        }
        Ok(Self::from_routes(routes))
    }

    /// Buses, then trains, then destinations.
    pub fn all(&self) -> Vec<Route> {
        let mut routes =
            Vec::with_capacity(self.buses.len() + self.trains.len() + self.destinations.len());
        routes.extend(self.buses.iter().cloned());
        routes.extend(self.trains.iter().cloned());
        routes.extend(self.destinations.iter().cloned());
        routes
    }

    pub fn of_kind(&self, kind: RouteKind) -> &[Route] {
        match kind {
            RouteKind::Bus => &self.buses,
            RouteKind::Train => &self.trains,
            RouteKind::Destination => &self.destinations,
        }
    }

    pub fn find(&self, id: &str) -> Option<&Route> {
        self.buses
            .iter()
            .chain(&self.trains)
            .chain(&self.destinations)
            .find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.buses.len() + self.trains.len() + self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Demo data shipped with the app. There is no public Sri Lankan
    /// transport API, so this stands in for one.
    pub fn built_in() -> Self {
        Self {
            buses: built_in_buses(),
            trains: built_in_trains(),
            destinations: built_in_destinations(),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn transport(
    id: &str,
    title: &str,
    description: &str,
    kind: RouteKind,
    status: RouteStatus,
    image: &str,
    duration: &str,
    origin: &str,
    destination: &str,
    price: &str,
    schedule: &[&str],
    rating: f32,
    reviews: u32,
) -> Route {
    let mut r = Route::new(id, title, description, kind, status, image);
    r.duration = Some(duration.to_string());
    r.origin = Some(origin.to_string());
    r.destination = Some(destination.to_string());
    r.price = Some(price.to_string());
    r.schedule = Some(schedule.iter().map(|s| s.to_string()).collect());
    r.rating = Some(rating);
    r.reviews = Some(reviews);
    r
}

fn place(
    id: &str,
    title: &str,
    description: &str,
    status: RouteStatus,
    image: &str,
    rating: f32,
    reviews: u32,
) -> Route {
    let mut r = Route::new(id, title, description, RouteKind::Destination, status, image);
    r.rating = Some(rating);
    r.reviews = Some(reviews);
    r
}

fn built_in_buses() -> Vec<Route> {
    use RouteStatus::*;
    let bus = RouteKind::Bus;
    vec![
        transport(
            "bus-1",
            "Route 138 - Colombo → Kandy",
            "Express highway service via E01",
            bus,
            Active,
            "https://images.unsplash.com/photo-1544620347-c4fd4a3d5957?w=400&h=300&fit=crop",
            "2h 30min",
            "Colombo Central",
            "Kandy Bus Stand",
            "LKR 450",
            &["06:00", "08:00", "10:00", "12:00", "14:00", "16:00", "18:00"],
            4.5,
            234,
        ),
        transport(
            "bus-2",
            "Route 2 - Colombo → Galle",
            "Coastal route via Southern Expressway",
            bus,
            Popular,
            "https://images.unsplash.com/photo-1570125909232-eb263c188f7e?w=400&h=300&fit=crop",
            "1h 45min",
            "Fort Railway Station",
            "Galle Bus Stand",
            "LKR 380",
            &[
                "05:30", "07:00", "09:00", "11:00", "13:00", "15:00", "17:00", "19:00",
            ],
            4.7,
            456,
        ),
        transport(
            "bus-3",
            "Route 48 - Colombo → Negombo",
            "Airport express service",
            bus,
            Active,
            "https://images.unsplash.com/photo-1558618666-fcd25c85cd64?w=400&h=300&fit=crop",
            "45min",
            "Pettah",
            "Negombo Town",
            "LKR 120",
            &["05:00", "06:00", "07:00", "08:00", "09:00", "10:00"],
            4.2,
            189,
        ),
        transport(
            "bus-4",
            "Route 99 - Colombo → Matara",
            "Long-distance coastal journey",
            bus,
            Upcoming,
            "https://images.unsplash.com/photo-1464219789935-c2d9d9aba644?w=400",
            "3h 30min",
            "Colombo Fort",
            "Matara",
            "LKR 550",
            &["06:30", "10:30", "14:30", "18:30"],
            4.0,
            78,
        ),
        transport(
            "bus-5",
            "Route 57 - Colombo → Jaffna",
            "Northern express via A9 highway",
            bus,
            Popular,
            "https://images.unsplash.com/photo-1494515843206-f3117d3f51b7?w=400",
            "6h 00min",
            "Colombo Central",
            "Jaffna",
            "LKR 1200",
            &["06:00", "10:00", "14:00", "22:00"],
            4.3,
            312,
        ),
    ]
}

fn built_in_trains() -> Vec<Route> {
    use RouteStatus::*;
    let train = RouteKind::Train;
    vec![
        transport(
            "train-1",
            "Colombo → Kandy Express",
            "Scenic mountain railway journey",
            train,
            Popular,
            "https://images.unsplash.com/photo-1474487548417-781cb71495f3?w=400&h=300&fit=crop",
            "2h 45min",
            "Colombo Fort",
            "Kandy Station",
            "LKR 280 - 1500",
            &["05:55", "07:00", "10:35", "15:35"],
            4.8,
            892,
        ),
        transport(
            "train-2",
            "Kandy → Ella Scenic",
            "World-famous tea country route",
            train,
            Popular,
            "https://images.unsplash.com/photo-1596422846543-75c6fc197f07?w=400&h=300&fit=crop",
            "6h 30min",
            "Kandy",
            "Ella",
            "LKR 400 - 2000",
            &["08:47", "11:10"],
            4.9,
            1256,
        ),
        transport(
            "train-3",
            "Colombo → Galle Coast Line",
            "Oceanside railway experience",
            train,
            Active,
            "https://images.unsplash.com/photo-1532105956626-9569c03602f6?w=400",
            "2h 30min",
            "Colombo Fort",
            "Galle",
            "LKR 180 - 900",
            &["06:55", "08:30", "12:40", "15:30", "17:45"],
            4.6,
            567,
        ),
        transport(
            "train-4",
            "Colombo → Trincomalee",
            "Eastern coastal route",
            train,
            Active,
            "https://images.unsplash.com/photo-1555952238-b19b7cead9db?w=400",
            "7h 00min",
            "Colombo Fort",
            "Trincomalee",
            "LKR 450 - 1800",
            &["06:05", "21:00"],
            4.4,
            234,
        ),
        transport(
            "train-5",
            "Colombo → Jaffna Express",
            "Northern line intercity",
            train,
            Upcoming,
            "https://images.unsplash.com/photo-1544620347-c4fd4a3d5957?w=400",
            "5h 30min",
            "Colombo Fort",
            "Jaffna",
            "LKR 500 - 2200",
            &["05:45", "18:00"],
            4.5,
            189,
        ),
    ]
}

fn built_in_destinations() -> Vec<Route> {
    use RouteStatus::*;
    vec![
        place(
            "dest-1",
            "Sigiriya Lion Rock",
            "UNESCO World Heritage ancient rock fortress",
            Popular,
            "https://images.unsplash.com/photo-1588598198321-e706c30b37cb?w=400&h=300&fit=crop",
            4.9,
            2341,
        ),
        place(
            "dest-2",
            "Galle Fort",
            "Historic Dutch colonial fortification",
            Popular,
            "https://images.unsplash.com/photo-1586016413664-864c0dd76f53?w=400&h=300&fit=crop",
            4.7,
            1876,
        ),
        place(
            "dest-3",
            "Temple of the Tooth",
            "Sacred Buddhist temple in Kandy",
            Popular,
            "https://images.unsplash.com/photo-1578662996442-48f60103fc96?w=400",
            4.8,
            2156,
        ),
        place(
            "dest-4",
            "Ella Nine Arch Bridge",
            "Iconic colonial-era railway bridge",
            Active,
            "https://images.unsplash.com/photo-1580892727672-29bda0a8321a?w=400",
            4.6,
            1543,
        ),
        place(
            "dest-5",
            "Mirissa Beach",
            "Whale watching and pristine beaches",
            Active,
            "https://images.unsplash.com/photo-1507525428034-b723cf961d3e?w=400",
            4.5,
            987,
        ),
        place(
            "dest-6",
            "Yala National Park",
            "Wildlife safari and leopard spotting",
            Popular,
            "https://images.unsplash.com/photo-1516426122078-c23e76319801?w=400",
            4.7,
            1234,
        ),
        place(
            "dest-7",
            "Adams Peak",
            "Sacred pilgrimage mountain",
            Upcoming,
            "https://images.unsplash.com/photo-1464822759023-fed622ff2c3b?w=400",
            4.8,
            876,
        ),
        place(
            "dest-8",
            "Anuradhapura",
            "Ancient capital and sacred city",
            Active,
            "https://images.unsplash.com/photo-1552465011-b4e21bf6e79a?w=400",
            4.6,
            654,
        ),
    ]
}

/// Simulated network round-trip per request type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    pub list: Duration,
    pub lookup: Duration,
    pub search: Duration,
}

impl Latency {
    pub fn none() -> Self {
        Self {
            list: Duration::ZERO,
            lookup: Duration::ZERO,
            search: Duration::ZERO,
        }
    }
}

impl Default for Latency {
    fn default() -> Self {
        Self {
            list: Duration::from_millis(500),
            lookup: Duration::from_millis(300),
            search: Duration::from_millis(400),
        }
    }
}

#[derive(Debug, Clone)]
pub enum CatalogSource {
    BuiltIn,
    /// Re-read on every request.
    File(PathBuf),
}

/// Async facade over the catalog, shaped like a REST transport API.
#[derive(Debug, Clone)]
pub struct TransportApi {
    source: CatalogSource,
    latency: Latency,
}

impl Default for TransportApi {
    fn default() -> Self {
        Self::new(CatalogSource::BuiltIn, Latency::default())
    }
}

impl TransportApi {
    pub fn new(source: CatalogSource, latency: Latency) -> Self {
        Self { source, latency }
    }

    fn load(&self) -> Result<Catalog, String> {
        match &self.source {
            CatalogSource::BuiltIn => Ok(Catalog::built_in()),
            CatalogSource::File(path) => {
                Catalog::from_json_file(path).map_err(|e| format!("{:#}", e))
            }
        }
    }

    async fn wait(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    pub async fn get_buses(&self) -> Result<Vec<Route>, String> {
        self.wait(self.latency.list).await;
        Ok(self.load()?.buses)
    }

    pub async fn get_trains(&self) -> Result<Vec<Route>, String> {
        self.wait(self.latency.list).await;
        Ok(self.load()?.trains)
    }

    pub async fn get_destinations(&self) -> Result<Vec<Route>, String> {
        self.wait(self.latency.list).await;
        Ok(self.load()?.destinations)
    }

    pub async fn get_all_routes(&self) -> Result<Vec<Route>, String> {
        self.wait(self.latency.list).await;
        Ok(self.load()?.all())
    }

    pub async fn get_route_by_id(&self, id: &str) -> Result<Route, String> {
        self.wait(self.latency.lookup).await;
        self.load()?
            .find(id)
            .cloned()
            .ok_or_else(|| ROUTE_NOT_FOUND.to_string())
    }

    pub async fn search_routes(
        &self,
        query: &str,
        filter: SearchFilter,
    ) -> Result<Vec<Route>, String> {
        self.wait(self.latency.search).await;
        let all = self.load()?.all();
        Ok(search::search(&all, query, filter))
    }
}

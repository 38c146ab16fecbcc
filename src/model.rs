// File: src/model.rs
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    Bus,
    Train,
    Destination,
}

impl RouteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::Bus => "bus",
            RouteKind::Train => "train",
            RouteKind::Destination => "destination",
        }
    }

    /// Buses and trains carry timetables, destinations do not.
    pub fn is_transport(&self) -> bool {
        matches!(self, RouteKind::Bus | RouteKind::Train)
    }
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteStatus {
    Active,
    Popular,
    Upcoming,
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RouteStatus::Active => "Active",
            RouteStatus::Popular => "Popular",
            RouteStatus::Upcoming => "Upcoming",
        };
        f.write_str(s)
    }
}

/// A bus, train or destination record from the catalog.
///
/// Favourites and the selected route hold copies of this struct, so later
/// catalog changes never leak into them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: RouteKind,
    pub status: RouteStatus,
    pub image: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews: Option<u32>,
}

impl Route {
    pub fn new(
        id: &str,
        title: &str,
        description: &str,
        kind: RouteKind,
        status: RouteStatus,
        image: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            kind,
            status,
            image: image.to_string(),
            duration: None,
            origin: None,
            destination: None,
            price: None,
            schedule: None,
            rating: None,
            reviews: None,
        }
    }

    pub fn is_popular(&self) -> bool {
        self.status == RouteStatus::Popular
    }

    /// Parsed departure times. Entries that are not `HH:MM` are skipped.
    pub fn departures(&self) -> Vec<NaiveTime> {
        let Some(schedule) = &self.schedule else {
            return vec![];
        };
        let mut times: Vec<NaiveTime> = schedule
            .iter()
            .filter_map(|s| NaiveTime::parse_from_str(s.trim(), "%H:%M").ok())
            .collect();
        times.sort();
        times
    }

    /// First departure at or after `after`. Wraps to the first departure of
    /// the following day once the last one has gone.
    pub fn next_departure(&self, after: NaiveTime) -> Option<NaiveTime> {
        let times = self.departures();
        times
            .iter()
            .find(|t| **t >= after)
            .or_else(|| times.first())
            .copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// An authenticated user together with the bearer token issued for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub token: String,
}

// File: src/favourites.rs
use crate::model::Route;
use serde::{Deserialize, Serialize};

/// Saved routes, at most one per id, in the order they were saved.
///
/// Entries are snapshots: updating the catalog afterwards does not touch
/// them. Membership checks are linear; the collection stays small.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Favourites {
    #[serde(default)]
    items: Vec<Route>,
}

impl Favourites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from persisted items, dropping repeated ids.
    pub fn from_items(items: Vec<Route>) -> Self {
        let mut favs = Self::new();
        for item in items {
            favs.add(item);
        }
        favs
    }

    pub fn add(&mut self, route: Route) -> bool {
        if self.is_favourite(&route.id) {
            return false;
        }
        self.items.push(route);
        true
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|r| r.id != id);
        self.items.len() != before
    }

    /// Returns true if the route is a favourite afterwards.
    pub fn toggle(&mut self, route: Route) -> bool {
        if self.remove(&route.id) {
            false
        } else {
            self.items.push(route);
            true
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_favourite(&self, id: &str) -> bool {
        self.items.iter().any(|r| r.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Route> {
        self.items.iter().find(|r| r.id == id)
    }

    pub fn items(&self) -> &[Route] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

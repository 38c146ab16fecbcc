// File: src/selection.rs
use crate::model::Route;

/// The route currently open in a detail view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    route: Option<Route>,
}

impl Selection {
    pub fn select(&mut self, route: Route) {
        self.route = Some(route);
    }

    pub fn clear(&mut self) {
        self.route = None;
    }

    pub fn get(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.route.as_ref().is_some_and(|r| r.id == id)
    }
}

// File: src/matching.rs
//! Loose place-name matching used by the journey planner.
//!
//! Catalog origins and destinations are free text ("Kandy Bus Stand",
//! "Colombo Fort") while map stations have their own names ("Kings Cross
//! Station"). Matching drops generic words and then accepts any overlap
//! between the remaining words. It is deliberately forgiving, not precise.

use crate::model::Route;

/// Words too generic to tell two places apart.
pub const STOPLIST: [&str; 5] = ["station", "central", "terminal", "bus", "coach"];

fn significant_words(name: &str) -> Vec<String> {
    name.to_lowercase()
        .split_whitespace()
        .filter(|w| !STOPLIST.contains(w))
        .map(str::to_string)
        .collect()
}

/// True if any significant word of `recorded` contains, is contained in or
/// equals any significant word of `selected`.
pub fn location_matches(recorded: &str, selected: &str) -> bool {
    let recorded_words = significant_words(recorded);
    let selected_words = significant_words(selected);

    recorded_words.iter().any(|rw| {
        selected_words
            .iter()
            .any(|sw| rw.contains(sw.as_str()) || sw.contains(rw.as_str()) || rw == sw)
    })
}

fn endpoint_matches(field: Option<&str>, selected: &str) -> bool {
    field.is_some_and(|f| location_matches(f, selected))
}

/// Routes joining `from` and `to`, recorded in either direction.
///
/// Routes without an origin or destination are never candidates, and an
/// empty endpoint yields no routes at all.
pub fn find_connecting_routes(routes: &[Route], from: &str, to: &str) -> Vec<Route> {
    if from.is_empty() || to.is_empty() {
        return vec![];
    }

    routes
        .iter()
        .filter(|r| {
            let origin = r.origin.as_deref();
            let destination = r.destination.as_deref();
            let forward = endpoint_matches(origin, from) && endpoint_matches(destination, to);
            let reverse = endpoint_matches(destination, from) && endpoint_matches(origin, to);
            forward || reverse
        })
        .cloned()
        .collect()
}

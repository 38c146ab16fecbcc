// File: src/search.rs
use crate::model::{Route, RouteKind};
use std::fmt;

/// "Nearby" is not geographic: it keeps this many leading catalog entries.
pub const NEARBY_LIMIT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SearchFilter {
    #[default]
    All,
    Buses,
    Trains,
    Destinations,
    Popular,
    Nearby,
    Timetables,
}

impl SearchFilter {
    pub const ALL: [SearchFilter; 7] = [
        SearchFilter::All,
        SearchFilter::Buses,
        SearchFilter::Trains,
        SearchFilter::Destinations,
        SearchFilter::Popular,
        SearchFilter::Nearby,
        SearchFilter::Timetables,
    ];

    /// Unknown labels fall back to `All`.
    pub fn parse(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|f| f.label() == label)
            .unwrap_or_default()
    }

    pub fn label(&self) -> &'static str {
        match self {
            SearchFilter::All => "All",
            SearchFilter::Buses => "Buses",
            SearchFilter::Trains => "Trains",
            SearchFilter::Destinations => "Destinations",
            SearchFilter::Popular => "Popular",
            SearchFilter::Nearby => "Nearby",
            SearchFilter::Timetables => "Timetables",
        }
    }

    fn apply(&self, routes: &[Route]) -> Vec<Route> {
        match self {
            SearchFilter::All => routes.to_vec(),
            SearchFilter::Buses => keep(routes, |r| r.kind == RouteKind::Bus),
            SearchFilter::Trains => keep(routes, |r| r.kind == RouteKind::Train),
            SearchFilter::Destinations => keep(routes, |r| r.kind == RouteKind::Destination),
            SearchFilter::Popular => keep(routes, Route::is_popular),
            SearchFilter::Nearby => routes.iter().take(NEARBY_LIMIT).cloned().collect(),
            SearchFilter::Timetables => keep(routes, |r| r.kind.is_transport()),
        }
    }
}

impl fmt::Display for SearchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn keep(routes: &[Route], pred: impl Fn(&Route) -> bool) -> Vec<Route> {
    routes.iter().filter(|r| pred(r)).cloned().collect()
}

fn text_matches(route: &Route, needle: &str) -> bool {
    let hit = |s: &str| s.to_lowercase().contains(needle);
    hit(&route.title)
        || hit(&route.description)
        || route.origin.as_deref().is_some_and(hit)
        || route.destination.as_deref().is_some_and(hit)
}

/// Filter first, then free-text match on title, description, origin and
/// destination. Order of `all_routes` is preserved.
///
/// The blank check trims the query but matching uses it as typed, so a
/// trailing space still has to appear in the text.
pub fn search(all_routes: &[Route], query: &str, filter: SearchFilter) -> Vec<Route> {
    let routes = filter.apply(all_routes);

    if query.trim().is_empty() {
        return routes;
    }

    let needle = query.to_lowercase();
    routes
        .into_iter()
        .filter(|r| text_matches(r, &needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::model::RouteStatus;

    fn ids(routes: &[Route]) -> Vec<&str> {
        routes.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_parse_labels_and_fallback() {
        assert_eq!(SearchFilter::parse("Trains"), SearchFilter::Trains);
        assert_eq!(SearchFilter::parse("Timetables"), SearchFilter::Timetables);
        assert_eq!(SearchFilter::parse("Ferries"), SearchFilter::All);
        assert_eq!(SearchFilter::parse(""), SearchFilter::All);
        for f in SearchFilter::ALL {
            assert_eq!(SearchFilter::parse(f.label()), f);
        }
    }

    #[test]
    fn test_empty_query_all_returns_catalog_in_order() {
        let all = Catalog::built_in().all();
        assert_eq!(search(&all, "", SearchFilter::All), all);
        assert_eq!(search(&all, "   ", SearchFilter::All), all);
    }

    #[test]
    fn test_kind_filters() {
        let all = Catalog::built_in().all();
        let buses = search(&all, "", SearchFilter::Buses);
        assert_eq!(buses.len(), 5);
        assert!(buses.iter().all(|r| r.kind == RouteKind::Bus));

        let places = search(&all, "", SearchFilter::Destinations);
        assert_eq!(places.len(), 8);

        let timetabled = search(&all, "", SearchFilter::Timetables);
        assert_eq!(timetabled.len(), 10);
        assert!(timetabled.iter().all(|r| r.kind != RouteKind::Destination));
    }

    #[test]
    fn test_popular_is_a_predicate_subset() {
        let all = Catalog::built_in().all();
        let popular = search(&all, "", SearchFilter::Popular);
        assert!(!popular.is_empty());
        assert!(popular.iter().all(|r| r.status == RouteStatus::Popular));
        assert!(popular.iter().all(|r| all.contains(r)));
        let expected = all.iter().filter(|r| r.is_popular()).count();
        assert_eq!(popular.len(), expected);
    }

    #[test]
    fn test_nearby_is_first_four() {
        let all = Catalog::built_in().all();
        let near = search(&all, "", SearchFilter::Nearby);
        assert_eq!(ids(&near), vec!["bus-1", "bus-2", "bus-3", "bus-4"]);

        let short = &all[..2];
        assert_eq!(search(short, "", SearchFilter::Nearby).len(), 2);
    }

    #[test]
    fn test_query_matches_title_case_insensitively() {
        let all = Catalog::built_in().all();
        let hits = search(&all, "kandy", SearchFilter::All);
        assert!(ids(&hits).contains(&"train-1"));
        // "Sacred Buddhist temple in Kandy" matches on description
        assert!(ids(&hits).contains(&"dest-3"));
    }

    #[test]
    fn test_query_matches_origin_and_destination() {
        let all = Catalog::built_in().all();
        assert_eq!(ids(&search(&all, "pettah", SearchFilter::All)), vec!["bus-3"]);
        assert_eq!(
            ids(&search(&all, "negombo town", SearchFilter::Buses)),
            vec!["bus-3"]
        );
    }

    #[test]
    fn test_filter_applies_before_query() {
        let all = Catalog::built_in().all();
        let hits = search(&all, "galle", SearchFilter::Trains);
        assert_eq!(ids(&hits), vec!["train-3"]);
        assert!(search(&all, "sigiriya", SearchFilter::Buses).is_empty());
    }

    #[test]
    fn test_missing_optional_fields_do_not_match() {
        let r = Route::new(
            "dest-x",
            "Beach",
            "Sand",
            RouteKind::Destination,
            RouteStatus::Active,
            "",
        );
        assert!(search(&[r], "colombo", SearchFilter::All).is_empty());
    }
}

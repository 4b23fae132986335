//! Demo routes compiled into the binary.
//!
//! The dataset is keyed by canonical route id. Unknown ids resolve to the route
//! under [DEFAULT_ROUTE_ID].
use crate::route::{canonical_id, Route, Waypoint};
use lazy_static::lazy_static;
use rustc_hash::FxHashMap;
use serde::Deserialize;

/// Route served when the requested id is not part of the bundled dataset.
pub const DEFAULT_ROUTE_ID: &str = "INR12627";

const FALLBACK_JSON: &str = include_str!("../data/fallback_routes.json");

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FallbackEntry {
    id: String,
    display_name: String,
    #[serde(default)]
    delay_minutes: i64,
    waypoints: Vec<Waypoint>,
}

fn parse_fallback_routes(json: &str) -> Result<FxHashMap<String, Route>, String> {
    let entries: Vec<FallbackEntry> = serde_json::from_str(json).map_err(|e| e.to_string())?;
    let mut routes = FxHashMap::default();
    for entry in entries {
        let route = Route::new(
            &entry.id,
            entry.display_name,
            entry.delay_minutes,
            entry.waypoints,
        )
        .map_err(|e| e.to_string())?;
        routes.insert(route.id().to_string(), route);
    }
    if !routes.contains_key(DEFAULT_ROUTE_ID) {
        return Err(format!("default route {DEFAULT_ROUTE_ID} missing"));
    }
    Ok(routes)
}

lazy_static! {
    // A broken bundled file is a build defect; the tests below catch it.
    static ref FALLBACK_ROUTES: FxHashMap<String, Route> =
        parse_fallback_routes(FALLBACK_JSON).expect("bundled fallback routes are invalid");
}

/// The bundled route for `id`, or the default demo route when there is none.
pub fn fallback_route(id: &str) -> Route {
    let routes = &*FALLBACK_ROUTES;
    routes
        .get(&canonical_id(id))
        .or_else(|| routes.get(DEFAULT_ROUTE_ID))
        .cloned()
        .expect("default route present after parsing")
}

/// Whether `id` has its own entry in the bundled dataset.
pub fn has_fallback_route(id: &str) -> bool {
    FALLBACK_ROUTES.contains_key(&canonical_id(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_dataset_is_valid() {
        let routes = parse_fallback_routes(FALLBACK_JSON).unwrap();
        assert!(routes.len() >= 2);
        for route in routes.values() {
            assert!(route.waypoints().len() >= 2, "{}", route.id());
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert!(has_fallback_route("inr12951"));
        let route = fallback_route("inr12951");
        assert_eq!(route.id(), "INR12951");
        assert_eq!(route.waypoints().last().unwrap().code, "NDLS");
    }

    #[test]
    fn unknown_id_gets_default_route() {
        assert!(!has_fallback_route("INR00000"));
        let route = fallback_route("INR00000");
        assert_eq!(route.id(), DEFAULT_ROUTE_ID);
        assert_eq!(route.waypoints().len(), 5);
    }

    #[test]
    fn missing_default_is_rejected() {
        let json = r#"[{"id":"X1","displayName":"x","waypoints":[
            {"code":"A","name":"A","lat":0.0,"lng":0.0},
            {"code":"B","name":"B","lat":1.0,"lng":1.0}]}]"#;
        assert!(parse_fallback_routes(json).is_err());
    }
}

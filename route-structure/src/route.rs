use geo_types::Coord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A geographic coordinate in degrees.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct LatLng {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

impl LatLng {
    /// Builds a coordinate from a latitude/longitude pair
    pub fn from_lat_lng(lat: f64, lng: f64) -> Self {
        Self {
            latitude: lat,
            longitude: lng,
        }
    }
}

impl From<LatLng> for Coord {
    fn from(p: LatLng) -> Self {
        Coord {
            x: p.longitude,
            y: p.latitude,
        }
    }
}

/// A named stop on a route. The position in [Route::waypoints] is the travel order.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    /// Station code, e.g. `CSMT`
    pub code: String,
    /// Human readable station name
    pub name: String,
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
    /// Timetabled time, free-form (`HH:MM` in the bundled data); may be empty
    #[serde(default)]
    pub scheduled_time: String,
    /// Reported time, free-form; may be empty
    #[serde(default)]
    pub actual_time: String,
}

impl Waypoint {
    /// Coordinates of this waypoint
    pub fn position(&self) -> LatLng {
        LatLng::from_lat_lng(self.lat, self.lng)
    }
}

/// Reasons a [Route] cannot be built.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RouteError {
    /// The route identifier is blank
    #[error("route id is empty")]
    EmptyId,
    /// A route needs somewhere to start from and somewhere to head to
    #[error("route {id} has {count} waypoint(s), at least 2 are required")]
    TooFewWaypoints {
        /// Route id as given
        id: String,
        /// Number of waypoints supplied
        count: usize,
    },
}

/// An ordered waypoint sequence plus metadata.
///
/// Always holds at least two waypoints, so there is always a segment to
/// progress along and animate over.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    id: String,
    display_name: String,
    delay_minutes: i64,
    waypoints: Vec<Waypoint>,
}

impl Route {
    /// Builds a route, canonicalising the id to upper case.
    pub fn new(
        id: &str,
        display_name: impl Into<String>,
        delay_minutes: i64,
        waypoints: Vec<Waypoint>,
    ) -> Result<Route, RouteError> {
        let id = canonical_id(id);
        if id.is_empty() {
            return Err(RouteError::EmptyId);
        }
        if waypoints.len() < 2 {
            return Err(RouteError::TooFewWaypoints {
                id,
                count: waypoints.len(),
            });
        }
        Ok(Route {
            id,
            display_name: display_name.into(),
            delay_minutes,
            waypoints,
        })
    }

    /// Canonical (upper case) identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name shown to users
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Reported delay; 0 when on time or unknown
    pub fn delay_minutes(&self) -> i64 {
        self.delay_minutes
    }

    /// Waypoints in travel order, never fewer than two
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }
}

/// Route identifiers are case-insensitive; this is the form used as a key.
pub fn canonical_id(id: &str) -> String {
    id.trim().to_ascii_uppercase()
}

//! Live route data over HTTP.
//!
//! The [`RouteProvider`] trait is the seam between [`RouteSource`] and the
//! network, so the fallback policy can be exercised without one.
//! [`HttpRouteProvider`] fetches a JSON document from a URL template in which
//! `{id}` is replaced by the route identifier.
//!
//! [`RouteSource`]: crate::route_source::RouteSource

use std::future::Future;

use log::debug;
use route_structure::{Route, RouteError, Waypoint};
use serde::Deserialize;

use crate::error::SourceError;

/// Placeholder substituted with the route id in the URL template.
pub const ROUTE_ID_PLACEHOLDER: &str = "{id}";

/// Raw live payload. Only `id` and `stations` are mandatory.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LivePayload {
    pub id: Option<String>,
    pub name: Option<String>,
    pub delay_minutes: Option<i64>,
    pub stations: Option<Vec<LiveStation>>,
}

/// One stop of a live payload; only the coordinates are mandatory.
#[derive(Deserialize, Debug)]
pub struct LiveStation {
    pub code: Option<String>,
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub scheduled: Option<String>,
    pub actual: Option<String>,
}

/// Source of live route payloads, keyed by canonical route id.
pub trait RouteProvider: Send + Sync {
    /// Fetch the live payload for `route_id`.
    fn fetch(&self, route_id: &str) -> impl Future<Output = Result<LivePayload, SourceError>> + Send;
}

/// Validates a live payload and maps it into a [`Route`].
pub fn map_payload(payload: LivePayload) -> Result<Route, SourceError> {
    let id = payload
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| SourceError::SchemaMismatch("missing route id".to_string()))?;
    let stations = payload
        .stations
        .ok_or_else(|| SourceError::SchemaMismatch("missing stations".to_string()))?;

    let waypoints = stations
        .into_iter()
        .enumerate()
        .map(|(i, station)| map_station(i, station))
        .collect::<Result<Vec<Waypoint>, SourceError>>()?;

    let display_name = payload.name.unwrap_or_else(|| id.clone());
    Route::new(&id, display_name, payload.delay_minutes.unwrap_or(0), waypoints).map_err(|e| {
        match e {
            RouteError::EmptyId => SourceError::SchemaMismatch(e.to_string()),
            RouteError::TooFewWaypoints { count, .. } => {
                SourceError::EmptyRoute { waypoints: count }
            }
        }
    })
}

fn map_station(index: usize, station: LiveStation) -> Result<Waypoint, SourceError> {
    let (Some(lat), Some(lng)) = (station.lat, station.lng) else {
        return Err(SourceError::SchemaMismatch(format!(
            "station {index} has no coordinates"
        )));
    };
    if !lat.is_finite() || !lng.is_finite() {
        return Err(SourceError::SchemaMismatch(format!(
            "station {index} has non-finite coordinates"
        )));
    }
    let code = station.code.unwrap_or_default();
    Ok(Waypoint {
        name: station.name.unwrap_or_else(|| code.clone()),
        code,
        lat,
        lng,
        scheduled_time: station.scheduled.unwrap_or_default(),
        actual_time: station.actual.unwrap_or_default(),
    })
}

pub struct HttpRouteProvider {
    http: reqwest::Client,
    url_template: String,
    bearer_token: Option<String>,
}

impl HttpRouteProvider {
    pub fn new(url_template: String, bearer_token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url_template,
            bearer_token,
        }
    }

    pub fn url_for(&self, route_id: &str) -> String {
        self.url_template.replace(ROUTE_ID_PLACEHOLDER, route_id)
    }
}

impl RouteProvider for HttpRouteProvider {
    async fn fetch(&self, route_id: &str) -> Result<LivePayload, SourceError> {
        let mut request = self.http.get(self.url_for(route_id));
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        debug!("Live payload for {route_id}: {} bytes", bytes.len());

        Ok(serde_json::from_slice(&bytes)?)
    }
}

use log::warn;
use route_structure::fallback::{fallback_route, has_fallback_route};
use route_structure::{canonical_id, Route};

use crate::error::SourceError;
use crate::live_provider::{map_payload, RouteProvider};

/// Yields a [`Route`] per poll, from the live provider when one is configured
/// and from the bundled dataset otherwise or when the live attempt fails.
pub struct RouteSource<P> {
    live: Option<P>,
}

impl<P: RouteProvider> RouteSource<P> {
    pub fn new(live: Option<P>) -> Self {
        Self { live }
    }

    pub fn has_live_provider(&self) -> bool {
        self.live.is_some()
    }

    /// Never fails: every failure path resolves to a fallback route.
    pub async fn fetch_route(&self, route_id: &str) -> Route {
        let Some(provider) = &self.live else {
            return fallback_route(route_id);
        };

        match fetch_live(provider, route_id).await {
            Ok(route) => route,
            Err(e) => {
                let route = fallback_route(route_id);
                if has_fallback_route(route_id) {
                    warn!("Live data for {route_id} unavailable ({e}), using bundled route");
                } else {
                    warn!(
                        "Live data for {route_id} unavailable ({e}), using default demo route {}",
                        route.id()
                    );
                }
                route
            }
        }
    }
}

async fn fetch_live<P: RouteProvider>(provider: &P, route_id: &str) -> Result<Route, SourceError> {
    let payload = provider.fetch(&canonical_id(route_id)).await?;
    map_payload(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live_provider::LivePayload;
    use route_structure::fallback::DEFAULT_ROUTE_ID;

    /// Serves a fixed JSON document, or a network failure when `None`.
    struct FixedProvider(Option<&'static str>);

    impl RouteProvider for FixedProvider {
        async fn fetch(&self, _route_id: &str) -> Result<LivePayload, SourceError> {
            match self.0 {
                Some(json) => Ok(serde_json::from_str(json)?),
                None => Err(SourceError::NetworkFailure("connection refused".to_string())),
            }
        }
    }

    #[tokio::test]
    async fn without_provider_returns_fallback_for_id() {
        let source: RouteSource<FixedProvider> = RouteSource::new(None);
        assert!(!source.has_live_provider());

        let first = source.fetch_route("inr12951").await;
        let second = source.fetch_route("INR12951").await;
        assert_eq!(first.id(), "INR12951");
        assert!(first.waypoints().len() >= 2);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn unknown_id_without_provider_gets_default() {
        let source: RouteSource<FixedProvider> = RouteSource::new(None);
        let route = source.fetch_route("nope42").await;
        assert_eq!(route.id(), DEFAULT_ROUTE_ID);
    }

    #[tokio::test]
    async fn live_route_is_used_when_valid() {
        let source = RouteSource::new(Some(FixedProvider(Some(
            r#"{"id":"INR777","name":"Live","stations":[
                {"code":"A","lat":10.0,"lng":70.0},
                {"code":"B","lat":11.0,"lng":71.0},
                {"code":"C","lat":12.0,"lng":72.0}]}"#,
        ))));
        let route = source.fetch_route("inr777").await;
        assert_eq!(route.id(), "INR777");
        assert_eq!(route.waypoints().len(), 3);
    }

    #[tokio::test]
    async fn payload_without_stations_falls_back() {
        let source = RouteSource::new(Some(FixedProvider(Some(r#"{"id":"INR12951"}"#))));
        let route = source.fetch_route("INR12951").await;
        assert_eq!(route, fallback_route("INR12951"));
    }

    #[tokio::test]
    async fn empty_live_route_falls_back() {
        let source = RouteSource::new(Some(FixedProvider(Some(
            r#"{"id":"INR12627","stations":[]}"#,
        ))));
        let route = source.fetch_route("INR12627").await;
        assert_eq!(route, fallback_route("INR12627"));
    }

    #[tokio::test]
    async fn network_failure_and_garbage_fall_back() {
        let down = RouteSource::new(Some(FixedProvider(None)));
        assert_eq!(down.fetch_route("x").await.id(), DEFAULT_ROUTE_ID);

        let garbage = RouteSource::new(Some(FixedProvider(Some("<html>502</html>"))));
        assert_eq!(garbage.fetch_route("INR12951").await.id(), "INR12951");
    }
}

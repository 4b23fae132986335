//! Periodic orchestration: fetch route, step the cursor, project the ETA and
//! hand a render event to the presentation side.
//!
//! Polls run one at a time inside the loop task. Ticks missed while a slow
//! fetch is in progress are skipped rather than queued, so polls never
//! overlap. Cursor reads and writes may touch disk, so they run on the
//! blocking pool and leave the runtime thread to the frame ticker and the
//! HTTP server.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use futures::FutureExt;
use log::{debug, info, warn};
use route_structure::Route;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::animator::AnimationFrame;
use crate::configuration::Configuration;
use crate::eta::{self, Eta};
use crate::live_provider::RouteProvider;
use crate::progress::ProgressEstimator;
use crate::route_source::RouteSource;

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RenderEvent {
    pub route: Route,
    pub current_index: usize,
    pub eta: Eta,
    pub frame: AnimationFrame,
    pub polled_at: DateTime<Utc>,
}

#[derive(Debug)]
pub enum EngineEvent {
    Render(RenderEvent),
    /// Non-fatal, user-visible problem with one poll cycle
    Notice(String),
}

pub struct PollLoop<P> {
    route_id: String,
    source: RouteSource<P>,
    estimator: Arc<ProgressEstimator>,
    poll_interval: std::time::Duration,
    animation_duration: Duration,
    cruise_speed_kmph: f64,
    events: mpsc::Sender<EngineEvent>,
}

impl<P: RouteProvider + 'static> PollLoop<P> {
    pub fn new(
        config: &Configuration,
        source: RouteSource<P>,
        estimator: ProgressEstimator,
        events: mpsc::Sender<EngineEvent>,
    ) -> Self {
        Self {
            route_id: config.route_id.clone(),
            source,
            estimator: Arc::new(estimator),
            poll_interval: config.poll_interval,
            animation_duration: config.animation_duration,
            cruise_speed_kmph: config.cruise_speed_kmph,
            events,
        }
    }

    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(self) {
        info!(
            "Tracking {} every {}s (live provider: {})",
            self.route_id,
            self.poll_interval.as_secs(),
            self.source.has_live_provider()
        );

        // The first tick completes immediately.
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            let event = match AssertUnwindSafe(self.poll_once()).catch_unwind().await {
                Ok(Ok(render)) => {
                    info!(
                        "{}: departed {} ({}/{}), {:.1} km to go, ETA {}",
                        render.route.id(),
                        render.route.waypoints()[render.current_index].code,
                        render.current_index + 1,
                        render.route.waypoints().len(),
                        render.eta.remaining_km,
                        render.eta.eta.to_rfc3339()
                    );
                    EngineEvent::Render(render)
                }
                Ok(Err(e)) => {
                    warn!("Poll for {} failed: {e:#}", self.route_id);
                    EngineEvent::Notice(format!("Could not update {}: {e}", self.route_id))
                }
                Err(panic) => {
                    let reason = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    warn!("Poll for {} panicked: {reason}", self.route_id);
                    EngineEvent::Notice(format!("Could not update {}: {reason}", self.route_id))
                }
            };

            if self.events.send(event).await.is_err() {
                debug!("Event receiver dropped, stopping poll loop");
                break;
            }
        }

        info!("Stopped tracking {}", self.route_id);
    }

    pub async fn poll_once(&self) -> Result<RenderEvent> {
        let route = self.source.fetch_route(&self.route_id).await;

        let estimator = Arc::clone(&self.estimator);
        let (route_id, waypoint_count) = (route.id().to_string(), route.waypoints().len());
        let current_index = tokio::task::spawn_blocking(move || {
            estimator
                .advance(&route_id, waypoint_count)
                .with_context(|| format!("Advance cursor for {route_id}"))
        })
        .await
        .context("Cursor task did not complete")??;

        Ok(self.render(route, current_index, Utc::now()))
    }

    /// ETA and animation frame for a route whose cursor is at `current_index`.
    fn render(&self, route: Route, current_index: usize, now: DateTime<Utc>) -> RenderEvent {
        let waypoints = route.waypoints();
        let eta = eta::compute(waypoints, current_index, now, self.cruise_speed_kmph);

        let from = &waypoints[current_index];
        let to = waypoints.get(current_index + 1).unwrap_or(from);
        let frame = AnimationFrame::new(
            from.position(),
            to.position(),
            self.animation_duration,
            now,
        );

        RenderEvent {
            route,
            current_index,
            eta,
            frame,
            polled_at: now,
        }
    }
}

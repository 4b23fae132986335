//! Presentation side of the engine.
//!
//! Consumes [`EngineEvent`]s from the poll loop and owns the
//! [`PositionAnimator`]. The frame ticker reads the animator on its own
//! schedule, so redraws are independent of the poll cadence.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::Mutex;
use route_structure::LatLng;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::animator::PositionAnimator;
use crate::eta::Countdown;
use crate::poll_loop::{EngineEvent, RenderEvent};

#[derive(Default)]
pub struct DisplayState {
    latest: Option<RenderEvent>,
    animator: PositionAnimator,
    last_notice: Option<String>,
}

pub type SharedDisplay = Arc<Mutex<DisplayState>>;

#[derive(Serialize, Debug, PartialEq)]
pub struct PositionView {
    pub position: LatLng,
    pub countdown: String,
    pub arrived: bool,
}

impl DisplayState {
    pub fn apply(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Render(render) => {
                let frame = render.frame;
                self.animator
                    .begin(frame.from, frame.to, frame.duration, frame.start);
                self.latest = Some(render);
                // a successful poll supersedes any earlier failure
                self.last_notice = None;
            }
            EngineEvent::Notice(msg) => {
                self.last_notice = Some(msg);
            }
        }
    }

    pub fn latest(&self) -> Option<&RenderEvent> {
        self.latest.as_ref()
    }

    pub fn last_notice(&self) -> Option<&str> {
        self.last_notice.as_deref()
    }

    /// Interpolated position and countdown at `now`; `None` before the first render.
    pub fn view_at(&self, now: DateTime<Utc>) -> Option<PositionView> {
        let latest = self.latest.as_ref()?;
        let position = self.animator.position_at(now)?;
        let countdown = latest.eta.countdown(now);
        Some(PositionView {
            position,
            countdown: countdown.to_string(),
            arrived: countdown == Countdown::Arrived,
        })
    }
}

pub async fn consume_events(display: SharedDisplay, mut events: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = events.recv().await {
        match &event {
            EngineEvent::Render(render) => info!(
                "Showing {} ({}), delay {} min",
                render.route.display_name(),
                render.route.id(),
                render.route.delay_minutes()
            ),
            EngineEvent::Notice(msg) => warn!("{msg}"),
        }
        display.lock().apply(event);
    }
    debug!("Engine event channel closed");
}

pub fn start_frame_ticker(
    display: SharedDisplay,
    period: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Some(view) = display.lock().view_at(Utc::now()) {
                debug!(
                    "Position {:.5},{:.5} - {}",
                    view.position.latitude, view.position.longitude, view.countdown
                );
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animator::AnimationFrame;
    use crate::eta::Eta;
    use chrono::{Duration, TimeZone};
    use route_structure::fallback::fallback_route;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
    }

    fn render(index: usize) -> RenderEvent {
        let route = fallback_route("INR12627");
        let from = route.waypoints()[index].position();
        let to = route.waypoints()[index + 1].position();
        RenderEvent {
            route,
            current_index: index,
            eta: Eta {
                remaining_km: 100.0,
                eta: t0() + Duration::minutes(90),
            },
            frame: AnimationFrame::new(from, to, Duration::seconds(30), t0()),
            polled_at: t0(),
        }
    }

    #[test]
    fn nothing_to_show_before_first_render() {
        let mut state = DisplayState::default();
        assert!(state.view_at(t0()).is_none());
        state.apply(EngineEvent::Notice("offline".to_string()));
        assert!(state.view_at(t0()).is_none());
        assert_eq!(state.last_notice(), Some("offline"));
    }

    #[test]
    fn render_starts_animation_and_countdown() {
        let mut state = DisplayState::default();
        state.apply(EngineEvent::Render(render(0)));

        let view = state.view_at(t0() + Duration::seconds(60)).unwrap();
        assert_eq!(view.position, render(0).frame.to);
        assert_eq!(view.countdown, "01:29:00");
        assert!(!view.arrived);

        let done = state.view_at(t0() + Duration::hours(2)).unwrap();
        assert!(done.arrived);
        assert_eq!(done.countdown, "Arrived");
    }

    #[test]
    fn successful_render_clears_notice() {
        let mut state = DisplayState::default();
        state.apply(EngineEvent::Render(render(0)));
        state.apply(EngineEvent::Notice("feed down".to_string()));
        assert_eq!(state.last_notice(), Some("feed down"));
        assert_eq!(state.latest().unwrap().current_index, 0);

        state.apply(EngineEvent::Render(render(1)));
        assert_eq!(state.last_notice(), None);
    }

    #[test]
    fn newer_render_replaces_animation() {
        let mut state = DisplayState::default();
        state.apply(EngineEvent::Render(render(0)));
        state.apply(EngineEvent::Render(render(1)));
        assert_eq!(state.latest().unwrap().current_index, 1);
        assert_eq!(
            state.view_at(t0()).unwrap().position,
            render(1).frame.from
        );
    }

    #[tokio::test]
    async fn consumer_applies_events_until_channel_closes() {
        let display = SharedDisplay::default();
        let (tx, rx) = mpsc::channel(4);
        tx.send(EngineEvent::Render(render(2))).await.unwrap();
        tx.send(EngineEvent::Notice("slow feed".to_string())).await.unwrap();
        drop(tx);

        consume_events(display.clone(), rx).await;
        let state = display.lock();
        assert_eq!(state.latest().unwrap().current_index, 2);
        assert_eq!(state.last_notice(), Some("slow feed"));
    }
}

use anyhow::Result;
use log::debug;
use route_structure::canonical_id;

use crate::progress_store::{ProgressState, ProgressStore};

/// Persistent cursor over a route's waypoints.
///
/// This is parity stepping rather than real telemetry: the cursor moves one
/// waypoint every second call and stops on the last segment, so there is
/// always a next waypoint to head for.
pub struct ProgressEstimator {
    store: Box<dyn ProgressStore>,
}

impl ProgressEstimator {
    pub fn new(store: Box<dyn ProgressStore>) -> Self {
        Self { store }
    }

    /// Steps the cursor for `route_id` and returns the index of the waypoint
    /// most recently departed, always within `[0, waypoint_count - 2]`.
    pub fn advance(&self, route_id: &str, waypoint_count: usize) -> Result<usize> {
        let key = canonical_id(route_id);
        let last_segment = waypoint_count.saturating_sub(2);

        let mut state = self.store.get(&key)?.unwrap_or_default();
        // The route may have shrunk since the state was written.
        state.waypoint_index = state.waypoint_index.min(last_segment);

        state.parity_toggle ^= 1;
        if state.parity_toggle == 0 && state.waypoint_index < last_segment {
            state.waypoint_index += 1;
        }

        self.store.set(&key, state)?;
        debug!(
            "Cursor for {key}: index {} parity {}",
            state.waypoint_index,
            state.parity_toggle
        );
        Ok(state.waypoint_index)
    }

    pub fn state(&self, route_id: &str) -> Result<Option<ProgressState>> {
        self.store.get(&canonical_id(route_id))
    }
}

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Duration, Utc};
use route_structure::Waypoint;
use serde::Serialize;

use crate::geo_math::path_distance_km;

pub const DEFAULT_CRUISE_SPEED_KMPH: f64 = 70.0;

#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Eta {
    pub remaining_km: f64,
    pub eta: DateTime<Utc>,
}

/// Remaining distance from `waypoints[current_index]` to the end of the route
/// and the arrival time at a constant `cruise_speed_kmph`, which must be > 0.
pub fn compute(
    waypoints: &[Waypoint],
    current_index: usize,
    now: DateTime<Utc>,
    cruise_speed_kmph: f64,
) -> Eta {
    let remaining = waypoints.get(current_index..).unwrap_or_default();
    let remaining_km = path_distance_km(remaining.iter().map(Waypoint::position));
    let travel_hours = remaining_km / cruise_speed_kmph;
    let travel_ms = (travel_hours * 3600.0 * 1000.0).round() as i64;

    Eta {
        remaining_km,
        eta: now + Duration::milliseconds(travel_ms),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Countdown {
    Remaining(Duration),
    Arrived,
}

impl Eta {
    /// Derived on every presentation tick, never stored.
    pub fn countdown(&self, now: DateTime<Utc>) -> Countdown {
        let left = self.eta - now;
        if left > Duration::zero() {
            Countdown::Remaining(left)
        } else {
            Countdown::Arrived
        }
    }
}

impl Display for Countdown {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Countdown::Arrived => f.write_str("Arrived"),
            Countdown::Remaining(left) => {
                let secs = left.num_seconds();
                f.write_fmt(format_args!(
                    "{:02}:{:02}:{:02}",
                    secs / 3600,
                    (secs % 3600) / 60,
                    secs % 60
                ))
            }
        }
    }
}

use chrono::{DateTime, Duration, Utc};
use route_structure::LatLng;
use serde::Serialize;

/// One straight-line movement between two coordinates.
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnimationFrame {
    pub from: LatLng,
    pub to: LatLng,
    pub start: DateTime<Utc>,
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(d.num_milliseconds())
}

impl AnimationFrame {
    pub fn new(from: LatLng, to: LatLng, duration: Duration, start: DateTime<Utc>) -> Self {
        AnimationFrame {
            from,
            to,
            start,
            duration,
        }
    }

    /// Fraction of the movement completed at `now`, clamped to `[0, 1]`.
    pub fn progress(&self, now: DateTime<Utc>) -> f64 {
        let total = self.duration.num_milliseconds();
        if total <= 0 {
            return 1.0;
        }
        let elapsed = (now - self.start).num_milliseconds();
        (elapsed as f64 / total as f64).clamp(0.0, 1.0)
    }

    pub fn position_at(&self, now: DateTime<Utc>) -> LatLng {
        let p = self.progress(now);
        if p >= 1.0 {
            return self.to;
        }
        LatLng {
            latitude: self.from.latitude + (self.to.latitude - self.from.latitude) * p,
            longitude: self.from.longitude + (self.to.longitude - self.from.longitude) * p,
        }
    }
}

/// Holds at most one in-flight frame. A new frame replaces the old one outright,
/// with no blending.
#[derive(Default, Debug)]
pub struct PositionAnimator {
    frame: Option<AnimationFrame>,
}

impl PositionAnimator {
    pub fn begin(&mut self, from: LatLng, to: LatLng, duration: Duration, now: DateTime<Utc>) {
        self.frame = Some(AnimationFrame::new(from, to, duration, now));
    }

    /// `None` until the first frame has begun.
    pub fn position_at(&self, now: DateTime<Utc>) -> Option<LatLng> {
        self.frame.as_ref().map(|f| f.position_at(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const CSMT: LatLng = LatLng {
        latitude: 19.0760,
        longitude: 72.8777,
    };
    const PUNE: LatLng = LatLng {
        latitude: 18.5204,
        longitude: 73.8567,
    };

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 8, 0, 0).unwrap()
    }

    #[test]
    fn nothing_to_show_before_first_frame() {
        assert_eq!(PositionAnimator::default().position_at(start()), None);
    }

    #[test]
    fn midpoint_and_end() {
        let mut animator = PositionAnimator::default();
        animator.begin(CSMT, PUNE, Duration::milliseconds(4000), start());

        let mid = animator
            .position_at(start() + Duration::milliseconds(2000))
            .unwrap();
        assert!((mid.latitude - (CSMT.latitude + PUNE.latitude) / 2.0).abs() < 1e-12);
        assert!((mid.longitude - (CSMT.longitude + PUNE.longitude) / 2.0).abs() < 1e-12);

        let end = animator
            .position_at(start() + Duration::milliseconds(5000))
            .unwrap();
        assert_eq!(end, PUNE);
    }

    #[test]
    fn clamps_before_start() {
        let mut animator = PositionAnimator::default();
        animator.begin(CSMT, PUNE, Duration::milliseconds(4000), start());
        assert_eq!(
            animator.position_at(start() - Duration::seconds(10)),
            Some(CSMT)
        );
    }

    #[test]
    fn new_frame_supersedes_in_flight_one() {
        let mut animator = PositionAnimator::default();
        animator.begin(CSMT, PUNE, Duration::milliseconds(4000), start());

        let later = start() + Duration::milliseconds(1000);
        let hyb = LatLng::from_lat_lng(17.3850, 78.4867);
        animator.begin(PUNE, hyb, Duration::milliseconds(4000), later);

        assert_eq!(animator.position_at(later), Some(PUNE));
        assert_eq!(
            animator.position_at(later + Duration::milliseconds(4000)),
            Some(hyb)
        );
    }

    #[test]
    fn zero_duration_jumps_to_target() {
        let frame = AnimationFrame::new(CSMT, PUNE, Duration::zero(), start());
        assert_eq!(frame.position_at(start()), PUNE);
    }
}

use route_structure::LatLng;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres (haversine).
pub fn distance_km(a: LatLng, b: LatLng) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin() * (d_lat / 2.0).sin()
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin()
            * (d_lon / 2.0).sin();

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Length of the polyline through `points`, in order. Zero for fewer than two points.
pub fn path_distance_km<I>(points: I) -> f64
where
    I: IntoIterator<Item = LatLng>,
{
    let mut points = points.into_iter();
    let Some(mut prev) = points.next() else {
        return 0.0;
    };
    let mut total = 0.0;
    for p in points {
        total += distance_km(prev, p);
        prev = p;
    }
    total
}

use std::convert::Infallible;

use chrono::{DateTime, Utc};
use geo_types::{Coord, LineString};
use log::info;
use route_structure::Route;
use serde_json::{json, Value};
use warp::Filter;

use crate::poll_loop::RenderEvent;
use crate::presenter::SharedDisplay;

fn to_point_type(c: Coord) -> geojson::PointType {
    vec![c.x, c.y]
}

fn route_line(route: &Route, from: usize, to: usize) -> LineString {
    route.waypoints()[from..=to]
        .iter()
        .map(|w| Coord::from(w.position()))
        .collect()
}

/// Route path, the segment being travelled and one point per station.
pub fn route_geojson(render: &RenderEvent) -> geojson::FeatureCollection {
    let route = &render.route;
    let last = route.waypoints().len() - 1;
    let next = (render.current_index + 1).min(last);

    let mut path = geojson::Feature::from(geojson::Geometry::from(&route_line(route, 0, last)));
    path.set_property("kind", "route");

    let mut segment = geojson::Feature::from(geojson::Geometry::from(&route_line(
        route,
        render.current_index,
        next,
    )));
    segment.set_property("kind", "current");

    let mut features = vec![path, segment];
    for (i, waypoint) in route.waypoints().iter().enumerate() {
        let mut stop = geojson::Feature::from(geojson::Value::Point(to_point_type(
            waypoint.position().into(),
        )));
        stop.set_property("kind", "station");
        stop.set_property("code", waypoint.code.clone());
        stop.set_property("name", waypoint.name.clone());
        stop.set_property("passed", i <= render.current_index);
        features.push(stop);
    }

    geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn route_response(display: &SharedDisplay, now: DateTime<Utc>) -> Value {
    let state = display.lock();
    let Some(render) = state.latest() else {
        return json!("No route polled yet");
    };
    json!({
        "render": render,
        "countdown": render.eta.countdown(now).to_string(),
        "notice": state.last_notice(),
        "path": route_geojson(render),
    })
}

fn position_response(display: &SharedDisplay, now: DateTime<Utc>) -> Value {
    match display.lock().view_at(now) {
        Some(view) => json!(view),
        None => json!("No position yet"),
    }
}

fn with_display(
    display: SharedDisplay,
) -> impl Filter<Extract = (SharedDisplay,), Error = Infallible> + Clone {
    warp::any().map(move || display.clone())
}

pub async fn serve(display: SharedDisplay, port: u16) {
    let cors_policy = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["Origin", "Accept", "Content-Type"])
        .allow_methods(["GET"]);

    let log = warp::log("routepulse::web");

    let route = warp::get()
        .and(warp::path!("route"))
        .and(with_display(display.clone()))
        .map(|display: SharedDisplay| warp::reply::json(&route_response(&display, Utc::now())));

    let position = warp::get()
        .and(warp::path!("position"))
        .and(with_display(display))
        .map(|display: SharedDisplay| {
            warp::reply::json(&position_response(&display, Utc::now()))
        });

    let routes = route.or(position).with(cors_policy).with(log);

    info!("Serving route state on port {port}");
    warp::serve(routes).run(([0, 0, 0, 0], port)).await;
}

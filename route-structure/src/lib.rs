/*! Data model shared by the tracking engine.

A [Route] is an ordered list of [Waypoint]s plus identifying metadata. Routes
are built once per poll and never mutated; a fresh value replaces the old one.

The [fallback] module holds the demo routes bundled into the binary, used when
no live provider is configured or the live provider fails.
*/
#![warn(missing_docs)]

pub mod fallback;
mod route;

pub use route::{canonical_id, LatLng, Route, RouteError, Waypoint};

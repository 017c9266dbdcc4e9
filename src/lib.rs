//! Geofence Core Library
//!
//! Realtime radius queries over a keyed location store. The store maps an
//! entity key to a latitude/longitude pair; the query engine maintains one
//! live circle query against it and streams enter/exit/move membership
//! events as locations change or the circle is re-centered.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

mod api;
pub mod geo;
pub mod query;
pub mod store;

pub use api::{GeofenceCore, LocationSnapshot};
pub use query::{MembershipEvent, QueryState};

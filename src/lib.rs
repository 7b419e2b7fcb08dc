//! A small Rust client for Pelias-style geocoding services.
//!
//! The client talks to three endpoints (`/v2/search`, `/v2/autocomplete` and
//! `/v2/reverse`) and decodes every answer into a GeoJSON
//! [`FeatureCollection`](geojson::FeatureCollection). The default instance
//! points at [NYC Planning Labs GeoSearch](https://geosearch.planninglabs.nyc/docs/).
//!
//! ## Quick start
//!
//! ```no_run
//! use geosearch::{Client, Location, Options, RequestContext};
//! use std::time::Duration;
//!
//! fn main() -> geosearch::Result<()> {
//!     let client = Client::planning_labs()?;
//!     let ctx = RequestContext::background().with_timeout(Duration::from_secs(10));
//!
//!     let found = client.reverse_geocode(
//!         &ctx,
//!         Location::new(40.7484, -73.9857),
//!         Options::with_size(1),
//!     )?;
//!     for feature in &found.features {
//!         println!("{:?}", feature.property("name"));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Requests go through a [`Transport`]; [`HttpTransport`] is used unless a
//! different one is passed to [`Client::with_transport`].

#![forbid(unsafe_code)]

mod client;
mod context;
mod error;
mod params;
mod transport;

pub use client::{Client, PLANNING_LABS_URL};
pub use context::{CancelToken, RequestContext};
pub use error::{Error, Result};
pub use geojson::FeatureCollection;
pub use params::{Location, Options};
pub use transport::{HttpResponse, HttpTransport, Transport};
pub use url::Url;

use geojson::FeatureCollection;
use std::io::BufReader;
use std::sync::Arc;

use crate::context::{ContextReader, RequestContext};
use crate::error::{Error, Result};
use crate::params::{Location, Options, address_params, endpoint_url, reverse_params};
use crate::transport::{HttpTransport, Transport};

/// Base URL of the NYC Planning Labs GeoSearch service.
pub const PLANNING_LABS_URL: &str = "https://geosearch.planninglabs.nyc";

/// Client for a Pelias-style geocoding service.
///
/// The base URL is used verbatim: each request URL is the base with the
/// endpoint path appended as text, followed by a fresh query string. A query
/// on the base (`https://host/?key=x`) is not preserved: the path lands
/// inside it and the whole query is replaced.
/// A malformed base is only reported when a request is built from it.
/// Clones share the same transport.
#[derive(Debug, Clone)]
pub struct Client {
    url: String,
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Creates a client for `url` using the default HTTP transport.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Ok(Self::with_transport(url, Arc::new(HttpTransport::new()?)))
    }

    /// Creates a client for `url` that sends requests through `transport`.
    pub fn with_transport(url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            url: url.into(),
            transport,
        }
    }

    /// Client for the public NYC Planning Labs endpoint.
    pub fn planning_labs() -> Result<Self> {
        Self::new(PLANNING_LABS_URL)
    }

    pub fn base_url(&self) -> &str {
        &self.url
    }

    /// Free-text address search.
    ///
    /// See <https://github.com/pelias/documentation/blob/master/search.md>.
    pub fn search(
        &self,
        ctx: &RequestContext,
        address: &str,
        opt: Options,
    ) -> Result<FeatureCollection> {
        self.call(ctx, "/v2/search", &address_params(address, &opt))
    }

    /// Search for partial, as-you-type input.
    ///
    /// See <https://github.com/pelias/documentation/blob/master/autocomplete.md>.
    pub fn autocomplete(
        &self,
        ctx: &RequestContext,
        address: &str,
        opt: Options,
    ) -> Result<FeatureCollection> {
        self.call(ctx, "/v2/autocomplete", &address_params(address, &opt))
    }

    /// Looks up the features nearest to a point.
    ///
    /// See <https://github.com/pelias/documentation/blob/master/reverse.md>.
    pub fn reverse_geocode(
        &self,
        ctx: &RequestContext,
        location: Location,
        opt: Options,
    ) -> Result<FeatureCollection> {
        self.call(ctx, "/v2/reverse", &reverse_params(&location, &opt))
    }

    fn call(
        &self,
        ctx: &RequestContext,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<FeatureCollection> {
        let url = endpoint_url(&self.url, path, params)?;
        ctx.check()?;

        log::debug!("GET {}", url);
        let resp = self.transport.get(&url, ctx)?;

        if resp.status >= 300 {
            log::warn!("GET {} returned HTTP {}", url, resp.status);
            return Err(Error::Status {
                status: resp.status,
                url: url.to_string(),
            });
        }

        let reader = BufReader::new(ContextReader::new(resp.body, ctx));
        serde_json::from_reader(reader).map_err(|e| match ctx.check() {
            Err(cancelled) => cancelled,
            Ok(()) if e.is_io() => Error::Io(e.into()),
            Ok(()) => Error::Decode(e),
        })
    }
}

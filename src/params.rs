use url::Url;

use crate::error::Result;

pub(crate) const DEFAULT_SIZE: &str = "10";

/// A point to reverse geocode, in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Per-call query options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Maximum number of results. Values below 1 (including the default of 0)
    /// mean the service default of 10.
    pub size: i64,
}

impl Options {
    pub fn with_size(size: i64) -> Self {
        Self { size }
    }

    pub(crate) fn size_param(&self) -> String {
        if self.size < 1 {
            DEFAULT_SIZE.to_string()
        } else {
            self.size.to_string()
        }
    }
}

/// Fixed-point coordinate with six fractional digits.
pub(crate) fn coordinate(value: f64) -> String {
    format!("{:.6}", value)
}

/// Builds `{base}{path}?{params}` with form-urlencoded parameters.
pub(crate) fn endpoint_url(base: &str, path: &str, params: &[(&str, String)]) -> Result<Url> {
    let mut url = Url::parse(&format!("{}{}", base, path))?;
    url.query_pairs_mut()
        .clear()
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
    Ok(url)
}

pub(crate) fn address_params(address: &str, opt: &Options) -> Vec<(&'static str, String)> {
    vec![("size", opt.size_param()), ("address", address.to_string())]
}

pub(crate) fn reverse_params(location: &Location, opt: &Options) -> Vec<(&'static str, String)> {
    vec![
        ("size", opt.size_param()),
        ("point.lat", coordinate(location.lat)),
        ("point.lon", coordinate(location.lon)),
    ]
}

use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::fmt;
use std::io::{Cursor, Read};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use url::Url;

use crate::context::RequestContext;
use crate::error::{Error, Result};

/// A response as seen by the client: a status code and the raw body.
///
/// The body is closed when the value is dropped.
pub struct HttpResponse {
    pub status: u16,
    pub body: Box<dyn Read + Send>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Read + Send + 'static) -> Self {
        Self {
            status,
            body: Box::new(body),
        }
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Issues GET requests on behalf of a [`Client`](crate::Client).
///
/// Implementations must return once the context is cancelled or its
/// deadline passes, even while the request is still in flight.
pub trait Transport: Send + Sync + fmt::Debug {
    fn get(&self, url: &Url, ctx: &RequestContext) -> Result<HttpResponse>;
}

enum Wake<T> {
    Done(T),
    Cancelled,
}

/// Default transport over a blocking reqwest client.
///
/// Each round trip (headers and body) runs on a short-lived worker thread
/// while the calling thread waits on the context. A cancelled or expired call
/// returns at once; the abandoned worker drops its connection when reqwest's
/// own timeout ends it.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: HttpClient,
}

impl HttpTransport {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new() -> Result<Self> {
        Self::with_options(true, Self::DEFAULT_TIMEOUT)
    }

    /// Builds a transport; `verify = false` accepts invalid TLS certificates.
    pub fn with_options(verify: bool, timeout: Duration) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("geosearch-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("geosearch-rs")),
        );

        let mut builder = HttpClient::builder()
            .default_headers(default_headers)
            .timeout(timeout);

        if !verify {
            log::warn!("TLS certificate verification disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            http: builder.build()?,
        })
    }

    /// Wraps an already configured reqwest client.
    pub fn from_client(http: HttpClient) -> Self {
        Self { http }
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &Url, ctx: &RequestContext) -> Result<HttpResponse> {
        ctx.check()?;

        let mut req = self.http.get(url.clone());
        if let Some(remaining) = ctx.remaining() {
            req = req.timeout(remaining);
        }

        let (tx, rx) = mpsc::channel();
        let cancel_tx = tx.clone();
        let _watch = ctx.on_cancel(move || {
            let _ = cancel_tx.send(Wake::Cancelled);
        });

        thread::Builder::new()
            .name("geosearch-http".to_string())
            .spawn(move || {
                let result = req.send().and_then(|resp| {
                    let status = resp.status().as_u16();
                    resp.bytes().map(|body| (status, body))
                });
                // The caller may have given up already.
                let _ = tx.send(Wake::Done(result));
            })?;

        let wake = match ctx.remaining() {
            Some(remaining) => match rx.recv_timeout(remaining) {
                Ok(wake) => wake,
                Err(RecvTimeoutError::Timeout) => return Err(Error::DeadlineExceeded),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(Error::Io(std::io::Error::other("HTTP worker exited")));
                }
            },
            None => rx
                .recv()
                .map_err(|_| Error::Io(std::io::Error::other("HTTP worker exited")))?,
        };

        match wake {
            Wake::Cancelled => {
                log::debug!("GET {} cancelled", url);
                Err(Error::Cancelled)
            }
            Wake::Done(Err(e)) if e.is_timeout() && ctx.deadline_passed() => {
                Err(Error::DeadlineExceeded)
            }
            Wake::Done(Err(e)) => Err(Error::Transport(e)),
            Wake::Done(Ok((status, body))) => {
                ctx.check()?;
                Ok(HttpResponse::new(status, Cursor::new(body)))
            }
        }
    }
}

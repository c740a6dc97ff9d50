// Device HTTP client
//
// Wraps `reqwest::Client` with device URL construction and request
// helpers. The detection probe and both protocol drivers are
// implemented as inherent methods in separate files to keep this
// module focused on transport mechanics.

use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Query parameter that carries the DLX password.
pub(crate) const PASSWORD_PARAM: &str = "sessionAuthPassword";

const REDACTED: &str = "***";

/// Raw HTTP client for a single Resol device.
///
/// Holds the device root (`http://{host}[:port]`) and a shared
/// `reqwest::Client`. Stateless apart from that: the webservice session
/// token lives only for the duration of one fetch.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DeviceClient {
    /// Create a new device client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a device client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The device base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Resolve a fixed absolute path against the device root.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.base_url.join(path).map_err(Error::InvalidUrl)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request. Single attempt, no retries.
    pub(crate) async fn get(&self, url: Url) -> Result<reqwest::Response, Error> {
        debug!("GET {}", redact_url(&url));

        let shown = redacted(&url);
        self.http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Transport(e.with_url(shown)))
    }

    /// Send a POST request with a JSON body. Single attempt, no retries.
    pub(crate) async fn post_json(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<reqwest::Response, Error> {
        debug!("POST {}", redact_url(&url));

        self.http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)
    }
}

/// Build the device root URL from a configured host and optional port.
///
/// Accepts a bare host (`192.168.1.20`, `resol.local`) or a full
/// `http://` URL. An explicit `port` wins over one embedded in the host.
pub fn base_url(host: &str, port: Option<u16>) -> Result<Url, Error> {
    let host = host.trim().trim_end_matches('/');
    let raw = if host.contains("://") {
        host.to_owned()
    } else {
        format!("http://{host}")
    };
    let mut url = Url::parse(&raw)?;
    if let Some(port) = port {
        url.set_port(Some(port))
            .map_err(|()| Error::InvalidUrl(url::ParseError::InvalidPort))?;
    }
    Ok(url)
}

/// Copy of `url` with the DLX password replaced by `***`.
pub fn redacted(url: &Url) -> Url {
    let mut copy = url.clone();
    if !url.query_pairs().any(|(k, _)| k == PASSWORD_PARAM) {
        return copy;
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == PASSWORD_PARAM {
                REDACTED.to_owned()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();

    copy.query_pairs_mut().clear().extend_pairs(pairs);
    copy
}

/// Render a URL for logs and error messages with the DLX password hidden.
///
/// Every URL that reaches a log line goes through here.
pub fn redact_url(url: &Url) -> String {
    redacted(url).to_string()
}

// DLX driver (DL2 / DL3)
//
// Single GET on `/dlx/download/live`. Credentials and the optional
// filter id travel in the query string; there is no session.

use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde_json::Value;
use url::Url;

use crate::auth::Credentials;
use crate::client::{DeviceClient, PASSWORD_PARAM, redacted};
use crate::error::{Error, preview};

pub const DLX_LIVE_PATH: &str = "/dlx/download/live";

impl DeviceClient {
    /// Build the live-download URL.
    ///
    /// Credentials (and, with them, the filter id) are only appended when
    /// both username and password are configured; otherwise the request
    /// is anonymous.
    pub fn dlx_url(
        &self,
        credentials: Option<&Credentials>,
        filter_id: Option<&str>,
    ) -> Result<Url, Error> {
        let mut url = self.endpoint(DLX_LIVE_PATH)?;

        if let Some(credentials) = credentials {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("sessionAuthUsername", &credentials.username)
                .append_pair(PASSWORD_PARAM, credentials.password.expose_secret());
            if let Some(filter) = filter_id.map(str::trim).filter(|f| !f.is_empty()) {
                query.append_pair("filter", filter);
            }
        }

        Ok(url)
    }

    /// Download the live data set.
    ///
    /// `GET /dlx/download/live[?sessionAuthUsername=&sessionAuthPassword=&filter=]`
    ///
    /// - status other than 200 → [`Error::Authentication`]
    /// - 200 with a non-JSON body → [`Error::Deserialization`]
    pub async fn fetch_dlx(
        &self,
        credentials: Option<&Credentials>,
        filter_id: Option<&str>,
    ) -> Result<Value, Error> {
        let url = self.dlx_url(credentials, filter_id)?;
        let shown = redacted(&url);
        let resp = self.get(url).await?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(Error::Authentication {
                message: format!("{shown} returned HTTP {status} (check username, password and filter)"),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::Transport(e.with_url(shown.clone())))?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }
}

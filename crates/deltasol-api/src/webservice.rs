// Webservice driver (KM2 / DL2Plus)
//
// Two-step JSON-RPC style exchange on `/cgi-bin/resol-webservice`:
// `login` returns an `authId`, `dataGetCurrentData` returns the live
// header/packet structure for that session.

use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::auth::Credentials;
use crate::client::DeviceClient;
use crate::error::{Error, preview};
use crate::models::{LoginResult, RpcReply};

pub const WEBSERVICE_PATH: &str = "/cgi-bin/resol-webservice";

impl DeviceClient {
    /// Log in and return the session `authId`.
    ///
    /// `POST /cgi-bin/resol-webservice` with method `login`.
    pub async fn login(&self, credentials: &Credentials) -> Result<String, Error> {
        let url = self.endpoint(WEBSERVICE_PATH)?;
        debug!(username = %credentials.username, "webservice login");

        let body = json!([{
            "id": "1",
            "jsonrpc": "2.0",
            "method": "login",
            "params": {
                "username": credentials.username,
                "password": credentials.password.expose_secret(),
            },
        }]);

        let resp = self.post_json(url, &body).await?;
        let login: LoginResult = self.rpc_result(resp, "login").await?;

        login.auth_id.ok_or_else(|| Error::Authentication {
            message: "login reply carried no authId (check username and password)".into(),
        })
    }

    /// Fetch the current measurement set for an authenticated session.
    ///
    /// `POST /cgi-bin/resol-webservice` with method `dataGetCurrentData`.
    ///
    /// Returns loosely-typed JSON; the normalizer owns the structure.
    pub async fn current_data(&self, auth_id: &str) -> Result<Value, Error> {
        let url = self.endpoint(WEBSERVICE_PATH)?;
        debug!("webservice dataGetCurrentData");

        let body = json!([{
            "id": "1",
            "jsonrpc": "2.0",
            "method": "dataGetCurrentData",
            "params": { "authId": auth_id },
        }]);

        let resp = self.post_json(url, &body).await?;
        self.rpc_result(resp, "dataGetCurrentData").await
    }

    /// Login followed by `dataGetCurrentData`.
    ///
    /// Missing credentials fail before any request is sent; a failed
    /// login never issues the data request.
    pub async fn fetch_webservice(&self, credentials: Option<&Credentials>) -> Result<Value, Error> {
        let credentials = credentials.ok_or_else(|| Error::Authentication {
            message: "username and password are required for this device".into(),
        })?;

        let auth_id = self.login(credentials).await?;
        self.current_data(&auth_id).await
    }

    /// Unwrap `[0].result` from a webservice reply.
    ///
    /// Any status, shape, or parse problem is reported as an
    /// authentication failure: wrong credentials produce exactly these
    /// symptoms on this protocol.
    async fn rpc_result<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
        method: &str,
    ) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(Error::Authentication {
                message: format!("{method} returned HTTP {status}"),
            });
        }

        let replies: Vec<RpcReply<T>> =
            serde_json::from_str(&body).map_err(|e| Error::Authentication {
                message: format!("{method} reply not understood: {e} (body preview: {:?})", preview(&body)),
            })?;

        replies
            .into_iter()
            .next()
            .and_then(|reply| reply.result)
            .ok_or_else(|| Error::Authentication {
                message: format!("{method} reply carried no result"),
            })
    }
}

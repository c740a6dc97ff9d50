use secrecy::SecretString;

/// Which wire protocol a product family speaks.
///
/// Marker enum (no data) -- the actual credentials live in [`Credentials`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// JSON-RPC style `POST /cgi-bin/resol-webservice`: login for an
    /// `authId`, then `dataGetCurrentData` (KM2, DL2Plus).
    WebService,
    /// `GET /dlx/download/live` with credentials in the query string (DL2, DL3).
    Dlx,
}

/// Username/password pair for the device's web interface.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// Combine optional parts. Both halves must be present, otherwise
    /// the device is treated as allowing anonymous reads.
    pub fn from_parts(username: Option<String>, password: Option<SecretString>) -> Option<Self> {
        match (username, password) {
            (Some(username), Some(password)) => Some(Self { username, password }),
            _ => None,
        }
    }
}

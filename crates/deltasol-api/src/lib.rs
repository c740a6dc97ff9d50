// deltasol-api: Async Rust client for the Resol local HTTP API (webservice + DLX)

pub mod auth;
pub mod client;
pub mod detect;
pub mod dlx;
pub mod error;
pub mod models;
pub mod transport;
pub mod webservice;

pub use auth::{Credentials, Protocol};
pub use client::{DeviceClient, base_url, redact_url, redacted};
pub use error::Error;
pub use models::{DeviceInformation, LiveData, Product};
pub use transport::TransportConfig;

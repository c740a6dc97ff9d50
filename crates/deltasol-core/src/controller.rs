// ── Controller facade ──
//
// The one entry point a host polls. Owns the HTTP client, memoizes the
// detected device identity, and keeps the most recent snapshot.

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwapOption;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use deltasol_api::transport::TransportConfig;
use deltasol_api::{Credentials, DeviceClient, Protocol};

use crate::config::DeviceConfig;
use crate::convert::normalize;
use crate::error::CoreError;
use crate::model::{DeviceIdentity, Snapshot};

/// Polling facade for a single Resol device.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Detection runs at most
/// once successfully per controller; a failed detection is retried on
/// the next fetch. Every fetch downloads and normalizes the full data
/// set and replaces the previous snapshot.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: DeviceConfig,
    client: DeviceClient,
    credentials: Option<Credentials>,
    identity: OnceCell<Arc<DeviceIdentity>>,
    latest: ArcSwapOption<Snapshot>,
}

impl Controller {
    /// Build a controller from configuration. Performs no I/O.
    pub fn new(config: DeviceConfig) -> Result<Self, CoreError> {
        if config.host.trim().is_empty() {
            return Err(CoreError::Config {
                message: "device host is empty".into(),
            });
        }

        let base_url = deltasol_api::base_url(&config.host, config.port)?;
        let transport = TransportConfig::default().with_timeout(config.request_timeout);
        let client = DeviceClient::new(base_url, &transport)?;
        Ok(Self::with_client(config, client))
    }

    /// Build a controller around an existing client.
    pub fn with_client(config: DeviceConfig, client: DeviceClient) -> Self {
        let credentials = config.credentials();
        Self {
            inner: Arc::new(ControllerInner {
                config,
                client,
                credentials,
                identity: OnceCell::new(),
                latest: ArcSwapOption::empty(),
            }),
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.inner.config
    }

    /// Identity from a previous successful detection, if any.
    pub fn identity(&self) -> Option<Arc<DeviceIdentity>> {
        self.inner.identity.get().cloned()
    }

    /// The snapshot from the last successful fetch.
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.inner.latest.load_full()
    }

    // ── Detection ────────────────────────────────────────────────────

    /// Probe the device information endpoint, once.
    ///
    /// Unknown products are detected successfully; they only fail at
    /// fetch time with [`CoreError::UnsupportedProduct`].
    pub async fn detect(&self) -> Result<Arc<DeviceIdentity>, CoreError> {
        let identity = self
            .inner
            .identity
            .get_or_try_init(|| async {
                let info = self
                    .inner
                    .client
                    .device_information()
                    .await?;
                let identity = DeviceIdentity::from(info);
                info!(
                    product = %identity.product_name,
                    serial = %identity.serial_number,
                    version = %identity.firmware_version,
                    "detected device"
                );
                Ok::<_, CoreError>(Arc::new(identity))
            })
            .await?;
        Ok(Arc::clone(identity))
    }

    // ── Fetch ────────────────────────────────────────────────────────

    /// Run one full polling cycle: detect (first time only), download
    /// with the product's protocol, normalize.
    ///
    /// The whole cycle is bounded by `cycle_timeout`. On failure the
    /// previously stored snapshot is left untouched.
    pub async fn fetch_snapshot(&self) -> Result<Arc<Snapshot>, CoreError> {
        let budget = self.inner.config.cycle_timeout;
        match tokio::time::timeout(budget, self.cycle()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_secs = budget.as_secs(), "polling cycle timed out");
                Err(CoreError::Timeout {
                    timeout_secs: budget.as_secs(),
                })
            }
        }
    }

    async fn cycle(&self) -> Result<Arc<Snapshot>, CoreError> {
        let started = Instant::now();
        let device = self.detect().await?;

        let raw = match device.protocol() {
            Some(Protocol::WebService) => {
                debug!("fetching via webservice");
                self.inner
                    .client
                    .fetch_webservice(self.inner.credentials.as_ref())
                    .await
            }
            Some(Protocol::Dlx) => {
                debug!("fetching via dlx");
                self.inner
                    .client
                    .fetch_dlx(
                        self.inner.credentials.as_ref(),
                        self.inner.config.filter_id.as_deref(),
                    )
                    .await
            }
            None => {
                return Err(CoreError::UnsupportedProduct {
                    product: device.product_name.clone(),
                });
            }
        }?;

        let snapshot = Arc::new(normalize(&raw, &device)?);
        self.inner.latest.store(Some(Arc::clone(&snapshot)));

        info!(
            records = snapshot.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "snapshot refreshed"
        );
        Ok(snapshot)
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("host", &self.inner.config.host)
            .field("identity", &self.inner.identity.get())
            .finish_non_exhaustive()
    }
}

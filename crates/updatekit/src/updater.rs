//! Entry-point context object.
//!
//! One [`Updater`] is constructed at host startup and threaded to every
//! call site. Configuration is established once and read everywhere; the
//! in-flight tracking cell it owns is what makes downloads single-flight
//! process-wide.

use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::config::UpdateConfig;
use crate::download::{self, DownloadInfo};
use crate::error::UpdateError;
use crate::flight::ActiveDownload;
use crate::platform::Platform;
use crate::store;
use crate::strategy::{self, StoreFacts, UpdatePath};

pub struct Updater<P: Platform> {
    platform: Arc<P>,
    config: OnceLock<UpdateConfig>,
    active: Arc<ActiveDownload>,
}

impl<P: Platform> Updater<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform: Arc::new(platform),
            config: OnceLock::new(),
            active: Arc::new(ActiveDownload::new()),
        }
    }

    /// Establish configuration. First call wins; replacements are ignored
    /// so the value stays immutable for the process lifetime.
    pub fn set_config(&self, config: UpdateConfig) {
        if self.config.set(config).is_err() {
            warn!("Update configuration already set, ignoring replacement");
        }
    }

    fn config(&self) -> Result<&UpdateConfig, UpdateError> {
        self.config.get().ok_or(UpdateError::ConfigurationNotSet)
    }

    /// Whether the configured strategy resolves to the store path right now.
    pub fn can_use_store_update(&self) -> Result<bool, UpdateError> {
        let config = self.config()?;
        let facts = StoreFacts::gather(self.platform.packages(), config.app_id());
        Ok(strategy::resolve(config.strategy(), &facts) == UpdatePath::Store)
    }

    /// Resolve the update path and drive it.
    ///
    /// Store path: one best-effort attempt to surface the store listing.
    /// Sideload path: begin a tracked download and arm the completion
    /// watcher; a request made while a download is already in flight is
    /// dropped silently. Returns which path was resolved.
    pub fn update(&self, info: &DownloadInfo) -> Result<UpdatePath, UpdateError> {
        let config = self.config()?;
        let facts = StoreFacts::gather(self.platform.packages(), config.app_id());
        let path = strategy::resolve(config.strategy(), &facts);
        debug!("Update path resolved: {:?} ({:?})", path, facts);

        match path {
            UpdatePath::Store => store::open_listing(self.platform.launcher(), config.app_id()),
            UpdatePath::Sideload => download::begin(&self.platform, &self.active, config, info),
        }
        Ok(path)
    }

    /// Remove downloaded update artifacts. Call at host startup so stale
    /// files from a previous run do not linger.
    pub fn cleanup(&self) {
        download::cleanup(self.platform.as_ref());
    }
}

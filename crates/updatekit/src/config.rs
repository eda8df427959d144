//! Update source configuration.
//!
//! Built once through the validating builder, or loaded from TOML which
//! funnels through the same builder, and never mutated afterwards.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::UpdateError;
use crate::strategy::InstallerStrategy;

/// Canonical extension for installable package archives.
const APK_EXTENSION: &str = ".apk";

/// Immutable description of the update source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateConfig {
    app_id: String,
    apk_url: String,
    strategy: InstallerStrategy,
    file_name: String,
    show_download_messages: bool,
}

impl UpdateConfig {
    /// Start building a configuration for `app_id`.
    pub fn builder(app_id: impl Into<String>) -> UpdateConfigBuilder {
        UpdateConfigBuilder {
            app_id: app_id.into(),
            apk_url: String::new(),
            strategy: InstallerStrategy::default(),
            file_name: String::new(),
            show_download_messages: true,
        }
    }

    /// Parse a TOML document. Same validation as the builder.
    pub fn from_toml_str(raw: &str) -> Result<Self, UpdateError> {
        let raw: RawConfig =
            toml::from_str(raw).map_err(|e| UpdateError::InvalidConfiguration {
                reason: e.to_string(),
            })?;

        let mut builder = Self::builder(raw.app_id)
            .apk_url(raw.apk_url)
            .strategy(raw.strategy)
            .show_download_messages(raw.show_download_messages);
        if !raw.file_name.trim().is_empty() {
            builder = builder.file_name(raw.file_name);
        }
        builder.build()
    }

    /// Load a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, UpdateError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| UpdateError::InvalidConfiguration {
            reason: format!("Cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&raw)
    }

    /// Identifier of the app being updated.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Web URL the artifact is downloadable from.
    pub fn apk_url(&self) -> &str {
        &self.apk_url
    }

    pub fn strategy(&self) -> InstallerStrategy {
        self.strategy
    }

    /// Destination file name. Always ends in the canonical extension.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Whether to surface transient download notices to the user.
    pub fn show_download_messages(&self) -> bool {
        self.show_download_messages
    }
}

/// On-disk shape; defaults mirror the builder's.
#[derive(Debug, Deserialize, Serialize)]
struct RawConfig {
    app_id: String,
    apk_url: String,
    #[serde(default)]
    strategy: InstallerStrategy,
    #[serde(default)]
    file_name: String,
    #[serde(default = "default_show_messages")]
    show_download_messages: bool,
}

fn default_show_messages() -> bool {
    true
}

/// Fluent builder for [`UpdateConfig`].
///
/// Defaults: strategy [`InstallerStrategy::InstalledByStore`], download
/// messages on, file name `<app_id>.apk`.
#[derive(Debug, Clone)]
pub struct UpdateConfigBuilder {
    app_id: String,
    apk_url: String,
    strategy: InstallerStrategy,
    file_name: String,
    show_download_messages: bool,
}

impl UpdateConfigBuilder {
    /// Web URL the artifact is stored at. Must be downloadable by this link.
    pub fn apk_url(mut self, url: impl Into<String>) -> Self {
        self.apk_url = url.into();
        self
    }

    pub fn strategy(mut self, strategy: InstallerStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Destination file name. The canonical extension is appended when
    /// missing; blank names fall back to the default.
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.file_name = if name.trim().is_empty() || name.ends_with(APK_EXTENSION) {
            name
        } else {
            format!("{}{}", name, APK_EXTENSION)
        };
        self
    }

    /// Whether to surface transient download notices to the user.
    pub fn show_download_messages(mut self, show: bool) -> Self {
        self.show_download_messages = show;
        self
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> Result<UpdateConfig, UpdateError> {
        if self.app_id.trim().is_empty() {
            return Err(UpdateError::InvalidConfiguration {
                reason: "app id must be provided".to_string(),
            });
        }
        if self.apk_url.trim().is_empty() {
            return Err(UpdateError::InvalidConfiguration {
                reason: "apk url must be provided".to_string(),
            });
        }

        let file_name = if self.file_name.trim().is_empty() {
            format!("{}{}", self.app_id, APK_EXTENSION)
        } else {
            self.file_name
        };

        Ok(UpdateConfig {
            app_id: self.app_id,
            apk_url: self.apk_url,
            strategy: self.strategy,
            file_name,
            show_download_messages: self.show_download_messages,
        })
    }
}

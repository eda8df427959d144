//! Update-path strategy resolution.
//!
//! A pure decision over two environment facts: which client installed the
//! running app, and whether a recognized store client is usable on the
//! device. The facts are gathered once per call from the package metadata
//! collaborator; resolution itself touches nothing.

use serde::{Deserialize, Serialize};

use crate::platform::PackageMetadata;

/// Store client packages recognized as update sources. Fixed at build time.
pub const STORE_PACKAGES: [&str; 2] = ["com.android.vending", "com.google.android.feedback"];

/// Whether `package` is one of the recognized store clients.
pub fn is_store_package(package: &str) -> bool {
    STORE_PACKAGES.contains(&package)
}

/// Decides the source of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum InstallerStrategy {
    /// Use the store only when it installed the running app. The right
    /// choice when the shipped artifact carries a store signature.
    #[default]
    InstalledByStore,
    /// Use the store whenever a store client is present and enabled.
    StoreOnDevice,
}

impl InstallerStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallerStrategy::InstalledByStore => "installed-by-store",
            InstallerStrategy::StoreOnDevice => "store-on-device",
        }
    }
}

/// Which update path resolution picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePath {
    /// Open the store listing and let the store client handle the update.
    Store,
    /// Download the artifact directly and hand it to the installer.
    Sideload,
}

/// Environment facts the resolver decides on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreFacts {
    /// Installer package of the running app, when the platform knows it.
    pub installed_by: Option<String>,
    /// Some recognized store client is installed and enabled.
    pub store_client_present: bool,
}

impl StoreFacts {
    /// Query the package metadata service for the facts resolution needs.
    pub fn gather(packages: &dyn PackageMetadata, app_id: &str) -> Self {
        Self {
            installed_by: packages.installer_of(app_id),
            store_client_present: STORE_PACKAGES.iter().any(|p| packages.package_enabled(p)),
        }
    }
}

/// Pure decision table: identical inputs always yield identical output.
pub fn resolve(strategy: InstallerStrategy, facts: &StoreFacts) -> UpdatePath {
    let use_store = match strategy {
        InstallerStrategy::InstalledByStore => facts
            .installed_by
            .as_deref()
            .map(is_store_package)
            .unwrap_or(false),
        InstallerStrategy::StoreOnDevice => facts.store_client_present,
    };

    if use_store {
        UpdatePath::Store
    } else {
        UpdatePath::Sideload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct FakePackages {
        installer: Option<String>,
        enabled: HashSet<String>,
    }

    impl PackageMetadata for FakePackages {
        fn installer_of(&self, _package: &str) -> Option<String> {
            self.installer.clone()
        }

        fn package_enabled(&self, package: &str) -> bool {
            self.enabled.contains(package)
        }
    }

    fn facts(installed_by: Option<&str>, store_client_present: bool) -> StoreFacts {
        StoreFacts {
            installed_by: installed_by.map(|s| s.to_string()),
            store_client_present,
        }
    }

    #[test]
    fn test_installed_by_store_requires_recognized_installer() {
        let strategy = InstallerStrategy::InstalledByStore;

        assert_eq!(
            resolve(strategy, &facts(Some("com.android.vending"), false)),
            UpdatePath::Store
        );
        assert_eq!(
            resolve(strategy, &facts(Some("com.google.android.feedback"), false)),
            UpdatePath::Store
        );
        assert_eq!(
            resolve(strategy, &facts(Some("org.fdroid.fdroid"), true)),
            UpdatePath::Sideload
        );
        assert_eq!(resolve(strategy, &facts(None, true)), UpdatePath::Sideload);
    }

    #[test]
    fn test_store_on_device_requires_present_client() {
        let strategy = InstallerStrategy::StoreOnDevice;

        assert_eq!(resolve(strategy, &facts(None, true)), UpdatePath::Store);
        assert_eq!(
            resolve(strategy, &facts(Some("com.android.vending"), false)),
            UpdatePath::Sideload
        );
        assert_eq!(resolve(strategy, &facts(None, false)), UpdatePath::Sideload);
    }

    #[test]
    fn test_resolve_is_pure() {
        let f = facts(Some("com.android.vending"), true);
        for strategy in [
            InstallerStrategy::InstalledByStore,
            InstallerStrategy::StoreOnDevice,
        ] {
            assert_eq!(resolve(strategy, &f), resolve(strategy, &f));
        }
    }

    #[test]
    fn test_gather_checks_every_store_package() {
        let packages = FakePackages {
            installer: None,
            enabled: ["com.google.android.feedback".to_string()].into_iter().collect(),
        };

        let facts = StoreFacts::gather(&packages, "com.example.app");
        assert!(facts.installed_by.is_none());
        assert!(facts.store_client_present, "any enabled store client counts");

        let none = FakePackages {
            installer: None,
            enabled: HashSet::new(),
        };
        assert!(!StoreFacts::gather(&none, "com.example.app").store_client_present);
    }

    #[test]
    fn test_strategy_tags() {
        assert_eq!(InstallerStrategy::default(), InstallerStrategy::InstalledByStore);
        assert_eq!(InstallerStrategy::InstalledByStore.as_str(), "installed-by-store");
        assert_eq!(InstallerStrategy::StoreOnDevice.as_str(), "store-on-device");
    }
}

//! Store update path.
//!
//! A single best-effort attempt: open the app-details page in a recognized
//! store client, fall back to the web page, or give up silently when the
//! device has no way to view a store listing at all.

use tracing::{debug, info};

use crate::platform::{ActivityLauncher, LaunchFlags, LaunchRequest};
use crate::strategy::is_store_package;

/// Scheme URI opening the app-details page inside a store client.
fn listing_uri(app_id: &str) -> String {
    format!("market://details?id={}", app_id)
}

/// Web fallback for the same app-details page.
fn listing_url(app_id: &str) -> String {
    format!("https://play.google.com/store/apps/details?id={}", app_id)
}

/// Surface the store listing for `app_id`. No lifecycle tracking.
pub(crate) fn open_listing(launcher: &dyn ActivityLauncher, app_id: &str) {
    let probe = LaunchRequest::StoreListing {
        uri: listing_uri(app_id),
        component: None,
        flags: LaunchFlags::default(),
    };

    for handler in launcher.resolve(&probe) {
        if is_store_package(&handler.package) {
            info!("Opening store listing via {}", handler.package);
            launcher.launch(&LaunchRequest::StoreListing {
                uri: listing_uri(app_id),
                component: Some(handler),
                flags: LaunchFlags {
                    new_task: true,
                    clear_top: true,
                    reset_task_if_needed: true,
                    ..Default::default()
                },
            });
            return;
        }
    }

    let web = LaunchRequest::WebPage {
        url: listing_url(app_id),
    };
    if launcher.resolve(&web).is_empty() {
        debug!("No way to view a store listing on this device");
        return;
    }
    info!("Opening store listing in browser");
    launcher.launch(&web);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ActivityHandler;
    use std::sync::Mutex;

    struct FakeLauncher {
        listing_handlers: Vec<ActivityHandler>,
        web_handlers: Vec<ActivityHandler>,
        launched: Mutex<Vec<LaunchRequest>>,
    }

    impl ActivityLauncher for FakeLauncher {
        fn resolve(&self, request: &LaunchRequest) -> Vec<ActivityHandler> {
            match request {
                LaunchRequest::StoreListing { .. } => self.listing_handlers.clone(),
                LaunchRequest::WebPage { .. } => self.web_handlers.clone(),
                LaunchRequest::Install(_) => Vec::new(),
            }
        }

        fn launch(&self, request: &LaunchRequest) {
            self.launched.lock().unwrap().push(request.clone());
        }
    }

    fn handler(package: &str) -> ActivityHandler {
        ActivityHandler {
            package: package.to_string(),
            activity: format!("{}.DetailsActivity", package),
        }
    }

    #[test]
    fn test_recognized_store_client_launched_directly() {
        let launcher = FakeLauncher {
            listing_handlers: vec![handler("com.other.market"), handler("com.android.vending")],
            web_handlers: vec![handler("org.mozilla.firefox")],
            launched: Mutex::new(Vec::new()),
        };

        open_listing(&launcher, "com.example.app");

        let launched = launcher.launched.lock().unwrap();
        assert_eq!(launched.len(), 1);
        match &launched[0] {
            LaunchRequest::StoreListing { uri, component, flags } => {
                assert_eq!(uri, "market://details?id=com.example.app");
                assert_eq!(component.as_ref().unwrap().package, "com.android.vending");
                assert!(flags.new_task && flags.clear_top && flags.reset_task_if_needed);
            }
            other => panic!("expected store listing launch, got {:?}", other),
        }
    }

    #[test]
    fn test_web_fallback_when_no_store_client() {
        let launcher = FakeLauncher {
            listing_handlers: vec![handler("com.other.market")],
            web_handlers: vec![handler("org.mozilla.firefox")],
            launched: Mutex::new(Vec::new()),
        };

        open_listing(&launcher, "com.example.app");

        let launched = launcher.launched.lock().unwrap();
        assert_eq!(launched.len(), 1);
        match &launched[0] {
            LaunchRequest::WebPage { url } => {
                assert_eq!(url, "https://play.google.com/store/apps/details?id=com.example.app");
            }
            other => panic!("expected web launch, got {:?}", other),
        }
    }

    #[test]
    fn test_silent_when_nothing_resolves() {
        let launcher = FakeLauncher {
            listing_handlers: Vec::new(),
            web_handlers: Vec::new(),
            launched: Mutex::new(Vec::new()),
        };

        open_listing(&launcher, "com.example.app");
        assert!(launcher.launched.lock().unwrap().is_empty());
    }
}

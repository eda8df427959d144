//! Download completion watcher.
//!
//! Armed when the download is submitted, fires exactly once when the
//! broadcast channel reports that download finished, then tears itself
//! down: unsubscribe and reopen the single-flight guard. Events for other
//! downloads leave it armed and the tracked handle untouched.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use crate::flight::ActiveDownload;
use crate::platform::{
    ArtifactSource, ContentBridge, DownloadCompleted, DownloadId, DownloadService, InstallRequest,
    LaunchFlags, LaunchRequest, Platform, SubscriptionToken,
};

/// Suffix appended to the app id to form the content-sharing authority.
const PROVIDER_SUFFIX: &str = ".provider";

struct CompletionWatcher<P: Platform> {
    platform: Arc<P>,
    active: Arc<ActiveDownload>,
    app_id: String,
    destination: PathBuf,
    token: OnceLock<SubscriptionToken>,
    fired: AtomicBool,
}

/// Subscribe a watcher for the download just submitted. Runs before the
/// download path returns, so no completion can slip past unobserved.
pub(crate) fn arm<P: Platform>(
    platform: &Arc<P>,
    active: &Arc<ActiveDownload>,
    app_id: &str,
    id: DownloadId,
    destination: PathBuf,
) {
    let watcher = Arc::new(CompletionWatcher {
        platform: Arc::clone(platform),
        active: Arc::clone(active),
        app_id: app_id.to_string(),
        destination,
        token: OnceLock::new(),
        fired: AtomicBool::new(false),
    });

    let handler = {
        let watcher = Arc::clone(&watcher);
        Box::new(move |event: &DownloadCompleted| watcher.on_event(event))
    };
    let token = platform.broadcasts().subscribe(handler);
    let _ = watcher.token.set(token);

    // An eager platform may have delivered the completion before the
    // handler knew its token; it could not unsubscribe itself then.
    if watcher.fired.load(Ordering::SeqCst) {
        platform.broadcasts().unsubscribe(token);
    }

    debug!("Completion watcher armed for download {}", id.0);
}

impl<P: Platform> CompletionWatcher<P> {
    fn on_event(&self, event: &DownloadCompleted) {
        if !self.active.matches(event.id) {
            debug!("Ignoring completion for unrelated download {}", event.id.0);
            return;
        }
        if self.fired.swap(true, Ordering::SeqCst) {
            return;
        }

        // From here every exit path releases the subscription and reopens
        // the single-flight guard, install launched or not.
        let _teardown = Teardown {
            watcher: self,
            id: event.id,
        };

        let install = if self.platform.scoped_install_required() {
            let authority = format!("{}{}", self.app_id, PROVIDER_SUFFIX);
            match scoped_install(self.platform.content(), &authority, &self.destination) {
                Some(request) => request,
                None => {
                    warn!(
                        "No shareable URI for {}, skipping install",
                        self.destination.display()
                    );
                    return;
                }
            }
        } else {
            legacy_install(self.platform.downloads(), event.id, &self.destination)
        };

        info!("Download {} complete, launching installer", event.id.0);
        self.platform
            .launcher()
            .launch(&LaunchRequest::Install(install));
    }
}

/// Firing-path cleanup. The `fired` gate guarantees it runs at most once.
struct Teardown<'a, P: Platform> {
    watcher: &'a CompletionWatcher<P>,
    id: DownloadId,
}

impl<P: Platform> Drop for Teardown<'_, P> {
    fn drop(&mut self) {
        if let Some(token) = self.watcher.token.get() {
            self.watcher.platform.broadcasts().unsubscribe(*token);
        }
        self.watcher.active.complete(self.id);
    }
}

/// Install invocation for systems that require scoped file access.
///
/// `None` when the sharing mechanism cannot issue a URI for the artifact.
pub(crate) fn scoped_install(
    content: &dyn ContentBridge,
    authority: &str,
    file: &Path,
) -> Option<InstallRequest> {
    let uri = content.shareable_uri(authority, file)?;
    Some(InstallRequest {
        source: ArtifactSource::Shared { uri },
        not_unknown_source: true,
        flags: LaunchFlags {
            new_task: true,
            clear_top: true,
            grant_read_uri: true,
            ..Default::default()
        },
    })
}

/// Install invocation for systems that accept direct file references,
/// typed with whatever MIME the download service recorded.
pub(crate) fn legacy_install(
    downloads: &dyn DownloadService,
    id: DownloadId,
    file: &Path,
) -> InstallRequest {
    InstallRequest {
        source: ArtifactSource::Direct {
            path: file.to_path_buf(),
            mime_type: downloads.mime_type_of(id),
        },
        not_unknown_source: false,
        flags: LaunchFlags {
            new_task: true,
            clear_top: true,
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::DownloadRequest;

    struct FakeContent {
        uri: Option<String>,
    }

    impl ContentBridge for FakeContent {
        fn shareable_uri(&self, authority: &str, file: &Path) -> Option<String> {
            self.uri.as_ref().map(|base| {
                format!("{}://{}{}", base, authority, file.display())
            })
        }
    }

    struct FakeDownloads {
        mime: Option<String>,
    }

    impl DownloadService for FakeDownloads {
        fn enqueue(&self, _request: DownloadRequest) -> DownloadId {
            DownloadId(0)
        }

        fn mime_type_of(&self, _id: DownloadId) -> Option<String> {
            self.mime.clone()
        }
    }

    #[test]
    fn test_scoped_install_request() {
        let content = FakeContent {
            uri: Some("content".to_string()),
        };
        let request =
            scoped_install(&content, "com.example.app.provider", Path::new("/d/u/app.apk"))
                .unwrap();

        match &request.source {
            ArtifactSource::Shared { uri } => {
                assert!(uri.starts_with("content://com.example.app.provider"));
            }
            other => panic!("expected shared source, got {:?}", other),
        }
        assert!(request.not_unknown_source);
        assert!(request.flags.new_task && request.flags.clear_top && request.flags.grant_read_uri);
        assert!(!request.flags.reset_task_if_needed);
    }

    #[test]
    fn test_scoped_install_without_shareable_uri() {
        let content = FakeContent { uri: None };
        assert!(scoped_install(&content, "a.provider", Path::new("/d/u/app.apk")).is_none());
    }

    #[test]
    fn test_legacy_install_request() {
        let downloads = FakeDownloads {
            mime: Some("application/vnd.android.package-archive".to_string()),
        };
        let request = legacy_install(&downloads, DownloadId(5), Path::new("/d/u/app.apk"));

        match &request.source {
            ArtifactSource::Direct { path, mime_type } => {
                assert_eq!(path, Path::new("/d/u/app.apk"));
                assert_eq!(
                    mime_type.as_deref(),
                    Some("application/vnd.android.package-archive")
                );
            }
            other => panic!("expected direct source, got {:?}", other),
        }
        assert!(!request.not_unknown_source);
        assert!(request.flags.new_task && request.flags.clear_top);
        assert!(!request.flags.grant_read_uri);
    }
}

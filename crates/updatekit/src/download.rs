//! Sideload download path.
//!
//! Submits at most one tracked download to the platform download service
//! and arms the completion watcher before returning. Non-blocking: the
//! transfer itself runs out of process and reports back via broadcast.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::UpdateConfig;
use crate::flight::ActiveDownload;
use crate::platform::{DownloadRequest, Platform};
use crate::watcher;

/// MIME type for installable package archives.
const MIME_TYPE: &str = "application/vnd.android.package-archive";

/// Subdirectory of the app downloads area holding update artifacts.
const UPDATES_DIR: &str = "updates";

/// Transient notice shown when a download begins.
const DOWNLOAD_STARTED_NOTICE: &str = "Update download started";

/// Display strings attached to one download request. Not persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadInfo {
    pub title: String,
    pub description: String,
}

pub(crate) fn updates_dir<P: Platform>(platform: &P) -> PathBuf {
    platform.downloads_dir().join(UPDATES_DIR)
}

/// Remove every downloaded update artifact. Best effort.
pub(crate) fn cleanup<P: Platform>(platform: &P) {
    let dir = updates_dir(platform);
    if dir.exists() {
        let _ = fs::remove_dir_all(&dir);
    }
}

/// Begin a tracked download of the configured artifact.
///
/// Silently drops the request while another download is in flight; this is
/// the at-most-one-concurrent-download policy, not an error.
pub(crate) fn begin<P: Platform>(
    platform: &Arc<P>,
    active: &Arc<ActiveDownload>,
    config: &UpdateConfig,
    info: &DownloadInfo,
) {
    let dir = updates_dir(platform.as_ref());
    let destination = dir.join(config.file_name());

    // A stale artifact must not collide with the fresh write.
    if destination.exists() {
        let _ = fs::remove_file(&destination);
    }

    if !active.try_claim() {
        debug!("Download already in flight, dropping update request");
        return;
    }

    let _ = fs::create_dir_all(&dir);

    let request = DownloadRequest {
        url: config.apk_url().to_string(),
        mime_type: MIME_TYPE.to_string(),
        title: non_blank(&info.title),
        description: non_blank(&info.description),
        destination: destination.clone(),
    };
    let id = platform.downloads().enqueue(request);
    active.record(id);
    info!("Update download enqueued: id={} url={}", id.0, config.apk_url());

    if config.show_download_messages() {
        platform.notices().show(DOWNLOAD_STARTED_NOTICE);
    }

    watcher::arm(platform, active, config.app_id(), id, destination);
}

fn non_blank(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

//! Host platform collaborator surface.
//!
//! The library never talks to the operating system directly. The host wires
//! these traits to the real facilities (package manager, download service,
//! broadcast channel, activity launcher, content sharing) and hands the
//! bundle to [`crate::Updater`] as one [`Platform`] value.

use std::path::{Path, PathBuf};

/// Opaque handle for a submitted download, issued by the download service.
///
/// Service-issued handles are non-negative; negative values are reserved by
/// the in-flight tracking cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DownloadId(pub i64);

/// A download submission passed to the platform download service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub mime_type: String,
    /// Display title, omitted when blank.
    pub title: Option<String>,
    /// Display description, omitted when blank.
    pub description: Option<String>,
    pub destination: PathBuf,
}

/// Broadcast payload announcing a finished download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadCompleted {
    pub id: DownloadId,
}

/// Token identifying one broadcast subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(pub u64);

/// Callback invoked for every download-completed broadcast.
pub type CompletionHandler = Box<dyn Fn(&DownloadCompleted) + Send + Sync>;

/// Task-stack flags attached to a launch request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaunchFlags {
    pub new_task: bool,
    pub clear_top: bool,
    pub reset_task_if_needed: bool,
    /// Grant the launched activity temporary read access to a shared URI.
    pub grant_read_uri: bool,
}

/// An activity the launcher resolved as able to handle a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityHandler {
    pub package: String,
    pub activity: String,
}

/// Where the installer should read the downloaded artifact from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    /// Content URI issued by the sharing mechanism, for systems that
    /// require scoped file access.
    Shared { uri: String },
    /// Direct file reference with the MIME type the download service
    /// recorded, for systems that accept it.
    Direct {
        path: PathBuf,
        mime_type: Option<String>,
    },
}

/// Install invocation handed to the activity launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub source: ArtifactSource,
    /// Mark the artifact as coming from a known source.
    pub not_unknown_source: bool,
    pub flags: LaunchFlags,
}

/// A request the activity launcher can resolve and dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchRequest {
    /// View an app-details page inside a store client.
    StoreListing {
        uri: String,
        /// Explicit target activity; `None` while probing for handlers.
        component: Option<ActivityHandler>,
        flags: LaunchFlags,
    },
    /// View an app-details page in a browser.
    WebPage { url: String },
    /// Install a downloaded package archive.
    Install(InstallRequest),
}

/// Package and installer metadata lookup.
pub trait PackageMetadata: Send + Sync {
    /// Package name of whichever client installed `package`, if known.
    fn installer_of(&self, package: &str) -> Option<String>;

    /// Whether `package` is installed and enabled. "Not found" and
    /// "disabled" are the same answer, never an error.
    fn package_enabled(&self, package: &str) -> bool;
}

/// OS download service: out-of-process downloads reported via broadcast.
pub trait DownloadService: Send + Sync {
    /// Submit a download. Returns immediately with the tracking handle;
    /// the transfer itself runs out of process.
    fn enqueue(&self, request: DownloadRequest) -> DownloadId;

    /// MIME type the service recorded for a finished download.
    fn mime_type_of(&self, id: DownloadId) -> Option<String>;
}

/// Inter-process broadcast channel for download-completed events.
pub trait BroadcastChannel: Send + Sync {
    /// Register a handler for download-completed events.
    fn subscribe(&self, handler: CompletionHandler) -> SubscriptionToken;

    /// Drop a subscription. Unknown or already-released tokens are ignored.
    fn unsubscribe(&self, token: SubscriptionToken);
}

/// Activity resolution and launching.
pub trait ActivityLauncher: Send + Sync {
    /// Activities able to handle `request`, in resolution order.
    fn resolve(&self, request: &LaunchRequest) -> Vec<ActivityHandler>;

    /// Dispatch `request`. Best effort; failures stay on the platform side.
    fn launch(&self, request: &LaunchRequest);
}

/// Cross-app file sharing / content ownership.
pub trait ContentBridge: Send + Sync {
    /// Shareable content URI for `file` under `authority`, or `None` when
    /// the file cannot be shared.
    fn shareable_uri(&self, authority: &str, file: &Path) -> Option<String>;
}

/// Transient user-facing notices.
pub trait NoticeSink: Send + Sync {
    /// Show a short notice. Best effort; never reports failure.
    fn show(&self, message: &str);
}

/// The full collaborator bundle a host supplies.
pub trait Platform: Send + Sync + 'static {
    fn packages(&self) -> &dyn PackageMetadata;
    fn downloads(&self) -> &dyn DownloadService;
    fn broadcasts(&self) -> &dyn BroadcastChannel;
    fn launcher(&self) -> &dyn ActivityLauncher;
    fn content(&self) -> &dyn ContentBridge;
    fn notices(&self) -> &dyn NoticeSink;

    /// Root of the app-scoped downloads area.
    fn downloads_dir(&self) -> PathBuf;

    /// Whether installs on this system must go through scoped content URIs
    /// instead of direct file references.
    fn scoped_install_required(&self) -> bool;
}

//! Updatekit Control - terminal harness for the update library.
//!
//! Wires a simulated device platform to `updatekit` so both update paths
//! can be exercised end to end from a shell: pick the environment facts
//! with flags, watch the decision and the collaborator calls in the log.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use updatekit::platform::{
    ActivityHandler, ActivityLauncher, ArtifactSource, BroadcastChannel, CompletionHandler,
    ContentBridge, DownloadCompleted, DownloadId, DownloadRequest, DownloadService, LaunchRequest,
    NoticeSink, PackageMetadata, Platform, SubscriptionToken,
};
use updatekit::strategy::is_store_package;
use updatekit::{DownloadInfo, InstallerStrategy, UpdateConfig, UpdatePath, Updater};

#[derive(Parser)]
#[command(name = "updatekitctl")]
#[command(about = "Exercise updatekit against a simulated device", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the update path and drive it
    Update {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        device: DeviceArgs,

        /// Download notification title
        #[arg(long, default_value = "")]
        title: String,

        /// Download notification description
        #[arg(long, default_value = "")]
        description: String,

        /// Deliver the completion broadcast once the download is submitted
        #[arg(long)]
        complete: bool,
    },

    /// Print which path the configured strategy resolves to
    Resolve {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Remove downloaded update artifacts
    Cleanup,
}

#[derive(Args)]
struct SourceArgs {
    /// TOML configuration file (overrides the individual flags)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Application id to update
    #[arg(long, default_value = "com.example.app")]
    app_id: String,

    /// URL the apk is downloadable from
    #[arg(long, default_value = "https://cdn.example.com/app.apk")]
    apk_url: String,

    /// Update strategy
    #[arg(long, value_enum, default_value = "installed-by-store")]
    strategy: StrategyArg,

    /// Destination file name
    #[arg(long)]
    file_name: Option<String>,

    /// Suppress the download-started notice
    #[arg(long)]
    no_messages: bool,
}

#[derive(Args)]
struct DeviceArgs {
    /// Simulated installer of the running app
    #[arg(long)]
    installer: Option<String>,

    /// Simulate an enabled store client on the device
    #[arg(long)]
    store_client: bool,

    /// Simulate a system that requires scoped install URIs
    #[arg(long)]
    scoped: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Use the store only when it installed this app
    InstalledByStore,
    /// Use the store whenever a store client is on the device
    StoreOnDevice,
}

impl From<StrategyArg> for InstallerStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::InstalledByStore => InstallerStrategy::InstalledByStore,
            StrategyArg::StoreOnDevice => InstallerStrategy::StoreOnDevice,
        }
    }
}

impl SourceArgs {
    fn into_config(self) -> Result<UpdateConfig> {
        if let Some(path) = &self.config {
            return Ok(UpdateConfig::load(path)?);
        }

        let mut builder = UpdateConfig::builder(self.app_id)
            .apk_url(self.apk_url)
            .strategy(self.strategy.into())
            .show_download_messages(!self.no_messages);
        if let Some(name) = self.file_name {
            builder = builder.file_name(name);
        }
        Ok(builder.build()?)
    }
}

type SharedHandler = Arc<dyn Fn(&DownloadCompleted) + Send + Sync>;

struct SimState {
    installer: Option<String>,
    store_client: bool,
    scoped: bool,
    downloads_dir: PathBuf,
    next_id: AtomicI64,
    next_token: AtomicU64,
    subscriptions: Mutex<HashMap<u64, SharedHandler>>,
    pending: Mutex<Option<(i64, PathBuf)>>,
}

/// Simulated device: every collaborator call is logged instead of touching
/// a real operating system.
#[derive(Clone)]
struct SimPlatform(Arc<SimState>);

impl SimPlatform {
    fn new(device: &DeviceArgs) -> Self {
        Self(Arc::new(SimState {
            installer: device.installer.clone(),
            store_client: device.store_client,
            scoped: device.scoped,
            downloads_dir: env::temp_dir().join("updatekitctl"),
            next_id: AtomicI64::new(1),
            next_token: AtomicU64::new(0),
            subscriptions: Mutex::new(HashMap::new()),
            pending: Mutex::new(None),
        }))
    }

    /// Finish the pending download: write the artifact, then broadcast.
    fn complete_download(&self) {
        let Some((id, destination)) = self.0.pending.lock().unwrap().clone() else {
            info!("[sim] No pending download to complete");
            return;
        };

        let _ = fs::write(&destination, b"simulated package archive");
        info!("[sim] Download {} finished, broadcasting completion", id);

        let handlers: Vec<SharedHandler> =
            self.0.subscriptions.lock().unwrap().values().cloned().collect();
        let event = DownloadCompleted { id: DownloadId(id) };
        for handler in handlers {
            handler(&event);
        }
    }
}

impl PackageMetadata for SimPlatform {
    fn installer_of(&self, _package: &str) -> Option<String> {
        self.0.installer.clone()
    }

    fn package_enabled(&self, package: &str) -> bool {
        self.0.store_client && is_store_package(package)
    }
}

impl DownloadService for SimPlatform {
    fn enqueue(&self, request: DownloadRequest) -> DownloadId {
        let id = self.0.next_id.fetch_add(1, Ordering::SeqCst);
        info!(
            "[sim] Download {} enqueued: {} -> {}",
            id,
            request.url,
            request.destination.display()
        );
        *self.0.pending.lock().unwrap() = Some((id, request.destination));
        DownloadId(id)
    }

    fn mime_type_of(&self, _id: DownloadId) -> Option<String> {
        Some("application/vnd.android.package-archive".to_string())
    }
}

impl BroadcastChannel for SimPlatform {
    fn subscribe(&self, handler: CompletionHandler) -> SubscriptionToken {
        let token = self.0.next_token.fetch_add(1, Ordering::SeqCst);
        self.0
            .subscriptions
            .lock()
            .unwrap()
            .insert(token, Arc::from(handler));
        info!("[sim] Broadcast subscription {} registered", token);
        SubscriptionToken(token)
    }

    fn unsubscribe(&self, token: SubscriptionToken) {
        if self.0.subscriptions.lock().unwrap().remove(&token.0).is_some() {
            info!("[sim] Broadcast subscription {} released", token.0);
        }
    }
}

impl ActivityLauncher for SimPlatform {
    fn resolve(&self, request: &LaunchRequest) -> Vec<ActivityHandler> {
        match request {
            LaunchRequest::StoreListing { .. } if self.0.store_client => vec![ActivityHandler {
                package: "com.android.vending".to_string(),
                activity: "com.android.vending.AssetBrowserActivity".to_string(),
            }],
            LaunchRequest::StoreListing { .. } => Vec::new(),
            LaunchRequest::WebPage { .. } => vec![ActivityHandler {
                package: "org.mozilla.firefox".to_string(),
                activity: "org.mozilla.firefox.BrowserActivity".to_string(),
            }],
            LaunchRequest::Install(_) => Vec::new(),
        }
    }

    fn launch(&self, request: &LaunchRequest) {
        match request {
            LaunchRequest::StoreListing { uri, component, .. } => {
                let target = component
                    .as_ref()
                    .map(|c| c.package.as_str())
                    .unwrap_or("<unresolved>");
                info!("[sim] Launching {} in {}", uri, target);
            }
            LaunchRequest::WebPage { url } => info!("[sim] Opening browser at {}", url),
            LaunchRequest::Install(install) => match &install.source {
                ArtifactSource::Shared { uri } => {
                    info!("[sim] Installer launched with shared URI {}", uri);
                }
                ArtifactSource::Direct { path, mime_type } => {
                    info!(
                        "[sim] Installer launched with file {} ({})",
                        path.display(),
                        mime_type.as_deref().unwrap_or("unknown type")
                    );
                }
            },
        }
    }
}

impl ContentBridge for SimPlatform {
    fn shareable_uri(&self, authority: &str, file: &Path) -> Option<String> {
        let name = file.file_name()?.to_string_lossy();
        let uri = format!("content://{}/{}", authority, name);
        info!("[sim] Issued shareable URI {}", uri);
        Some(uri)
    }
}

impl NoticeSink for SimPlatform {
    fn show(&self, message: &str) {
        info!("[sim] Notice: {}", message);
    }
}

impl Platform for SimPlatform {
    fn packages(&self) -> &dyn PackageMetadata {
        self
    }

    fn downloads(&self) -> &dyn DownloadService {
        self
    }

    fn broadcasts(&self) -> &dyn BroadcastChannel {
        self
    }

    fn launcher(&self) -> &dyn ActivityLauncher {
        self
    }

    fn content(&self) -> &dyn ContentBridge {
        self
    }

    fn notices(&self) -> &dyn NoticeSink {
        self
    }

    fn downloads_dir(&self) -> PathBuf {
        self.0.downloads_dir.clone()
    }

    fn scoped_install_required(&self) -> bool {
        self.0.scoped
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Update {
            source,
            device,
            title,
            description,
            complete,
        } => {
            let platform = SimPlatform::new(&device);
            let updater = Updater::new(platform.clone());
            updater.set_config(source.into_config()?);
            updater.cleanup();

            let info = DownloadInfo { title, description };
            let path = updater.update(&info)?;
            println!("update path: {}", path_name(path));

            if complete && path == UpdatePath::Sideload {
                platform.complete_download();
            }
        }
        Commands::Resolve { source, device } => {
            let platform = SimPlatform::new(&device);
            let updater = Updater::new(platform);
            updater.set_config(source.into_config()?);

            let path = if updater.can_use_store_update()? {
                UpdatePath::Store
            } else {
                UpdatePath::Sideload
            };
            println!("update path: {}", path_name(path));
        }
        Commands::Cleanup => {
            let device = DeviceArgs {
                installer: None,
                store_client: false,
                scoped: false,
            };
            let updater = Updater::new(SimPlatform::new(&device));
            updater.cleanup();
            println!("update artifacts removed");
        }
    }

    Ok(())
}

fn path_name(path: UpdatePath) -> &'static str {
    match path {
        UpdatePath::Store => "store",
        UpdatePath::Sideload => "sideload",
    }
}

//! One-shot sequential dataset loader.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use crate::context::{ContextBuilder, EngineContext};
use crate::decode;
use crate::fetch;
use crate::manifest::DatasetManifest;
use crate::progress::{LoadStatus, ProgressCallback, ProgressTracker, null_progress};
use crate::LoadError;

/// Default User-Agent for remote requests.
pub const DEFAULT_USER_AGENT: &str = "climate-risk-loader/0.1";

/// Fetches and decodes every dataset of a manifest, at most once.
pub struct DatasetLoader {
    manifest: DatasetManifest,
    client: reqwest::Client,
    started: AtomicBool,
    status: watch::Sender<LoadStatus>,
    progress: Arc<dyn ProgressCallback>,
}

impl DatasetLoader {
    /// Creates a loader for a validated manifest.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidManifest`] if the manifest fails
    /// validation, or [`LoadError::Client`] if the HTTP client cannot be
    /// built.
    pub fn new(manifest: DatasetManifest) -> Result<Self, LoadError> {
        manifest.validate()?;

        let client = reqwest::Client::builder()
            .user_agent(
                manifest
                    .user_agent
                    .as_deref()
                    .unwrap_or(DEFAULT_USER_AGENT),
            )
            .build()
            .map_err(LoadError::Client)?;

        let (status, _) = watch::channel(LoadStatus::Idle);

        Ok(Self {
            manifest,
            client,
            started: AtomicBool::new(false),
            status,
            progress: null_progress(),
        })
    }

    /// Mirrors progress to `progress` in addition to the status channel.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub const fn manifest(&self) -> &DatasetManifest {
        &self.manifest
    }

    /// Current load status.
    #[must_use]
    pub fn status(&self) -> LoadStatus {
        self.status.borrow().clone()
    }

    /// Subscribes to status changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LoadStatus> {
        self.status.subscribe()
    }

    /// Runs the load.
    ///
    /// Datasets are fetched and decoded in manifest order. On success the
    /// status becomes [`LoadStatus::Ready`]; on the first failure it becomes
    /// [`LoadStatus::Failed`] and nothing is returned but the error.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::AlreadyStarted`] if `load` was called before on
    /// this loader, otherwise the error of the first dataset that failed.
    pub async fn load(&self) -> Result<EngineContext, LoadError> {
        if self.started.swap(true, Ordering::SeqCst) {
            log::warn!("Dataset load already started; ignoring repeated request");
            return Err(LoadError::AlreadyStarted);
        }

        let mut tracker = ProgressTracker::new(self.manifest.datasets.len());

        match self.run(&mut tracker).await {
            Ok(context) => {
                self.status.send_replace(LoadStatus::Ready);
                self.progress.finish("All datasets loaded".to_string());
                log::info!("All {} datasets loaded", self.manifest.datasets.len());
                Ok(context)
            }
            Err(e) => {
                tracker.reset();
                let message = e.to_string();
                log::error!("Dataset load failed: {message}");
                self.progress.set_fraction(tracker.fraction());
                self.status.send_replace(LoadStatus::Failed {
                    message: message.clone(),
                });
                self.progress.fail(message);
                Err(e)
            }
        }
    }

    async fn run(&self, tracker: &mut ProgressTracker) -> Result<EngineContext, LoadError> {
        let total = self.manifest.datasets.len();
        self.publish(tracker.fraction());

        let mut builder = ContextBuilder::default();

        for (i, source) in self.manifest.datasets.iter().enumerate() {
            log::info!("[{}/{total}] Loading {} from {}", i + 1, source.kind, source.url);
            self.progress
                .set_message(format!("{} ({}/{total})", source.kind, i + 1));

            let bytes = fetch::fetch_bytes(&self.client, &source.url, |received, total_bytes| {
                if let Some(fraction) = tracker.on_chunk(received, total_bytes) {
                    self.publish(fraction);
                }
            })
            .await?;

            log::debug!(
                "Decoding {} bytes of {} data as {}",
                bytes.len(),
                source.kind,
                source.kind.format()
            );
            builder.add(decode::decode(source, &bytes)?);

            self.publish(tracker.complete_file());
        }

        builder.build()
    }

    fn publish(&self, fraction: f64) {
        self.status.send_replace(LoadStatus::Loading { progress: fraction });
        self.progress.set_fraction(fraction);
    }
}

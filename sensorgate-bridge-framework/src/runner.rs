//! Bridge runner for lifecycle management.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::task::JoinHandle;

use sensorgate_common::{connect, init_tracing};

use crate::BridgeArgs;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::liveliness::LivelinessManager;
use crate::publisher::Publisher;
use crate::schedule::{PeriodicTask, run_periodic};
use crate::status::StatusPublisher;

/// Bridge runner that manages the lifecycle of a device bridge.
///
/// Handles:
/// - Logging initialization
/// - Zenoh connection
/// - Task spawning and fixed-period scheduling
/// - Graceful shutdown on Ctrl+C
/// - Status publishing (optional)
///
/// # Example
///
/// ```ignore
/// use sensorgate_bridge_framework::{BridgeArgs, BridgeConfig, BridgeRunner};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let args = BridgeArgs::parse_with_default("mybridge.json5");
///     let config = MyBridgeConfig::load(&args.config)?;
///
///     let mut runner = BridgeRunner::new_with_args("mybridge", config, Some(&args)).await?;
///     runner.schedule_repeating("poll", Duration::from_secs(1), MyTask::new());
///
///     runner.run().await?;
///     Ok(())
/// }
/// ```
pub struct BridgeRunner<C: BridgeConfig> {
    /// Bridge name for logging and status.
    name: String,
    /// Bridge version.
    version: String,
    /// The loaded configuration.
    config: C,
    /// Zenoh session.
    session: Arc<zenoh::Session>,
    /// Publisher for administrative keys.
    publisher: Publisher,
    /// Status publisher (optional).
    status_publisher: Option<StatusPublisher>,
    /// Spawned tasks.
    tasks: Vec<JoinHandle<()>>,
}

impl<C: BridgeConfig> BridgeRunner<C> {
    /// Create a new bridge runner with CLI args for log level override.
    ///
    /// This will:
    /// 1. Initialize logging based on config (CLI `--log-level` wins)
    /// 2. Connect to Zenoh
    /// 3. Create the administrative publisher
    pub async fn new_with_args(
        name: impl Into<String>,
        config: C,
        args: Option<&BridgeArgs>,
    ) -> Result<Self> {
        let name = name.into();
        let version = env!("CARGO_PKG_VERSION").to_string();

        let log_config = match args.and_then(|a| a.log_level.as_deref()) {
            Some(level) => config.logging().with_level(level),
            None => config.logging().clone(),
        };

        init_tracing(&log_config).map_err(|e| BridgeError::config(e.to_string()))?;

        tracing::info!(bridge = %name, version = %version, "Starting bridge");

        let session = Arc::new(
            connect(config.zenoh())
                .await
                .map_err(|e| BridgeError::ZenohConnection(e.to_string()))?,
        );

        let publisher = Publisher::new(session.clone(), config.key_prefix());

        Ok(Self {
            name,
            version,
            config,
            session,
            publisher,
            status_publisher: None,
            tasks: Vec::new(),
        })
    }

    /// Enable status publishing.
    ///
    /// When enabled, the runner publishes status messages on startup and shutdown.
    pub fn with_status_publishing(mut self) -> Self {
        self.status_publisher = Some(StatusPublisher::new(
            self.publisher.clone(),
            &self.name,
            &self.version,
        ));
        self
    }

    /// Get the bridge name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &C {
        &self.config
    }

    /// Get a reference to the Zenoh session.
    pub fn session(&self) -> &Arc<zenoh::Session> {
        &self.session
    }

    /// Declare the bridge liveliness token under the bridge prefix.
    pub async fn liveliness(&self) -> Result<LivelinessManager> {
        LivelinessManager::new(self.session.clone(), self.config.key_prefix()).await
    }

    /// Publish an "error" status, if status publishing is enabled.
    pub async fn report_error(&self, error: impl Into<String>) {
        if let Some(ref status_pub) = self.status_publisher {
            if let Err(e) = status_pub.publish_error(error).await {
                tracing::warn!(error = %e, "Failed to publish error status");
            }
        }
    }

    /// Spawn a worker task.
    ///
    /// The task will be tracked and aborted on shutdown.
    pub fn spawn<F>(&mut self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        self.tasks.push(handle);
    }

    /// Run `task` every `period` until shutdown.
    ///
    /// Runs are sequential: a slow run delays the next one instead of
    /// overlapping it.
    pub fn schedule_repeating<T: PeriodicTask>(
        &mut self,
        name: impl Into<String>,
        period: Duration,
        task: T,
    ) {
        let name = name.into();
        tracing::info!(task = %name, period_ms = period.as_millis() as u64, "Scheduling repeating task");
        self.spawn(run_periodic(period, task));
    }

    /// Run the bridge until Ctrl+C is received.
    pub async fn run(self) -> Result<()> {
        self.run_with_metadata(None).await
    }

    /// Run the bridge with custom status metadata.
    ///
    /// This will:
    /// 1. Publish "running" status (if enabled)
    /// 2. Wait for Ctrl+C signal
    /// 3. Abort all spawned tasks
    /// 4. Publish "offline" status (if enabled)
    /// 5. Close the Zenoh session
    pub async fn run_with_metadata(self, metadata: Option<serde_json::Value>) -> Result<()> {
        if let Some(ref status_pub) = self.status_publisher {
            if let Err(e) = status_pub.publish_running(metadata).await {
                tracing::warn!(error = %e, "Failed to publish running status");
            }
        }

        tracing::info!(
            bridge = %self.name,
            tasks = self.tasks.len(),
            "Bridge running. Press Ctrl+C to stop."
        );

        signal::ctrl_c().await?;

        tracing::info!(bridge = %self.name, "Received shutdown signal");

        for task in &self.tasks {
            task.abort();
        }

        // Let aborted tasks drop their serial handles and publishers
        tokio::time::sleep(Duration::from_millis(100)).await;

        if let Some(ref status_pub) = self.status_publisher {
            if let Err(e) = status_pub.publish_offline().await {
                tracing::warn!(error = %e, "Failed to publish offline status");
            }
        }

        self.session
            .close()
            .await
            .map_err(|e| BridgeError::ZenohSession(e.to_string()))?;

        tracing::info!(bridge = %self.name, "Goodbye!");

        Ok(())
    }
}

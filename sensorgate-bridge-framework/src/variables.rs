//! Scalar variable nodes backed by caching Zenoh publishers.
//!
//! A bridge exposes device readings as named scalar variables. Each node
//! maps to the key expression `<prefix>/<source>/<node>` and owns a zenoh-ext
//! [`AdvancedPublisher`] with a sample cache, so a subscriber that joins late
//! still receives the current value of every node.
//!
//! # Example
//!
//! ```ignore
//! use sensorgate_bridge_framework::{VariablePublisher, VariableServer, VariableServerConfig};
//!
//! let server = VariableServer::new(session.clone(), "sensorgate/serial", "arduino01",
//!     Format::Json, VariableServerConfig::default());
//!
//! server.create_scalar_node("temperature", 0.0).await?;
//! server.write_value("temperature", 23.5).await?;
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use zenoh::Session;
use zenoh_ext::{AdvancedPublisher, AdvancedPublisherBuilderExt, CacheConfig, MissDetectionConfig};

use sensorgate_common::{Format, KeyExprBuilder, VariableSample, encode, validate_chunk};

use crate::error::{BridgeError, Result};

/// Address space of named scalar variables.
///
/// Nodes are created once at startup and overwritten on every update. Writes
/// are last-value overwrites with no transactional grouping across nodes.
pub trait VariablePublisher: Send + Sync {
    /// Create a named scalar node holding `initial_value`.
    fn create_scalar_node(
        &self,
        name: &str,
        initial_value: f32,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Overwrite the value of an existing node.
    fn write_value(&self, name: &str, value: f32) -> impl Future<Output = Result<()>> + Send;
}

/// Configuration for variable node publishers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableServerConfig {
    /// Number of samples cached per node for late joiners.
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,

    /// Enable sample miss detection.
    #[serde(default)]
    pub miss_detection: bool,

    /// Heartbeat period for miss detection, in milliseconds.
    #[serde(default = "default_heartbeat_ms")]
    pub heartbeat_ms: u64,

    /// Let subscribers detect when this publisher appears or disappears.
    #[serde(default = "default_publisher_detection")]
    pub publisher_detection: bool,
}

fn default_cache_size() -> usize {
    1
}

fn default_heartbeat_ms() -> u64 {
    500
}

fn default_publisher_detection() -> bool {
    true
}

impl Default for VariableServerConfig {
    fn default() -> Self {
        Self {
            cache_size: default_cache_size(),
            miss_detection: false,
            heartbeat_ms: default_heartbeat_ms(),
            publisher_detection: default_publisher_detection(),
        }
    }
}

impl VariableServerConfig {
    /// Heartbeat period as a [`Duration`].
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms)
    }
}

/// [`VariablePublisher`] over a Zenoh session.
pub struct VariableServer {
    session: Arc<Session>,
    keys: KeyExprBuilder,
    source: String,
    format: Format,
    config: VariableServerConfig,
    nodes: RwLock<HashMap<String, AdvancedPublisher<'static>>>,
}

impl std::fmt::Debug for VariableServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariableServer")
            .field("prefix", &self.keys.prefix())
            .field("source", &self.source)
            .field("format", &self.format)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl VariableServer {
    /// Create a variable server publishing nodes of `source` under `key_prefix`.
    pub fn new(
        session: Arc<Session>,
        key_prefix: impl Into<String>,
        source: impl Into<String>,
        format: Format,
        config: VariableServerConfig,
    ) -> Self {
        Self {
            session,
            keys: KeyExprBuilder::new(key_prefix),
            source: source.into(),
            format,
            config,
            nodes: RwLock::new(HashMap::new()),
        }
    }

    /// Key expression of a node.
    pub fn node_key(&self, name: &str) -> String {
        self.keys.variable(&self.source, name)
    }

    /// Names of the nodes created so far.
    pub async fn node_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.nodes.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    fn sample_payload(&self, name: &str, value: f32) -> Result<Vec<u8>> {
        let sample = VariableSample::new(&self.source, name, value);
        encode(&sample, self.format).map_err(|e| BridgeError::Serialization(e.to_string()))
    }

    async fn declare(&self, key: String) -> Result<AdvancedPublisher<'static>> {
        let mut builder = self
            .session
            .declare_publisher(key.clone())
            .cache(CacheConfig::default().max_samples(self.config.cache_size));

        if self.config.miss_detection {
            builder = builder.sample_miss_detection(
                MissDetectionConfig::default().heartbeat(self.config.heartbeat_interval()),
            );
        }

        if self.config.publisher_detection {
            builder = builder.publisher_detection();
        }

        builder.await.map_err(|e| BridgeError::Publish {
            key,
            message: format!("Failed to declare variable publisher: {}", e),
        })
    }
}

impl VariablePublisher for VariableServer {
    async fn create_scalar_node(&self, name: &str, initial_value: f32) -> Result<()> {
        validate_chunk(name)?;

        // Held across the declaration so concurrent creates publish once.
        let mut nodes = self.nodes.write().await;
        if nodes.contains_key(name) {
            tracing::debug!(node = %name, "Variable node already exists");
            return Ok(());
        }

        let key = self.node_key(name);
        let publisher = self.declare(key.clone()).await?;

        let payload = self.sample_payload(name, initial_value)?;
        publisher
            .put(payload)
            .await
            .map_err(|e| BridgeError::Publish {
                key: key.clone(),
                message: e.to_string(),
            })?;

        nodes.insert(name.to_string(), publisher);

        tracing::info!(node = %name, key = %key, initial_value, "Variable node created");

        Ok(())
    }

    async fn write_value(&self, name: &str, value: f32) -> Result<()> {
        let nodes = self.nodes.read().await;
        let publisher = nodes
            .get(name)
            .ok_or_else(|| BridgeError::UnknownNode(name.to_string()))?;

        let payload = self.sample_payload(name, value)?;
        publisher
            .put(payload)
            .await
            .map_err(|e| BridgeError::Publish {
                key: self.node_key(name),
                message: e.to_string(),
            })?;

        tracing::trace!(node = %name, value, "Variable written");

        Ok(())
    }
}

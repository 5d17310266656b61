//! Plain Zenoh publisher for administrative messages.

use std::sync::Arc;

use sensorgate_common::KeyExprBuilder;

use crate::error::{BridgeError, Result};

/// Publisher for one-off puts under a bridge prefix (status, metadata).
///
/// Variable values go through [`VariableServer`](crate::VariableServer),
/// which keeps a caching publisher per node. This type is for keys that
/// are written rarely and don't need a declared publisher.
#[derive(Clone, Debug)]
pub struct Publisher {
    session: Arc<zenoh::Session>,
    keys: KeyExprBuilder,
}

impl Publisher {
    /// Create a new publisher.
    pub fn new(session: Arc<zenoh::Session>, key_prefix: impl Into<String>) -> Self {
        Self {
            session,
            keys: KeyExprBuilder::new(key_prefix),
        }
    }

    /// Get the key expression builder for this prefix.
    pub fn keys(&self) -> &KeyExprBuilder {
        &self.keys
    }

    /// Publish raw bytes to a key.
    pub async fn publish_raw(&self, key: &str, payload: Vec<u8>) -> Result<()> {
        self.session
            .put(key, payload)
            .await
            .map_err(|e| BridgeError::Publish {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }

    /// Publish a JSON value to a key.
    pub async fn publish_json<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let payload = serde_json::to_vec(value)?;
        self.publish_raw(key, payload).await
    }
}

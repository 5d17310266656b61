//! Liveliness tokens for presence detection.
//!
//! Liveliness tokens let subscribers detect instantly when a bridge or the
//! device behind it comes online or goes offline.
//!
//! # Key Expressions
//!
//! - Bridge liveliness: `<prefix>/@/alive`
//! - Device liveliness: `<prefix>/@/devices/<device_id>/alive`

use std::collections::HashMap;
use std::sync::Arc;

use sensorgate_common::KeyExprBuilder;
use tokio::sync::RwLock;
use zenoh::Session;
use zenoh::liveliness::LivelinessToken;

use crate::error::{BridgeError, Result};

/// Manages liveliness tokens for a bridge and its devices.
///
/// The bridge token is declared on creation and undeclared on drop.
#[derive(Debug)]
pub struct LivelinessManager {
    session: Arc<Session>,
    keys: KeyExprBuilder,
    #[allow(dead_code)]
    bridge_token: LivelinessToken,
    device_tokens: RwLock<HashMap<String, LivelinessToken>>,
}

impl LivelinessManager {
    /// Create a new liveliness manager and declare the bridge as alive.
    pub async fn new(session: Arc<Session>, key_prefix: impl Into<String>) -> Result<Self> {
        let keys = KeyExprBuilder::new(key_prefix);
        let bridge_key = keys.alive_key();

        let bridge_token = session
            .liveliness()
            .declare_token(&bridge_key)
            .await
            .map_err(|e| {
                BridgeError::liveliness(format!("Failed to declare bridge token: {}", e))
            })?;

        tracing::info!(key = %bridge_key, "Bridge liveliness token declared");

        Ok(Self {
            session,
            keys,
            bridge_token,
            device_tokens: RwLock::new(HashMap::new()),
        })
    }

    /// Declare a device as alive. No-op if it already is.
    pub async fn declare_device_alive(&self, device_id: &str) -> Result<()> {
        if self.is_device_alive(device_id).await {
            return Ok(());
        }

        let device_key = self.keys.device_alive_key(device_id);

        let token = self
            .session
            .liveliness()
            .declare_token(&device_key)
            .await
            .map_err(|e| {
                BridgeError::liveliness(format!(
                    "Failed to declare device token for {}: {}",
                    device_id, e
                ))
            })?;

        tracing::info!(device = %device_id, key = %device_key, "Device liveliness token declared");

        self.device_tokens
            .write()
            .await
            .insert(device_id.to_string(), token);

        Ok(())
    }

    /// Undeclare a device (mark as offline).
    ///
    /// Dropping the token undeclares it; subscribers receive a DELETE.
    pub async fn undeclare_device(&self, device_id: &str) {
        if self.device_tokens.write().await.remove(device_id).is_some() {
            tracing::info!(device = %device_id, "Device liveliness token undeclared");
        }
    }

    /// Check if a device is currently declared as alive.
    pub async fn is_device_alive(&self, device_id: &str) -> bool {
        self.device_tokens.read().await.contains_key(device_id)
    }
}

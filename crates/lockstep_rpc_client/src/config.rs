use std::collections::HashMap;

use lockstep_query::{ReplicatedClient, ReplicationConfig};
use serde::{Deserialize, Serialize};

use crate::{RpcClient, RpcClientError};

/// Configuration of the JSON-RPC transport.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcClientConfig {
    /// URLs of the remote nodes. Requests rotate over the endpoints.
    pub endpoints: Vec<String>,
    /// Extra HTTP headers sent with every request.
    #[serde(default)]
    pub http_headers: Option<HashMap<String, String>>,
}

/// Configuration of a replicated JSON-RPC client.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// The transport configuration
    #[serde(flatten)]
    pub rpc: RpcClientConfig,
    /// The replication configuration
    #[serde(default)]
    pub replication: ReplicationConfig,
}

/// Error that occurs when parsing a [`ClientConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid JSON configuration
    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// Invalid TOML configuration
    #[error("Invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ClientConfig {
    /// Parses the configuration from a JSON string.
    pub fn from_json_str(config: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(config)?)
    }

    /// Parses the configuration from a TOML string.
    pub fn from_toml_str(config: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(config)?)
    }
}

/// Creates a replicated client for the configured endpoints.
pub fn connect(config: &ClientConfig) -> Result<ReplicatedClient<RpcClient>, RpcClientError> {
    let client = RpcClient::new(&config.rpc)?;

    log::debug!(
        "Replicating queries {} times across {} endpoint(s)",
        config.replication.replicas,
        client.endpoints().len()
    );

    Ok(ReplicatedClient::with_config(
        client,
        config.replication.clone(),
    ))
}

use crate::types::NodeIdentity;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tsdb_common::{Result, TsdbError};

/// Prefix of environment variables that override file settings,
/// e.g. `TSDB_CLUSTER__USE_ASYNC_TRANSPORT=false`
pub const ENV_PREFIX: &str = "TSDB_CLUSTER";

/// Cluster configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// This node's identity
    #[serde(default)]
    pub this_node: NodeIdentity,

    /// Query node status through the non-blocking transport instead of pooled
    /// blocking connections
    #[serde(default = "default_use_async_transport")]
    pub use_async_transport: bool,
}

fn default_use_async_transport() -> bool {
    true
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            this_node: NodeIdentity::default(),
            use_async_transport: default_use_async_transport(),
        }
    }
}

impl ClusterConfig {
    /// Loads the configuration from a file, letting environment variables override it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| TsdbError::configuration(e.to_string()))?;

        let config: ClusterConfig = settings
            .try_deserialize()
            .map_err(|e| TsdbError::configuration(e.to_string()))?;

        tracing::info!(
            this_node = %config.this_node,
            use_async_transport = config.use_async_transport,
            "Loaded cluster configuration"
        );

        Ok(config)
    }
}

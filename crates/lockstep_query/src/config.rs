use core::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

/// The default number of replicas per query invocation.
pub const DEFAULT_REPLICAS: NonZeroUsize = match NonZeroUsize::new(4) {
    Some(replicas) => replicas,
    None => unreachable!(),
};

/// Policy for deciding whether replica results agree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Agreement {
    /// All replicas must return canonically equal values.
    #[default]
    Unanimous,
}

/// Configuration for replicating queries.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationConfig {
    /// The number of concurrent invocations per query.
    #[serde(default = "default_replicas")]
    pub replicas: NonZeroUsize,
    /// How replica results are reconciled.
    #[serde(default)]
    pub agreement: Agreement,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            replicas: DEFAULT_REPLICAS,
            agreement: Agreement::default(),
        }
    }
}

fn default_replicas() -> NonZeroUsize {
    DEFAULT_REPLICAS
}

use crate::QueryMethod;

/// Errors of a [`ReplicatedClient`](crate::ReplicatedClient).
#[derive(Debug, thiserror::Error)]
pub enum ReplicationError<ClientErrorT: std::error::Error + 'static> {
    /// The block number used as default argument could not be retrieved. No
    /// replicas were dispatched.
    #[error("Failed to retrieve the block number to query at: {0}")]
    BlockReference(#[source] ClientErrorT),
    /// A replica failed. This is the first failure that was observed.
    #[error(transparent)]
    Replica(ClientErrorT),
    /// A non-replicated call that was forwarded to the inner client failed.
    #[error(transparent)]
    Passthrough(ClientErrorT),
    /// All replicas succeeded, but their results differ.
    #[error(
        "Query nodes do not match: replica {mismatch_index} of {replicas} returned a different result for '{method}'"
    )]
    Disagreement {
        /// The replicated method
        method: QueryMethod,
        /// The number of replicas
        replicas: usize,
        /// The index of the first replica that differs from the first replica
        mismatch_index: usize,
    },
}

impl<ClientErrorT: std::error::Error + 'static> ReplicationError<ClientErrorT> {
    /// Whether the error is caused by replicas returning different results,
    /// as opposed to a failure of the inner client.
    pub fn is_disagreement(&self) -> bool {
        matches!(self, ReplicationError::Disagreement { .. })
    }

    /// Returns the inner client's error, if any.
    pub fn into_client_error(self) -> Option<ClientErrorT> {
        match self {
            ReplicationError::BlockReference(error)
            | ReplicationError::Replica(error)
            | ReplicationError::Passthrough(error) => Some(error),
            ReplicationError::Disagreement { .. } => None,
        }
    }
}

use std::{borrow::Cow, ops::Deref};

use alloy_primitives::U256;
use async_trait::async_trait;
use futures::{StreamExt as _, stream::FuturesUnordered};

use crate::{Agreement, QueryClient, QueryMethod, QueryValue, ReplicationConfig, ReplicationError};

/// A [`QueryClient`] that replicates every query against its inner client and
/// only returns results that all replicas agree on.
///
/// Members of the inner client that aren't part of [`QueryClient`] are
/// accessible through [`Deref`] and are never replicated.
#[derive(Debug)]
pub struct ReplicatedClient<ClientT> {
    inner: ClientT,
    config: ReplicationConfig,
}

impl<ClientT: QueryClient> ReplicatedClient<ClientT> {
    /// Creates a new instance with the default configuration.
    pub fn new(inner: ClientT) -> Self {
        Self::with_config(inner, ReplicationConfig::default())
    }

    /// Creates a new instance with the provided configuration.
    pub fn with_config(inner: ClientT, config: ReplicationConfig) -> Self {
        Self { inner, config }
    }

    /// The replication configuration.
    pub fn config(&self) -> &ReplicationConfig {
        &self.config
    }

    /// The inner client.
    pub fn inner(&self) -> &ClientT {
        &self.inner
    }

    /// Converts the instance into its inner client.
    pub fn into_inner(self) -> ClientT {
        self.inner
    }

    /// Pins parameterless queries to the latest block number, so all replicas
    /// query the same block.
    async fn normalize_params<'params>(
        &self,
        method: QueryMethod,
        params: &'params [QueryValue],
    ) -> Result<Cow<'params, [QueryValue]>, ReplicationError<ClientT::Error>> {
        if !params.is_empty() {
            return Ok(Cow::Borrowed(params));
        }

        let block_number = self
            .inner
            .block_number()
            .await
            .map_err(ReplicationError::BlockReference)?;

        log::trace!("Pinning '{method}' to block number {block_number}");

        Ok(Cow::Owned(vec![QueryValue::Quantity(U256::from(
            block_number,
        ))]))
    }

    /// Invokes the method on all replicas concurrently and waits for all of
    /// them to settle. Values are returned in replica order.
    async fn dispatch(
        &self,
        method: QueryMethod,
        params: &[QueryValue],
    ) -> Result<Vec<QueryValue>, ReplicationError<ClientT::Error>> {
        let replicas = self.config.replicas.get();

        log::debug!("Dispatching {replicas} replicas of '{method}'");

        let mut pending = (0..replicas)
            .map(|index| async move { (index, self.inner.call(method, params).await) })
            .collect::<FuturesUnordered<_>>();

        let mut values = Vec::with_capacity(replicas);
        let mut first_error = None;
        while let Some((index, result)) = pending.next().await {
            match result {
                Ok(value) => values.push((index, value)),
                Err(error) => {
                    if first_error.is_none() {
                        first_error = Some(error);
                    } else {
                        log::debug!("Discarding failure of replica {index} of '{method}': {error}");
                    }
                }
            }
        }

        if let Some(error) = first_error {
            return Err(ReplicationError::Replica(error));
        }

        values.sort_unstable_by_key(|(index, _)| *index);
        Ok(values.into_iter().map(|(_, value)| value).collect())
    }
}

/// Returns the first value if all values are canonically equal to it.
/// Otherwise, returns the index of the first value that differs.
fn unanimous_value(values: Vec<QueryValue>) -> Result<QueryValue, usize> {
    let mut values = values.into_iter();
    let Some(first) = values.next() else {
        unreachable!("the number of replicas is non-zero")
    };

    match values.position(|value| !value.canonical_eq(&first)) {
        None => Ok(first),
        Some(offset) => Err(offset + 1),
    }
}

#[async_trait]
impl<ClientT: QueryClient> QueryClient for ReplicatedClient<ClientT> {
    type Error = ReplicationError<ClientT::Error>;

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "trace", skip(self, params))
    )]
    async fn call(
        &self,
        method: QueryMethod,
        params: &[QueryValue],
    ) -> Result<QueryValue, Self::Error> {
        if !method.is_replicated() {
            return self
                .inner
                .call(method, params)
                .await
                .map_err(ReplicationError::Passthrough);
        }

        let params = self.normalize_params(method, params).await?;
        let values = self.dispatch(method, &params).await?;

        let replicas = values.len();
        let outcome = match self.config.agreement {
            Agreement::Unanimous => unanimous_value(values),
        };

        outcome.map_err(|mismatch_index| {
            log::warn!(
                "Replica {mismatch_index} of {replicas} returned a different result for '{method}'"
            );

            ReplicationError::Disagreement {
                method,
                replicas,
                mismatch_index,
            }
        })
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(self)))]
    async fn block_number(&self) -> Result<u64, Self::Error> {
        self.inner
            .block_number()
            .await
            .map_err(ReplicationError::Passthrough)
    }
}

impl<ClientT> Deref for ReplicatedClient<ClientT> {
    type Target = ClientT;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

use async_trait::async_trait;
use auto_impl::auto_impl;

use crate::{QueryMethod, QueryValue};

/// Trait for clients that execute read queries against a blockchain node.
#[async_trait]
#[auto_impl(&, Arc)]
pub trait QueryClient: Send + Sync {
    /// The client's error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Invokes the query method with the provided positional parameters.
    async fn call(
        &self,
        method: QueryMethod,
        params: &[QueryValue],
    ) -> Result<QueryValue, Self::Error>;

    /// Retrieves the number of the latest block.
    async fn block_number(&self) -> Result<u64, Self::Error>;
}

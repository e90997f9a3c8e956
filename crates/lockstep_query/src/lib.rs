#![warn(missing_docs)]

//! Replicated read queries for Ethereum JSON-RPC clients.
//!
//! A [`ReplicatedClient`] wraps any [`QueryClient`] and sends every
//! replicable query to the inner client several times concurrently. The value
//! is only returned when all replicas agree; otherwise the call fails with
//! [`ReplicationError::Disagreement`].

mod client;
mod config;
mod error;
mod method;
mod replicated;
/// Utilities for testing [`QueryClient`] consumers.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
mod value;

pub use self::{
    client::QueryClient,
    config::{Agreement, DEFAULT_REPLICAS, ReplicationConfig},
    error::ReplicationError,
    method::{ParseQueryMethodError, QueryMethod, is_query},
    replicated::ReplicatedClient,
    value::QueryValue,
};
pub use alloy_primitives::U256;

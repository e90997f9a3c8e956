#![warn(missing_docs)]

//! Ethereum JSON-RPC transport for replicated queries.
//!
//! [`RpcClient`] executes query methods against one or more remote nodes and
//! [`connect`] wraps it in a [`lockstep_query::ReplicatedClient`].

mod client;
mod config;
/// Types for the JSON-RPC protocol
pub mod jsonrpc;
/// Formatting of query method parameters
pub mod params;
mod reqwest_error;

pub use reqwest::header;

pub use self::{
    client::{RpcClient, RpcClientError},
    config::{ClientConfig, ConfigError, RpcClientConfig, connect},
    params::InvalidParamsError,
    reqwest_error::{MiddlewareError, ReqwestError},
};

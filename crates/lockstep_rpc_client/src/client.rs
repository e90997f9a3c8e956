use std::{
    str::FromStr as _,
    sync::atomic::{AtomicU64, AtomicUsize, Ordering},
    time::Duration,
};

use alloy_primitives::{B256, U64, hex};
use async_trait::async_trait;
use futures::{TryFutureExt as _, future};
use lockstep_query::{QueryClient, QueryMethod, QueryValue};
use reqwest::{
    Client as HttpClient,
    header::{self, HeaderMap, HeaderName, HeaderValue},
};
use reqwest_middleware::{ClientBuilder as HttpClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::OnceCell;

use crate::{
    MiddlewareError, ReqwestError, RpcClientConfig, jsonrpc,
    params::{self, InvalidParamsError},
};

// Retry parameters for rate limited requests.
const MIN_RETRY_INTERVAL: Duration = Duration::from_secs(1);
const MAX_RETRY_INTERVAL: Duration = Duration::from_secs(32);
const MAX_RETRIES: u32 = 9;

// Serialized as an empty JSON array, as some nodes reject `null` params.
const NO_PARAMS: [u8; 0] = [];

/// Specialized error types
#[derive(Debug, thiserror::Error)]
pub enum RpcClientError {
    /// The message could not be sent to the remote node
    #[error(transparent)]
    FailedToSend(MiddlewareError),

    /// The remote node failed to reply with the body of the response
    #[error("The response text was corrupted: {0}.")]
    CorruptedResponse(ReqwestError),

    /// The server returned an error code.
    #[error("The Http server returned error status code: {0}")]
    HttpStatus(ReqwestError),

    /// An HTTP header has an invalid name or value.
    #[error("Invalid HTTP header '{name}'")]
    InvalidHeader {
        /// The header name
        name: String,
    },

    /// The request cannot be serialized as JSON.
    #[error(transparent)]
    InvalidJsonRequest(serde_json::Error),

    /// The parameters of a query method are invalid.
    #[error(transparent)]
    InvalidParams(#[from] InvalidParamsError),

    /// The server returned an invalid JSON-RPC response.
    #[error(
        "Response '{response}' failed to parse with expected type '{expected_type}', due to error: '{error}'"
    )]
    InvalidResponse {
        /// The response text
        response: String,
        /// The expected type of the response
        expected_type: &'static str,
        /// The parse error
        error: serde_json::Error,
    },

    /// Invalid URL format
    #[error(transparent)]
    InvalidUrl(#[from] url::ParseError),

    /// The JSON-RPC returned an error.
    #[error("{error}. Request: {request}")]
    JsonRpcError {
        /// The JSON-RPC error
        error: jsonrpc::Error,
        /// The request JSON
        request: String,
    },

    /// No remote node URLs were configured.
    #[error("At least one endpoint is required")]
    NoEndpoints,
}

/// A client for executing JSON-RPC methods on one or more remote Ethereum
/// nodes.
///
/// Each request is sent to the next endpoint in round-robin order, so
/// concurrent replicas of a query are spread over the configured nodes.
#[derive(Debug)]
pub struct RpcClient {
    endpoints: Vec<url::Url>,
    next_endpoint: AtomicUsize,
    chain_id: OnceCell<u64>,
    client: ClientWithMiddleware,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Creates a new instance from the provided configuration.
    pub fn new(config: &RpcClientConfig) -> Result<Self, RpcClientError> {
        let extra_headers = config
            .http_headers
            .as_ref()
            .map(|headers| {
                headers
                    .iter()
                    .map(|(name, value)| {
                        let invalid_header = || RpcClientError::InvalidHeader {
                            name: name.clone(),
                        };

                        let name = HeaderName::from_str(name).map_err(|_error| invalid_header())?;
                        let value =
                            HeaderValue::from_str(value).map_err(|_error| invalid_header())?;

                        Ok((name, value))
                    })
                    .collect::<Result<HeaderMap, RpcClientError>>()
            })
            .transpose()?;

        Self::with_endpoints(&config.endpoints, extra_headers)
    }

    /// Creates a new instance, given the URLs of remote nodes.
    pub fn with_endpoints(
        urls: &[impl AsRef<str>],
        extra_headers: Option<HeaderMap>,
    ) -> Result<Self, RpcClientError> {
        let endpoints = urls
            .iter()
            .map(|url| url.as_ref().parse())
            .collect::<Result<Vec<url::Url>, _>>()?;

        if endpoints.is_empty() {
            return Err(RpcClientError::NoEndpoints);
        }

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(MIN_RETRY_INTERVAL, MAX_RETRY_INTERVAL)
            .build_with_max_retries(MAX_RETRIES);

        let mut headers = extra_headers.unwrap_or_default();
        headers.append(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.append(
            header::USER_AGENT,
            HeaderValue::from_str(&format!("lockstep {}", env!("CARGO_PKG_VERSION")))
                .expect("Version string is valid header value"),
        );

        let client = HttpClient::builder()
            .default_headers(headers)
            .build()
            .expect("Default construction nor setting default headers can cause an error");

        let client = HttpClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(RpcClient {
            endpoints,
            next_endpoint: AtomicUsize::new(0),
            chain_id: OnceCell::new(),
            client,
            next_id: AtomicU64::new(0),
        })
    }

    /// The URLs of the remote nodes.
    pub fn endpoints(&self) -> &[url::Url] {
        &self.endpoints
    }

    fn next_endpoint(&self) -> &url::Url {
        let index = self.next_endpoint.fetch_add(1, Ordering::Relaxed) % self.endpoints.len();
        self.endpoints
            .get(index)
            .expect("endpoints are non-empty and the index is in bounds")
    }

    fn parse_response_str<SuccessT: DeserializeOwned>(
        response: String,
    ) -> Result<jsonrpc::ResponseData<SuccessT>, RpcClientError> {
        serde_json::from_str(&response)
            .and_then(jsonrpc::Response::into_data::<SuccessT>)
            .map_err(|error| RpcClientError::InvalidResponse {
                response,
                expected_type: std::any::type_name::<SuccessT>(),
                error,
            })
    }

    async fn retry_on_sporadic_failure<T: DeserializeOwned>(
        &self,
        error: jsonrpc::Error,
        request: SerializedRequest,
    ) -> Result<T, RpcClientError> {
        let is_missing_trie_node_error =
            error.code == -32000 && error.message.to_lowercase().contains("missing trie node");

        let result = if is_missing_trie_node_error {
            self.send_request_body(&request)
                .await
                .and_then(Self::parse_response_str)?
                .into_result()
        } else {
            Err(error)
        };

        result.map_err(|error| RpcClientError::JsonRpcError {
            error,
            request: request.to_json_string(),
        })
    }

    async fn send_request_and_extract_result<SuccessT: DeserializeOwned>(
        &self,
        request: SerializedRequest,
    ) -> Result<SuccessT, RpcClientError> {
        future::ready(
            self.send_request_body(&request)
                .await
                .and_then(Self::parse_response_str)?
                .into_result(),
        )
        // We retry at the application level because some providers have sporadic
        // failures that are returned in the JSON-RPC layer
        .or_else(|error| async { self.retry_on_sporadic_failure(error, request).await })
        .await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip_all))]
    async fn send_request_body(
        &self,
        request_body: &SerializedRequest,
    ) -> Result<String, RpcClientError> {
        self.client
            .post(self.next_endpoint().clone())
            .body(request_body.to_json_string())
            .send()
            .await
            .map_err(|err| RpcClientError::FailedToSend(err.into()))?
            .error_for_status()
            .map_err(|err| RpcClientError::HttpStatus(err.into()))?
            .text()
            .await
            .map_err(|err| RpcClientError::CorruptedResponse(err.into()))
    }

    fn serialize_request<ParamsT: Serialize>(
        &self,
        method: &str,
        params: ParamsT,
    ) -> Result<SerializedRequest, RpcClientError> {
        let id = jsonrpc::Id::Num(self.next_id.fetch_add(1, Ordering::Relaxed));
        let request = serde_json::to_value(jsonrpc::Request {
            version: jsonrpc::Version::V2_0,
            id,
            method,
            params,
        })
        .map_err(RpcClientError::InvalidJsonRequest)?;

        Ok(SerializedRequest(request))
    }

    /// Calls the JSON-RPC method with the provided parameters and returns the
    /// result.
    pub async fn request<SuccessT: DeserializeOwned>(
        &self,
        method: &str,
        params: impl Serialize,
    ) -> Result<SuccessT, RpcClientError> {
        let request = self.serialize_request(method, params)?;
        self.send_request_and_extract_result(request).await
    }

    /// Calls `eth_blockNumber` and returns the block number.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(self)))]
    pub async fn block_number(&self) -> Result<u64, RpcClientError> {
        self.request::<U64>("eth_blockNumber", NO_PARAMS)
            .await
            .map(|block_number| block_number.to::<u64>())
    }

    /// Calls `eth_chainId` once and returns the chain ID.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(self)))]
    pub async fn chain_id(&self) -> Result<u64, RpcClientError> {
        let chain_id = *self
            .chain_id
            .get_or_try_init(|| async {
                self.request::<U64>("eth_chainId", NO_PARAMS)
                    .await
                    .map(|chain_id| chain_id.to::<u64>())
            })
            .await?;
        Ok(chain_id)
    }

    /// Calls `eth_sendRawTransaction` and returns the transaction hash.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip_all))]
    pub async fn send_raw_transaction(&self, transaction: &[u8]) -> Result<B256, RpcClientError> {
        self.request(
            "eth_sendRawTransaction",
            [hex::encode_prefixed(transaction)],
        )
        .await
    }
}

#[async_trait]
impl QueryClient for RpcClient {
    type Error = RpcClientError;

    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(self)))]
    async fn call(
        &self,
        method: QueryMethod,
        params: &[QueryValue],
    ) -> Result<QueryValue, Self::Error> {
        let request = params::format_request(method, params)?;

        self.request::<serde_json::Value>(request.method, request.params)
            .await
            .map(QueryValue::from)
    }

    async fn block_number(&self) -> Result<u64, Self::Error> {
        RpcClient::block_number(self).await
    }
}

#[derive(Debug, Clone, serde::Deserialize, Serialize)]
#[repr(transparent)]
#[serde(transparent)]
struct SerializedRequest(serde_json::Value);

impl SerializedRequest {
    fn to_json_string(&self) -> String {
        self.0.to_string()
    }
}

use core::str::FromStr as _;

use alloy_primitives::{Address, B256, U256};
use lockstep_query::{QueryMethod, QueryValue};

const BLOCK_TAGS: [&str; 5] = ["latest", "earliest", "pending", "safe", "finalized"];

/// Kinds of positional parameters accepted by query methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// A 20-byte account address
    Address,
    /// A block number or tag
    Block,
    /// A block number, tag, or 32-byte block hash
    BlockOrHash,
    /// A 32-byte hash
    Hash,
    /// A quantity used as position or index
    Index,
    /// A boolean flag
    Bool,
    /// A log filter object
    Filter,
    /// A list of storage slots
    StorageKeys,
}

/// A positional parameter of a query method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Param {
    /// The kind of parameter
    pub kind: ParamKind,
    /// Whether the parameter has a default value when omitted
    pub optional: bool,
}

impl Param {
    const fn required(kind: ParamKind) -> Self {
        Self {
            kind,
            optional: false,
        }
    }

    const fn optional(kind: ParamKind) -> Self {
        Self {
            kind,
            optional: true,
        }
    }
}

const ADDRESS: Param = Param::required(ParamKind::Address);
const BLOCK_OR_HASH: Param = Param::required(ParamKind::BlockOrHash);
const FILTER: Param = Param::required(ParamKind::Filter);
const HASH: Param = Param::required(ParamKind::Hash);
const INDEX: Param = Param::required(ParamKind::Index);
const STORAGE_KEYS: Param = Param::required(ParamKind::StorageKeys);
const OPTIONAL_BLOCK: Param = Param::optional(ParamKind::Block);
const OPTIONAL_BOOL: Param = Param::optional(ParamKind::Bool);

/// Returns the positional parameters of the provided method.
pub fn signature(method: QueryMethod) -> &'static [Param] {
    match method {
        QueryMethod::GetAccounts
        | QueryMethod::GetBlockNumber
        | QueryMethod::GetChainId
        | QueryMethod::GetCoinbase
        | QueryMethod::GetGasPrice
        | QueryMethod::GetHashrate
        | QueryMethod::GetNodeInfo
        | QueryMethod::GetProtocolVersion
        | QueryMethod::GetWork => &[],
        QueryMethod::GetBalance | QueryMethod::GetCode | QueryMethod::GetTransactionCount => {
            &[ADDRESS, OPTIONAL_BLOCK]
        }
        QueryMethod::GetBlock => &[BLOCK_OR_HASH, OPTIONAL_BOOL],
        QueryMethod::GetBlockTransactionCount => &[BLOCK_OR_HASH],
        QueryMethod::GetPastLogs => &[FILTER],
        QueryMethod::GetProof => &[ADDRESS, STORAGE_KEYS, OPTIONAL_BLOCK],
        QueryMethod::GetStorageAt => &[ADDRESS, INDEX, OPTIONAL_BLOCK],
        QueryMethod::GetTransaction | QueryMethod::GetTransactionReceipt => &[HASH],
        QueryMethod::GetTransactionFromBlock | QueryMethod::GetUncle => &[BLOCK_OR_HASH, INDEX],
    }
}

/// Returns the Ethereum JSON-RPC method name. Methods that accept either a
/// block number or a block hash have a separate variant for hashes.
fn rpc_method(method: QueryMethod, by_hash: bool) -> &'static str {
    match (method, by_hash) {
        (QueryMethod::GetAccounts, _) => "eth_accounts",
        (QueryMethod::GetBalance, _) => "eth_getBalance",
        (QueryMethod::GetBlock, false) => "eth_getBlockByNumber",
        (QueryMethod::GetBlock, true) => "eth_getBlockByHash",
        (QueryMethod::GetBlockNumber, _) => "eth_blockNumber",
        (QueryMethod::GetBlockTransactionCount, false) => "eth_getBlockTransactionCountByNumber",
        (QueryMethod::GetBlockTransactionCount, true) => "eth_getBlockTransactionCountByHash",
        (QueryMethod::GetChainId, _) => "eth_chainId",
        (QueryMethod::GetCode, _) => "eth_getCode",
        (QueryMethod::GetCoinbase, _) => "eth_coinbase",
        (QueryMethod::GetGasPrice, _) => "eth_gasPrice",
        (QueryMethod::GetHashrate, _) => "eth_hashrate",
        (QueryMethod::GetNodeInfo, _) => "web3_clientVersion",
        (QueryMethod::GetPastLogs, _) => "eth_getLogs",
        (QueryMethod::GetProof, _) => "eth_getProof",
        (QueryMethod::GetProtocolVersion, _) => "eth_protocolVersion",
        (QueryMethod::GetStorageAt, _) => "eth_getStorageAt",
        (QueryMethod::GetTransaction, _) => "eth_getTransactionByHash",
        (QueryMethod::GetTransactionCount, _) => "eth_getTransactionCount",
        (QueryMethod::GetTransactionFromBlock, false) => "eth_getTransactionByBlockNumberAndIndex",
        (QueryMethod::GetTransactionFromBlock, true) => "eth_getTransactionByBlockHashAndIndex",
        (QueryMethod::GetTransactionReceipt, _) => "eth_getTransactionReceipt",
        (QueryMethod::GetUncle, false) => "eth_getUncleByBlockNumberAndIndex",
        (QueryMethod::GetUncle, true) => "eth_getUncleByBlockHashAndIndex",
        (QueryMethod::GetWork, _) => "eth_getWork",
    }
}

/// Error type for invalid query method parameters.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum InvalidParamsError {
    /// More parameters were provided than the method accepts.
    #[error("'{method}' accepts at most {expected} parameters, but {actual} were provided")]
    TooMany {
        /// The invoked method
        method: QueryMethod,
        /// The maximum number of parameters
        expected: usize,
        /// The number of provided parameters
        actual: usize,
    },
    /// A required parameter was not provided.
    #[error("'{method}' is missing required parameter {index} ({kind:?})")]
    Missing {
        /// The invoked method
        method: QueryMethod,
        /// The position of the parameter
        index: usize,
        /// The expected kind of parameter
        kind: ParamKind,
    },
    /// A parameter has an invalid value.
    #[error("Parameter {index} of '{method}' is not a valid {kind:?}: {value:?}")]
    Invalid {
        /// The invoked method
        method: QueryMethod,
        /// The position of the parameter
        index: usize,
        /// The expected kind of parameter
        kind: ParamKind,
        /// The provided value
        value: QueryValue,
    },
}

/// A query method invocation formatted as Ethereum JSON-RPC request.
#[derive(Clone, Debug, PartialEq)]
pub struct FormattedRequest {
    /// The JSON-RPC method name
    pub method: &'static str,
    /// The JSON-RPC parameters
    pub params: Vec<serde_json::Value>,
}

/// Formats the invocation of a query method as Ethereum JSON-RPC request.
///
/// Omitted optional block parameters default to `"latest"` and omitted
/// optional flags to `false`.
pub fn format_request(
    method: QueryMethod,
    params: &[QueryValue],
) -> Result<FormattedRequest, InvalidParamsError> {
    let signature = signature(method);
    if params.len() > signature.len() {
        return Err(InvalidParamsError::TooMany {
            method,
            expected: signature.len(),
            actual: params.len(),
        });
    }

    let mut by_hash = false;
    let mut formatted = Vec::with_capacity(signature.len());
    for (index, param) in signature.iter().enumerate() {
        let Some(value) = params.get(index) else {
            if param.optional {
                formatted.push(default_value(param.kind));
                continue;
            }

            return Err(InvalidParamsError::Missing {
                method,
                index,
                kind: param.kind,
            });
        };

        let invalid = || InvalidParamsError::Invalid {
            method,
            index,
            kind: param.kind,
            value: value.clone(),
        };

        let value = if param.kind == ParamKind::BlockOrHash {
            if let Some(hash) = format_hash(value) {
                by_hash = true;
                hash
            } else {
                format_block(value).ok_or_else(invalid)?
            }
        } else {
            format_param(param.kind, value).ok_or_else(invalid)?
        };

        formatted.push(value);
    }

    Ok(FormattedRequest {
        method: rpc_method(method, by_hash),
        params: formatted,
    })
}

fn default_value(kind: ParamKind) -> serde_json::Value {
    match kind {
        ParamKind::Bool => serde_json::Value::Bool(false),
        _ => serde_json::Value::String("latest".to_string()),
    }
}

fn format_param(kind: ParamKind, value: &QueryValue) -> Option<serde_json::Value> {
    match kind {
        ParamKind::Address => match value {
            QueryValue::Text(text) if Address::from_str(text).is_ok() => {
                Some(serde_json::Value::String(text.clone()))
            }
            _ => None,
        },
        ParamKind::Block | ParamKind::BlockOrHash => format_block(value),
        ParamKind::Hash => format_hash(value),
        ParamKind::Index => match value {
            QueryValue::Quantity(quantity) => Some(hex_quantity(*quantity)),
            QueryValue::Number(number) => number_quantity(number).map(hex_quantity),
            QueryValue::Text(text) => text.parse::<U256>().ok().map(hex_quantity),
            _ => None,
        },
        ParamKind::Bool => match value {
            QueryValue::Bool(flag) => Some(serde_json::Value::Bool(*flag)),
            _ => None,
        },
        ParamKind::Filter => match value {
            QueryValue::Mapping(_) => Some(to_rpc_json(value)),
            _ => None,
        },
        ParamKind::StorageKeys => match value {
            QueryValue::Sequence(_) => Some(to_rpc_json(value)),
            _ => None,
        },
    }
}

fn format_block(value: &QueryValue) -> Option<serde_json::Value> {
    match value {
        QueryValue::Quantity(block_number) => Some(hex_quantity(*block_number)),
        QueryValue::Number(block_number) => number_quantity(block_number).map(hex_quantity),
        QueryValue::Text(tag) if BLOCK_TAGS.contains(&tag.as_str()) => {
            Some(serde_json::Value::String(tag.clone()))
        }
        QueryValue::Text(block_number) => block_number.parse::<U256>().ok().map(hex_quantity),
        _ => None,
    }
}

fn format_hash(value: &QueryValue) -> Option<serde_json::Value> {
    match value {
        QueryValue::Text(text) if text.starts_with("0x") && B256::from_str(text).is_ok() => {
            Some(serde_json::Value::String(text.clone()))
        }
        _ => None,
    }
}

/// Returns the quantity of a non-negative JSON integer.
fn number_quantity(number: &serde_json::Number) -> Option<U256> {
    number.to_string().parse().ok()
}

fn hex_quantity(quantity: U256) -> serde_json::Value {
    serde_json::Value::String(format!("0x{quantity:x}"))
}

/// Converts a value to JSON, encoding quantities as hexadecimal strings.
fn to_rpc_json(value: &QueryValue) -> serde_json::Value {
    match value {
        QueryValue::Quantity(quantity) => hex_quantity(*quantity),
        QueryValue::Number(number) => number_quantity(number).map_or_else(
            || serde_json::Value::Number(number.clone()),
            hex_quantity,
        ),
        QueryValue::Sequence(values) => {
            serde_json::Value::Array(values.iter().map(to_rpc_json).collect())
        }
        QueryValue::Mapping(entries) => serde_json::Value::Object(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), to_rpc_json(value)))
                .collect(),
        ),
        _ => serde_json::Value::from(value.clone()),
    }
}

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator as _;

/// Read-only query methods that a [`QueryClient`](crate::QueryClient) can
/// serve.
///
/// This is the complete allow-list of methods eligible for replication. Every
/// variant follows the `get*` naming convention of the client API it mirrors.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum QueryMethod {
    /// `eth_accounts`
    GetAccounts,
    /// `eth_getBalance`
    GetBalance,
    /// `eth_getBlockByNumber` or `eth_getBlockByHash`
    GetBlock,
    /// `eth_blockNumber`
    GetBlockNumber,
    /// `eth_getBlockTransactionCountByNumber` or
    /// `eth_getBlockTransactionCountByHash`
    GetBlockTransactionCount,
    /// `eth_chainId`
    GetChainId,
    /// `eth_getCode`
    GetCode,
    /// `eth_coinbase`
    GetCoinbase,
    /// `eth_gasPrice`
    GetGasPrice,
    /// `eth_hashrate`
    GetHashrate,
    /// `web3_clientVersion`
    GetNodeInfo,
    /// `eth_getLogs`
    GetPastLogs,
    /// `eth_getProof`
    GetProof,
    /// `eth_protocolVersion`
    GetProtocolVersion,
    /// `eth_getStorageAt`
    GetStorageAt,
    /// `eth_getTransactionByHash`
    GetTransaction,
    /// `eth_getTransactionCount`
    GetTransactionCount,
    /// `eth_getTransactionByBlockNumberAndIndex` or
    /// `eth_getTransactionByBlockHashAndIndex`
    GetTransactionFromBlock,
    /// `eth_getTransactionReceipt`
    GetTransactionReceipt,
    /// `eth_getUncleByBlockNumberAndIndex` or
    /// `eth_getUncleByBlockHashAndIndex`
    GetUncle,
    /// `eth_getWork`
    GetWork,
}

impl QueryMethod {
    /// The method's camelCase name, e.g. `getBalance`.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Whether invocations of this method are replicated.
    ///
    /// [`QueryMethod::GetBlockNumber`] is excluded: it supplies the default
    /// block argument of all other queries.
    pub fn is_replicated(self) -> bool {
        self != QueryMethod::GetBlockNumber
    }
}

/// Error type for [`QueryMethod::from_str`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Unknown query method: '{0}'")]
pub struct ParseQueryMethodError(String);

impl FromStr for QueryMethod {
    type Err = ParseQueryMethodError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        QueryMethod::iter()
            .find(|method| method.name() == name)
            .ok_or_else(|| ParseQueryMethodError(name.to_string()))
    }
}

/// Whether the method with the provided name is a replicated query.
pub fn is_query(name: &str) -> bool {
    QueryMethod::from_str(name).is_ok_and(QueryMethod::is_replicated)
}

use std::num::NonZeroUsize;

use lockstep_query::{
    QueryClient as _, QueryMethod, QueryValue, ReplicatedClient, ReplicationConfig,
    ReplicationError,
};
use lockstep_rpc_client::{ClientConfig, InvalidParamsError, RpcClient, RpcClientError, connect};
use alloy_primitives::B256;
use mockito::Matcher;

const DAI_ADDRESS: &str = "0x6b175474e89094c44da98b954eedeac495271d0f";

fn block_response() -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": 0,
        "result": {
            "number": "0x10",
            "hash": "0xc008e9f9bb92057dd0035496fbf4fb54f66b4b18b370928e46d6603933022222",
            "transactions": [],
        },
    })
}

#[tokio::test]
async fn zero_argument_query_is_pinned_to_block_number() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;

    let block_number = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJsonString(
            r#"{"method":"eth_blockNumber"}"#.to_string(),
        ))
        .with_body(r#"{"jsonrpc":"2.0","id":0,"result":"0x10"}"#)
        .expect(1)
        .create_async()
        .await;

    let get_block = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJsonString(
            r#"{"method":"eth_getBlockByNumber","params":["0x10",false]}"#.to_string(),
        ))
        .with_body(block_response().to_string())
        .expect(4)
        .create_async()
        .await;

    let config =
        ClientConfig::from_json_str(&format!(r#"{{ "endpoints": ["{}"] }}"#, server.url()))?;
    let client = connect(&config)?;

    let block = client.call(QueryMethod::GetBlock, &[]).await?;

    assert_eq!(block, QueryValue::from(block_response()["result"].clone()));

    block_number.assert_async().await;
    get_block.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn disagreeing_nodes() -> anyhow::Result<()> {
    let mut first = mockito::Server::new_async().await;
    let mut second = mockito::Server::new_async().await;

    let first_mock = first
        .mock("POST", "/")
        .with_body(r#"{"jsonrpc":"2.0","id":0,"result":"0x1"}"#)
        .expect(1)
        .create_async()
        .await;

    let second_mock = second
        .mock("POST", "/")
        .with_body(r#"{"jsonrpc":"2.0","id":0,"result":"0x2"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = ReplicatedClient::with_config(
        RpcClient::with_endpoints(&[first.url(), second.url()], None)?,
        ReplicationConfig {
            replicas: NonZeroUsize::new(2).expect("non-zero"),
            ..ReplicationConfig::default()
        },
    );

    let error = client
        .call(
            QueryMethod::GetBalance,
            &[QueryValue::from(DAI_ADDRESS), QueryValue::from("latest")],
        )
        .await
        .expect_err("nodes returned different balances");

    assert!(matches!(
        error,
        ReplicationError::Disagreement {
            method: QueryMethod::GetBalance,
            replicas: 2,
            mismatch_index: 1,
        }
    ));

    first_mock.assert_async().await;
    second_mock.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn block_number_is_not_replicated() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJsonString(
            r#"{"method":"eth_blockNumber"}"#.to_string(),
        ))
        .with_body(r#"{"jsonrpc":"2.0","id":0,"result":"0x10"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = ReplicatedClient::new(RpcClient::with_endpoints(&[server.url()], None)?);

    let block_number = client.call(QueryMethod::GetBlockNumber, &[]).await?;

    assert_eq!(block_number, QueryValue::from("0x10"));

    mock.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn injected_block_number_conflicts_with_signature() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;

    let block_number = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJsonString(
            r#"{"method":"eth_blockNumber"}"#.to_string(),
        ))
        .with_body(r#"{"jsonrpc":"2.0","id":0,"result":"0x10"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = ReplicatedClient::new(RpcClient::with_endpoints(&[server.url()], None)?);

    let error = client
        .call(QueryMethod::GetChainId, &[])
        .await
        .expect_err("eth_chainId does not accept a block number");

    assert!(matches!(
        error,
        ReplicationError::Replica(RpcClientError::InvalidParams(
            InvalidParamsError::TooMany {
                method: QueryMethod::GetChainId,
                expected: 0,
                actual: 1,
            }
        ))
    ));

    block_number.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn send_raw_transaction_is_not_replicated() -> anyhow::Result<()> {
    const TRANSACTION_HASH: &str =
        "0xc008e9f9bb92057dd0035496fbf4fb54f66b4b18b370928e46d6603933022222";

    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJsonString(
            r#"{"method":"eth_sendRawTransaction","params":["0x02f8"]}"#.to_string(),
        ))
        .with_body(format!(r#"{{"jsonrpc":"2.0","id":0,"result":"{TRANSACTION_HASH}"}}"#))
        .expect(1)
        .create_async()
        .await;

    let client = ReplicatedClient::new(RpcClient::with_endpoints(&[server.url()], None)?);

    let hash = client.send_raw_transaction(&[0x02, 0xf8]).await?;

    assert_eq!(hash, TRANSACTION_HASH.parse::<B256>()?);

    mock.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn json_integers_disagree_with_strings() -> anyhow::Result<()> {
    let mut first = mockito::Server::new_async().await;
    let mut second = mockito::Server::new_async().await;

    let first_mock = first
        .mock("POST", "/")
        .with_body(r#"{"jsonrpc":"2.0","id":0,"result":500}"#)
        .expect(1)
        .create_async()
        .await;

    let second_mock = second
        .mock("POST", "/")
        .with_body(r#"{"jsonrpc":"2.0","id":0,"result":"500"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = ReplicatedClient::with_config(
        RpcClient::with_endpoints(&[first.url(), second.url()], None)?,
        ReplicationConfig {
            replicas: NonZeroUsize::new(2).expect("non-zero"),
            ..ReplicationConfig::default()
        },
    );

    let error = client
        .call(
            QueryMethod::GetBalance,
            &[QueryValue::from(DAI_ADDRESS), QueryValue::from("latest")],
        )
        .await
        .expect_err("a number is not a string");

    assert!(error.is_disagreement(), "unexpected error: {error}");

    first_mock.assert_async().await;
    second_mock.assert_async().await;

    Ok(())
}

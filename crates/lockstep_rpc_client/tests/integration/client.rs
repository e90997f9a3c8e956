use lockstep_query::{QueryClient as _, QueryMethod, QueryValue};
use lockstep_rpc_client::{InvalidParamsError, RpcClient, RpcClientError};
use mockito::Matcher;
use reqwest::StatusCode;

const DAI_ADDRESS: &str = "0x6b175474e89094c44da98b954eedeac495271d0f";

#[tokio::test]
async fn send_request_body_400_status() -> anyhow::Result<()> {
    const STATUS_CODE: u16 = 400;

    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .with_status(STATUS_CODE.into())
        .with_header("content-type", "text/plain")
        .create_async()
        .await;

    let error = RpcClient::with_endpoints(&[server.url()], None)?
        .call(QueryMethod::GetGasPrice, &[])
        .await
        .expect_err("should have failed to due to a HTTP status error");

    if let RpcClientError::HttpStatus(error) = error {
        assert_eq!(
            reqwest::Error::from(error).status(),
            Some(StatusCode::from_u16(STATUS_CODE)?)
        );
    } else {
        unreachable!("Invalid error: {error}");
    }

    mock.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn json_rpc_error() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .with_body(
            r#"{"jsonrpc":"2.0","id":0,"error":{"code":-32602,"message":"invalid argument"}}"#,
        )
        .create_async()
        .await;

    let error = RpcClient::with_endpoints(&[server.url()], None)?
        .call(QueryMethod::GetBalance, &[QueryValue::from(DAI_ADDRESS)])
        .await
        .expect_err("should have failed due to a JSON-RPC error");

    if let RpcClientError::JsonRpcError { error, request } = error {
        assert_eq!(error.code, -32602);
        assert_eq!(error.message, "invalid argument");
        assert!(request.contains("eth_getBalance"));
    } else {
        unreachable!("Invalid error: {error}");
    }

    mock.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn retries_missing_trie_node() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;

    let failure = server
        .mock("POST", "/")
        .with_body(
            r#"{"jsonrpc":"2.0","id":0,"error":{"code":-32000,"message":"missing trie node abc"}}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let success = server
        .mock("POST", "/")
        .with_body(r#"{"jsonrpc":"2.0","id":0,"result":"0x3b9aca00"}"#)
        .expect(1)
        .create_async()
        .await;

    let gas_price = RpcClient::with_endpoints(&[server.url()], None)?
        .call(QueryMethod::GetGasPrice, &[])
        .await?;

    assert_eq!(gas_price, QueryValue::from("0x3b9aca00"));

    failure.assert_async().await;
    success.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn block_number() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJsonString(
            r#"{"method":"eth_blockNumber","params":[]}"#.to_string(),
        ))
        .with_body(r#"{"jsonrpc":"2.0","id":0,"result":"0x112a880"}"#)
        .create_async()
        .await;

    let block_number = RpcClient::with_endpoints(&[server.url()], None)?
        .block_number()
        .await?;

    assert_eq!(block_number, 18_000_000);

    mock.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn chain_id_is_requested_once() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJsonString(
            r#"{"method":"eth_chainId"}"#.to_string(),
        ))
        .with_body(r#"{"jsonrpc":"2.0","id":0,"result":"0x1"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = RpcClient::with_endpoints(&[server.url()], None)?;

    assert_eq!(client.chain_id().await?, 1);
    assert_eq!(client.chain_id().await?, 1);

    mock.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn formats_query_params() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJsonString(format!(
            r#"{{"method":"eth_getStorageAt","params":["{DAI_ADDRESS}","0x2","0xf4240"]}}"#
        )))
        .with_body(
            r#"{"jsonrpc":"2.0","id":0,"result":"0x0000000000000000000000000000000000000000000000000000000000000000"}"#,
        )
        .create_async()
        .await;

    let value = RpcClient::with_endpoints(&[server.url()], None)?
        .call(
            QueryMethod::GetStorageAt,
            &[
                QueryValue::from(DAI_ADDRESS),
                QueryValue::from(2u64),
                QueryValue::from(1_000_000u64),
            ],
        )
        .await?;

    assert!(value.as_str().is_some());

    mock.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn invalid_params_are_not_sent() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;

    let mock = server.mock("POST", "/").expect(0).create_async().await;

    let error = RpcClient::with_endpoints(&[server.url()], None)?
        .call(QueryMethod::GetTransactionReceipt, &[QueryValue::from(true)])
        .await
        .expect_err("should have failed due to an invalid hash");

    assert!(matches!(
        error,
        RpcClientError::InvalidParams(InvalidParamsError::Invalid { index: 0, .. })
    ));

    mock.assert_async().await;

    Ok(())
}

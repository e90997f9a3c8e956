use std::{
    collections::VecDeque,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{QueryClient, QueryMethod, QueryValue};

/// Error returned by [`MockQueryClient`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Mock client failure: {0}")]
pub struct MockError(pub String);

/// A recorded invocation of [`QueryClient::call`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    /// The invoked method
    pub method: QueryMethod,
    /// The provided parameters
    pub params: Vec<QueryValue>,
}

#[derive(Debug)]
struct ScriptedResponse {
    delay: usize,
    response: Result<QueryValue, MockError>,
}

/// An in-memory [`QueryClient`] that records all invocations.
///
/// Scripted responses are assigned in order of arrival, so the n-th call
/// receives the n-th response. A response settles after its delay, counted in
/// scheduler yields. Once the script is exhausted, calls settle after a single
/// yield with the default response.
#[derive(Debug)]
pub struct MockQueryClient {
    label: String,
    block_number: Result<u64, MockError>,
    default_response: QueryValue,
    responses: Mutex<VecDeque<ScriptedResponse>>,
    calls: Mutex<Vec<RecordedCall>>,
    block_number_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockQueryClient {
    /// Creates a client at the provided block number that responds with
    /// [`QueryValue::Null`].
    pub fn new(block_number: u64) -> Self {
        Self {
            label: "mock".to_string(),
            block_number: Ok(block_number),
            default_response: QueryValue::Null,
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            block_number_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Sets the response used once scripted responses are exhausted.
    pub fn with_default_response(mut self, response: impl Into<QueryValue>) -> Self {
        self.default_response = response.into();
        self
    }

    /// Appends scripted responses that settle without delay.
    pub fn with_responses(
        self,
        responses: impl IntoIterator<Item = Result<QueryValue, MockError>>,
    ) -> Self {
        self.with_delayed_responses(responses.into_iter().map(|response| (0, response)))
    }

    /// Appends scripted responses, each preceded by the number of additional
    /// yields before it settles.
    pub fn with_delayed_responses(
        self,
        responses: impl IntoIterator<Item = (usize, Result<QueryValue, MockError>)>,
    ) -> Self {
        self.responses.lock().extend(
            responses
                .into_iter()
                .map(|(delay, response)| ScriptedResponse { delay, response }),
        );
        self
    }

    /// Makes retrieval of the block number fail.
    pub fn with_failing_block_number(mut self) -> Self {
        self.block_number = Err(MockError("block number unavailable".to_string()));
        self
    }

    /// Sets the client's label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// The client's label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// All recorded invocations of [`QueryClient::call`].
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// The number of invocations of [`QueryClient::block_number`].
    pub fn block_number_calls(&self) -> usize {
        self.block_number_calls.load(Ordering::SeqCst)
    }

    /// The maximum number of calls that were in flight simultaneously.
    pub fn max_concurrent_calls(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryClient for MockQueryClient {
    type Error = MockError;

    async fn call(
        &self,
        method: QueryMethod,
        params: &[QueryValue],
    ) -> Result<QueryValue, Self::Error> {
        self.calls.lock().push(RecordedCall {
            method,
            params: params.to_vec(),
        });

        let scripted = self.responses.lock().pop_front();
        let (delay, response) = scripted.map_or_else(
            || (0, Ok(self.default_response.clone())),
            |scripted| (scripted.delay, scripted.response),
        );

        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        // Sibling calls start before this one settles.
        for _ in 0..=delay {
            tokio::task::yield_now().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        response
    }

    async fn block_number(&self) -> Result<u64, Self::Error> {
        self.block_number_calls.fetch_add(1, Ordering::SeqCst);
        self.block_number.clone()
    }
}

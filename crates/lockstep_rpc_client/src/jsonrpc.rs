use serde::{Deserialize, Deserializer, Serialize, de, de::DeserializeOwned};

/// JSON-RPC protocol version
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum Version {
    /// Version 2.0
    #[serde(rename = "2.0")]
    V2_0,
}

/// JSON-RPC request or response id
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Id {
    /// Numeric id
    Num(u64),
    /// String id
    Str(String),
}

// Decoded through `serde_json::Value`, as untagged enums lose the numbers of
// `arbitrary_precision` JSON.
impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Number(number) => number
                .as_u64()
                .map(Id::Num)
                .ok_or_else(|| de::Error::custom(format!("invalid numeric id: {number}"))),
            serde_json::Value::String(id) => Ok(Id::Str(id)),
            value => Err(de::Error::custom(format!("invalid id: {value}"))),
        }
    }
}

/// A JSON-RPC request
#[derive(Debug, Serialize)]
pub struct Request<'method, ParamsT> {
    /// JSON-RPC version
    #[serde(rename = "jsonrpc")]
    pub version: Version,
    /// The request id
    pub id: Id,
    /// The JSON-RPC method name
    pub method: &'method str,
    /// The positional parameters
    pub params: ParamsT,
}

/// A JSON-RPC response
#[derive(Debug, Deserialize)]
pub struct Response {
    /// JSON-RPC version
    #[serde(rename = "jsonrpc")]
    pub version: Version,
    /// The id of the request that this is a response to
    pub id: Id,
    /// The result of a successful request
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// The error of a failed request
    #[serde(default)]
    pub error: Option<Error>,
}

impl Response {
    /// Decodes the result into the expected type. An error takes precedence
    /// over a result.
    pub fn into_data<SuccessT: DeserializeOwned>(
        self,
    ) -> Result<ResponseData<SuccessT>, serde_json::Error> {
        match self.error {
            Some(error) => Ok(ResponseData::Error { error }),
            None => serde_json::from_value(self.result.unwrap_or_default())
                .map(|result| ResponseData::Success { result }),
        }
    }
}

/// The payload of a JSON-RPC response
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ResponseData<SuccessT> {
    /// An error response
    Error {
        /// The error
        error: Error,
    },
    /// A successful response
    Success {
        /// The result
        result: SuccessT,
    },
}

impl<SuccessT> ResponseData<SuccessT> {
    /// Converts the response data into a [`Result`].
    pub fn into_result(self) -> Result<SuccessT, Error> {
        match self {
            ResponseData::Error { error } => Err(error),
            ResponseData::Success { result } => Ok(result),
        }
    }
}

/// A JSON-RPC error object
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, thiserror::Error)]
#[error("The response reported error `{code}`: `{message}`")]
pub struct Error {
    /// The error code
    pub code: i64,
    /// The error message
    pub message: String,
    /// Additional error data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

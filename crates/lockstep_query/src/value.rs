use std::collections::BTreeMap;

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A value passed to or returned by a query method.
///
/// Numbers decoded from JSON are represented as [`QueryValue::Number`].
/// [`QueryValue::Quantity`] is only constructed from integers, such as an
/// injected block number.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum QueryValue {
    /// JSON `null`
    #[default]
    Null,
    /// A boolean
    Bool(bool),
    /// An arbitrary-precision unsigned integer
    Quantity(U256),
    /// A JSON number
    Number(serde_json::Number),
    /// A string
    Text(String),
    /// An ordered sequence of values
    Sequence(Vec<QueryValue>),
    /// A mapping from keys to values
    Mapping(BTreeMap<String, QueryValue>),
}

impl QueryValue {
    /// Whether the two values are equal in their canonical form.
    ///
    /// The canonical form of a [`QueryValue::Quantity`] is its decimal string,
    /// so a quantity also equals a [`QueryValue::Text`] containing that
    /// string. Numbers compare numerically and mappings compare regardless of
    /// insertion order.
    pub fn canonical_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (QueryValue::Null, QueryValue::Null) => true,
            (QueryValue::Bool(lhs), QueryValue::Bool(rhs)) => lhs == rhs,
            (QueryValue::Quantity(lhs), QueryValue::Quantity(rhs)) => lhs == rhs,
            (QueryValue::Quantity(quantity), QueryValue::Text(text))
            | (QueryValue::Text(text), QueryValue::Quantity(quantity)) => {
                quantity.to_string() == *text
            }
            (QueryValue::Number(lhs), QueryValue::Number(rhs)) => numbers_eq(lhs, rhs),
            (QueryValue::Text(lhs), QueryValue::Text(rhs)) => lhs == rhs,
            (QueryValue::Sequence(lhs), QueryValue::Sequence(rhs)) => {
                lhs.len() == rhs.len()
                    && lhs
                        .iter()
                        .zip(rhs.iter())
                        .all(|(lhs, rhs)| lhs.canonical_eq(rhs))
            }
            (QueryValue::Mapping(lhs), QueryValue::Mapping(rhs)) => {
                lhs.len() == rhs.len()
                    && lhs.iter().all(|(key, lhs)| {
                        rhs.get(key)
                            .is_some_and(|rhs: &QueryValue| lhs.canonical_eq(rhs))
                    })
            }
            _ => false,
        }
    }

    /// Returns the string, if this is a [`QueryValue::Text`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            QueryValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Compares JSON numbers by value. Integers compare exactly, also when they
/// exceed 64 bits.
fn numbers_eq(lhs: &serde_json::Number, rhs: &serde_json::Number) -> bool {
    match (as_integer(lhs), as_integer(rhs)) {
        (Some(lhs), Some(rhs)) => lhs == rhs,
        (Some(integer), None) => float_equals_integer(rhs, integer),
        (None, Some(integer)) => float_equals_integer(lhs, integer),
        (None, None) => match (is_integer_literal(lhs), is_integer_literal(rhs)) {
            // Both are integers beyond 128 bits, which JSON renders canonically.
            (true, true) => lhs.to_string() == rhs.to_string(),
            (false, false) => lhs
                .as_f64()
                .zip(rhs.as_f64())
                .is_some_and(|(lhs, rhs)| lhs == rhs),
            _ => false,
        },
    }
}

fn is_integer_literal(number: &serde_json::Number) -> bool {
    !number
        .to_string()
        .contains(|character: char| matches!(character, '.' | 'e' | 'E'))
}

fn as_integer(number: &serde_json::Number) -> Option<i128> {
    if let Some(integer) = number.as_i64() {
        return Some(i128::from(integer));
    }

    if let Some(integer) = number.as_u64() {
        return Some(i128::from(integer));
    }

    if is_integer_literal(number) {
        number.to_string().parse().ok()
    } else {
        None
    }
}

// 2^127, the exclusive upper bound of `i128`.
const I128_BOUND: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;

fn float_equals_integer(float: &serde_json::Number, integer: i128) -> bool {
    float.as_f64().is_some_and(|float| {
        float.is_finite()
            && float.fract() == 0.0
            && (-I128_BOUND..I128_BOUND).contains(&float)
            && float as i128 == integer
    })
}

impl From<serde_json::Value> for QueryValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => QueryValue::Null,
            serde_json::Value::Bool(value) => QueryValue::Bool(value),
            serde_json::Value::Number(number) => QueryValue::Number(number),
            serde_json::Value::String(text) => QueryValue::Text(text),
            serde_json::Value::Array(values) => {
                QueryValue::Sequence(values.into_iter().map(QueryValue::from).collect())
            }
            serde_json::Value::Object(entries) => QueryValue::Mapping(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, QueryValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<QueryValue> for serde_json::Value {
    fn from(value: QueryValue) -> Self {
        match value {
            QueryValue::Null => serde_json::Value::Null,
            QueryValue::Bool(value) => serde_json::Value::Bool(value),
            // Quantities that don't fit a JSON number keep their decimal form.
            QueryValue::Quantity(quantity) => u64::try_from(quantity).map_or_else(
                |_error| serde_json::Value::String(quantity.to_string()),
                serde_json::Value::from,
            ),
            QueryValue::Number(number) => serde_json::Value::Number(number),
            QueryValue::Text(text) => serde_json::Value::String(text),
            QueryValue::Sequence(values) => {
                serde_json::Value::Array(values.into_iter().map(serde_json::Value::from).collect())
            }
            QueryValue::Mapping(entries) => serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, serde_json::Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

impl From<u64> for QueryValue {
    fn from(value: u64) -> Self {
        QueryValue::Quantity(U256::from(value))
    }
}

impl From<U256> for QueryValue {
    fn from(value: U256) -> Self {
        QueryValue::Quantity(value)
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

impl<T: Into<QueryValue>> From<Vec<T>> for QueryValue {
    fn from(values: Vec<T>) -> Self {
        QueryValue::Sequence(values.into_iter().map(Into::into).collect())
    }
}

impl Serialize for QueryValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_json::Value::from(self.clone()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for QueryValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(QueryValue::from)
    }
}

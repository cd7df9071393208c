//! Canonical binary encoding for provider wire payloads.
//!
//! Object keys are sorted before encoding so equal payloads always produce
//! identical bytes regardless of how the map was built.

use rmp_serde::{decode::Error as DecodeError, encode::Error as EncodeError};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("payload is not representable as JSON: {0}")]
    ToJson(#[source] serde_json::Error),
    #[error("messagepack encoding failed: {0}")]
    Encode(#[source] EncodeError),
    #[error("messagepack decoding failed: {0}")]
    Decode(#[source] DecodeError),
    #[error("decoded payload does not match target type: {0}")]
    FromJson(#[source] serde_json::Error),
}

pub fn encode_canonical<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    let json = serde_json::to_value(value).map_err(CodecError::ToJson)?;
    rmp_serde::to_vec_named(&sort_keys(json)).map_err(CodecError::Encode)
}

pub fn decode_canonical<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let value: Value = rmp_serde::from_slice(bytes).map_err(CodecError::Decode)?;
    serde_json::from_value(value).map_err(CodecError::FromJson)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(obj) => {
            let mut entries: Vec<(String, Value)> = obj.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(key, item)| (key, sort_keys(item)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        scalar => scalar,
    }
}

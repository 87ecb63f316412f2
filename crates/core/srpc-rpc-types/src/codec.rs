//! JSON byte encoding for protocol values.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(CodecError::Encode)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(CodecError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Request, Response};

    #[test]
    fn test_garbage_is_a_decode_error() {
        let result = decode::<Request>(b"\x00\x01not json");
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_response_bytes_are_not_a_request() {
        let bytes = encode(&Response::success(serde_json::json!(true))).unwrap();
        assert!(decode::<Request>(&bytes).is_err());
    }
}

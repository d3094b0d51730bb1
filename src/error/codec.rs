// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("CBOR encoding failed: {0}")]
    CborEncode(String),
    #[error("CBOR decoding failed: {0}")]
    CborDecode(String),
    #[error("JSON encoding failed: {0}")]
    JsonEncode(#[source] serde_json::Error),
    #[error("JSON decoding failed: {0}")]
    JsonDecode(#[source] serde_json::Error),
}

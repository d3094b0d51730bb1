// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::HashAlgorithm;

/// Errors raised by the primitive types shared across the container.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown hash algorithm {0}")]
    UnknownHashAlgorithm(u64),
    #[error("length mismatch for hash algorithm {alg}: want {expected} bytes, got {actual}")]
    HashLengthMismatch {
        alg: HashAlgorithm,
        expected: usize,
        actual: usize,
    },
    #[error("invalid OID: {0}")]
    InvalidOid(String),
}

impl CoreError {
    pub fn invalid_oid<D: std::fmt::Display>(message: D) -> Self {
        CoreError::InvalidOid(message.to_string())
    }
}

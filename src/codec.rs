// SPDX-License-Identifier: MIT

//! CBOR and JSON encode/decode services
//!
//! A [`Codec`] holds an immutable [`CodecConfig`] and exposes the two wire
//! formats through one value that can be built once and shared. The field
//! layout of each type lives in its own `Serialize`/`Deserialize` impl, which
//! picks the integer-keyed CBOR layout or the name-keyed JSON layout from
//! `is_human_readable()`.
//!
//! ```rust
//! use unsigned_corim::codec::{Codec, CodecConfig};
//! use unsigned_corim::core::HashEntry;
//!
//! let codec = Codec::new(CodecConfig::default().with_pretty_json(true));
//!
//! let cbor = [0x82, 0x06, 0x44, 0xde, 0xad, 0xbe, 0xef];
//! let entry: HashEntry = codec.decode_cbor(&cbor).unwrap();
//!
//! assert_eq!(entry.hash_alg_id, 6);
//! assert_eq!(codec.encode_cbor(&entry).unwrap(), cbor);
//! ```

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::{CodecError, Result};

/// Nesting depth accepted when decoding CBOR, unless configured otherwise.
pub const DEFAULT_RECURSION_LIMIT: usize = 256;

/// Encoder/decoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Maximum nesting of CBOR arrays, maps and tags accepted by the decoder
    pub recursion_limit: usize,
    /// Emit indented JSON
    pub pretty_json: bool,
}

impl CodecConfig {
    pub const DEFAULT: Self = Self {
        recursion_limit: DEFAULT_RECURSION_LIMIT,
        pretty_json: false,
    };

    pub const fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub const fn with_pretty_json(mut self, pretty: bool) -> Self {
        self.pretty_json = pretty;
        self
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Encodes and decodes values in CBOR and JSON according to a fixed
/// [`CodecConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    pub const fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn encode_cbor<T>(&self, value: &T) -> Result<Vec<u8>>
    where
        T: Serialize + ?Sized,
    {
        let mut buf: Vec<u8> = vec![];
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| CodecError::CborEncode(e.to_string()))?;
        Ok(buf)
    }

    pub fn decode_cbor<T>(&self, data: &[u8]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        ciborium::de::from_reader_with_recursion_limit(data, self.config.recursion_limit).map_err(
            |e| {
                debug!(len = data.len(), error = %e, "CBOR decoding failed");
                CodecError::CborDecode(e.to_string()).into()
            },
        )
    }

    pub fn encode_json<T>(&self, value: &T) -> Result<String>
    where
        T: Serialize + ?Sized,
    {
        let encoded = if self.config.pretty_json {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };

        Ok(encoded.map_err(CodecError::JsonEncode)?)
    }

    pub fn decode_json<T>(&self, data: &[u8]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_slice(data).map_err(|e| {
            debug!(len = data.len(), error = %e, "JSON decoding failed");
            CodecError::JsonDecode(e).into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::Oid, Error};

    #[test]
    fn test_codec_config_builders() {
        let config = CodecConfig::default()
            .with_recursion_limit(8)
            .with_pretty_json(true);

        assert_eq!(config.recursion_limit, 8);
        assert!(config.pretty_json);
        assert_eq!(Codec::new(config).config(), &config);
        assert_eq!(Codec::default().config(), &CodecConfig::DEFAULT);
    }

    #[test]
    fn test_codec_recursion_limit() {
        // [[[[1]]]]
        let nested: Vec<u8> = vec![0x81, 0x81, 0x81, 0x81, 0x01];

        let shallow = Codec::new(CodecConfig::default().with_recursion_limit(2));
        let err = shallow.decode_cbor::<Vec<Vec<Vec<Vec<u8>>>>>(&nested).unwrap_err();
        assert!(matches!(err, Error::Codec(CodecError::CborDecode(_))));

        let decoded: Vec<Vec<Vec<Vec<u8>>>> = Codec::default().decode_cbor(&nested).unwrap();
        assert_eq!(decoded, vec![vec![vec![vec![1]]]]);
    }

    #[test]
    fn test_codec_json() {
        let oid: Oid = "1.2.3".parse().unwrap();
        let codec = Codec::default();

        let encoded = codec.encode_json(&vec![oid.clone()]).unwrap();
        assert_eq!(encoded, r#"["1.2.3"]"#);

        let pretty = Codec::new(CodecConfig::default().with_pretty_json(true));
        assert_eq!(pretty.encode_json(&vec![oid.clone()]).unwrap(), "[\n  \"1.2.3\"\n]");

        let decoded: Vec<Oid> = codec.decode_json(encoded.as_bytes()).unwrap();
        assert_eq!(decoded, vec![oid]);

        let err = codec.decode_json::<Vec<Oid>>(b"[\"1.2.x\"]").unwrap_err();
        assert!(matches!(err, Error::Codec(CodecError::JsonDecode(_))));
    }
}

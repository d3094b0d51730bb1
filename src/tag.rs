// SPDX-License-Identifier: MIT

//! Embedded sub-manifest tags
//!
//! A CoRIM carries its CoMID, CoSWID and CoTL payloads as already-encoded
//! byte strings, each starting with the 3-byte CBOR tag header that names the
//! payload format. This module defines those headers, the [`ConciseTag`]
//! trait sub-manifest implementations plug into, and the [`Tag`] type stored
//! in the container.
//!
//! | Kind   | CBOR tag | Prefix     |
//! |--------|----------|------------|
//! | CoSWID | 505      | `d9 01 f9` |
//! | CoMID  | 506      | `d9 01 fa` |
//! | CoTL   | 508      | `d9 01 fc` |

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Bytes, Empty, TagError};

/// d9 01f9 # tag(505)
pub const COSWID_TAG_PREFIX: [u8; 3] = [0xd9, 0x01, 0xf9];
/// d9 01fa # tag(506)
pub const COMID_TAG_PREFIX: [u8; 3] = [0xd9, 0x01, 0xfa];
/// d9 01fc # tag(508)
pub const COTL_TAG_PREFIX: [u8; 3] = [0xd9, 0x01, 0xfc];

/// The sub-manifest formats a CoRIM can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagKind {
    /// Concise Software Identity (CBOR tag 505)
    Coswid,
    /// Concise Module Identifier (CBOR tag 506)
    Comid,
    /// Concise Trust List (CBOR tag 508)
    Cotl,
}

impl TagKind {
    pub const fn cbor_tag(self) -> u64 {
        match self {
            Self::Coswid => 505,
            Self::Comid => 506,
            Self::Cotl => 508,
        }
    }

    pub const fn prefix(self) -> [u8; 3] {
        match self {
            Self::Coswid => COSWID_TAG_PREFIX,
            Self::Comid => COMID_TAG_PREFIX,
            Self::Cotl => COTL_TAG_PREFIX,
        }
    }

    /// Identifies the sub-manifest format from the leading bytes of an
    /// encoded tag. The payload itself is not inspected.
    pub fn classify(encoded: &[u8]) -> Option<Self> {
        [Self::Coswid, Self::Comid, Self::Cotl]
            .into_iter()
            .find(|kind| encoded.starts_with(&kind.prefix()))
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coswid => f.write_str("CoSWID"),
            Self::Comid => f.write_str("CoMID"),
            Self::Cotl => f.write_str("CoTL"),
        }
    }
}

/// A sub-manifest that can be embedded in a CoRIM.
///
/// The container only needs a sub-manifest to be able to check itself and to
/// produce its untagged CBOR encoding; the tag header is added by
/// [`UnsignedCorim::add_sub_manifest`](crate::corim::UnsignedCorim::add_sub_manifest).
pub trait ConciseTag {
    type Error: std::error::Error + Send + Sync + 'static;

    fn valid(&self) -> Result<(), Self::Error>;

    fn to_cbor(&self) -> Result<Vec<u8>, Self::Error>;
}

/// One embedded sub-manifest: the CBOR tag header followed by the encoded
/// payload.
///
/// The format is recognised from the header when the tag is built, whether by
/// [`Tag::wrap`] or by decoding; bytes with an unknown header are kept as they
/// are and report no [`kind`](Tag::kind).
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag {
    kind: Option<TagKind>,
    encoded: Bytes,
}

impl Tag {
    pub fn new(encoded: impl Into<Bytes>) -> Self {
        let encoded = encoded.into();
        Self {
            kind: TagKind::classify(&encoded),
            encoded,
        }
    }

    /// Prepends the header for `kind` to an encoded sub-manifest.
    pub fn wrap(kind: TagKind, payload: &[u8]) -> Self {
        let mut encoded = Vec::with_capacity(kind.prefix().len() + payload.len());
        encoded.extend_from_slice(&kind.prefix());
        encoded.extend_from_slice(payload);

        Self {
            kind: Some(kind),
            encoded: encoded.into(),
        }
    }

    pub fn kind(&self) -> Option<TagKind> {
        self.kind
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.encoded
    }

    /// The encoded sub-manifest without its tag header. Tags of unknown kind
    /// are returned whole.
    pub fn payload(&self) -> &[u8] {
        match self.kind {
            Some(kind) => &self.encoded[kind.prefix().len()..],
            None => &self.encoded,
        }
    }

    pub fn len(&self) -> usize {
        self.encoded.len()
    }

    pub fn valid(&self) -> Result<(), TagError> {
        // not much to check without decoding the payload
        if Empty::is_empty(self) {
            return Err(TagError::Empty);
        }
        Ok(())
    }
}

impl Empty for Tag {
    fn is_empty(&self) -> bool {
        self.encoded.as_ref().is_empty()
    }
}

impl From<Vec<u8>> for Tag {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

impl From<&[u8]> for Tag {
    fn from(value: &[u8]) -> Self {
        Self::new(value)
    }
}

impl AsRef<[u8]> for Tag {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl Serialize for Tag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.encoded.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Bytes::deserialize(deserializer).map(Tag::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_kind_prefixes() {
        assert_eq!(TagKind::Comid.prefix(), [0xd9, 0x01, 0xfa]);
        assert_eq!(TagKind::Coswid.prefix(), [0xd9, 0x01, 0xf9]);
        assert_eq!(TagKind::Cotl.prefix(), [0xd9, 0x01, 0xfc]);

        // the prefix is the CBOR header of a 2-byte tag number
        for kind in [TagKind::Comid, TagKind::Coswid, TagKind::Cotl] {
            let tag = kind.cbor_tag();
            assert_eq!(kind.prefix(), [0xd9, (tag >> 8) as u8, tag as u8]);
        }
    }

    #[test]
    fn test_tag_classification() {
        let comid = Tag::new(vec![0xd9, 0x01, 0xfa, 0xa0]);
        assert_eq!(comid.kind(), Some(TagKind::Comid));
        assert_eq!(comid.payload(), &[0xa0]);

        let coswid = Tag::new(vec![0xd9, 0x01, 0xf9, 0xa1, 0x00, 0x00]);
        assert_eq!(coswid.kind(), Some(TagKind::Coswid));
        assert_eq!(coswid.payload(), &[0xa1, 0x00, 0x00]);

        let unknown = Tag::new(vec![0xd9, 0x01, 0xf5, 0xa0]);
        assert_eq!(unknown.kind(), None);
        assert_eq!(unknown.payload(), &[0xd9, 0x01, 0xf5, 0xa0]);

        let short = Tag::new(vec![0xd9, 0x01]);
        assert_eq!(short.kind(), None);

        assert_eq!(Tag::wrap(TagKind::Comid, &[0xa0]), comid);
    }

    #[test]
    fn test_tag_valid() {
        assert!(Tag::wrap(TagKind::Cotl, &[]).valid().is_ok());
        assert_eq!(Tag::new(vec![]).valid(), Err(TagError::Empty));
        assert_eq!(Tag::default().valid().unwrap_err().to_string(), "empty tag");
    }

    #[test]
    fn test_tag_serde_keeps_kind() {
        let tag = Tag::wrap(TagKind::Coswid, &[0xa0]);

        let mut actual_cbor: Vec<u8> = vec![];
        ciborium::into_writer(&tag, &mut actual_cbor).unwrap();
        assert_eq!(actual_cbor, vec![0x44, 0xd9, 0x01, 0xf9, 0xa0]);

        let tag_de: Tag = ciborium::from_reader(actual_cbor.as_slice()).unwrap();
        assert_eq!(tag_de.kind(), Some(TagKind::Coswid));
        assert_eq!(tag_de, tag);

        let actual_json = serde_json::to_string(&tag).unwrap();
        assert_eq!(actual_json, "\"2QH5oA==\"");

        let tag_de: Tag = serde_json::from_str(actual_json.as_str()).unwrap();
        assert_eq!(tag_de, tag);
    }
}

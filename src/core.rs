// SPDX-License-Identifier: MIT

//! Core types shared by the CoRIM container
//!
//! This module provides the primitive building blocks the container is made of:
//!
//! * [`Bytes`] - byte strings, encoded as CBOR byte strings or base64 JSON strings
//! * [`TaggedUri`] - URIs carried under CBOR tag 32
//! * [`IntegerTime`] - epoch seconds carried under CBOR tag 1
//! * [`HashEntry`] - (algorithm, digest) pairs validated against the IANA
//!   Named Information Hash Algorithm registry
//! * [`Oid`] - object identifiers, encoded as BER arcs in CBOR and dotted
//!   decimal in JSON
//!
//! All types implement serde with a CBOR layout (integer keys, tagged values)
//! when the serializer is not human-readable, and a JSON layout otherwise.

use std::{fmt, marker::PhantomData, ops::Deref, str::FromStr};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use derive_more::From;
use serde::{
    de::{self, Visitor},
    ser::{self, SerializeMap, SerializeSeq},
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::{generate_tagged, CoreError, Empty};

/// Text represents a UTF-8 string value
pub type Text = String;
/// Time represents an integer number of seconds since the Unix epoch
pub type Time = i64;

generate_tagged!(
    (1, IntegerTime, Time, "A representation of time in integer format using CBOR tag 1"),
    (32, TaggedUri, Text, "A URI text string wrapped with CBOR tag 32"),
);

impl From<&str> for TaggedUri {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl Empty for TaggedUri {
    fn is_empty(&self) -> bool {
        self.as_ref().is_empty()
    }
}

/// An owned byte string.
///
/// Serialized as a CBOR byte string, or as a standard (padded) base64 string
/// in JSON.
#[derive(Default, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, From)]
pub struct Bytes(Vec<u8>);

impl Bytes {
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl From<&[u8]> for Bytes {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for Bytes {
    fn from(value: [u8; N]) -> Self {
        Self(value.to_vec())
    }
}

impl Deref for Bytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Empty for Bytes {
    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Bytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&STANDARD.encode(&self.0))
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct BytesVisitor;

        impl<'de> Visitor<'de> for BytesVisitor {
            type Value = Bytes;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a byte string or a base64 encoded string")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                STANDARD
                    .decode(v)
                    .map(Bytes)
                    .map_err(|e| de::Error::custom(format!("invalid base64: {e}")))
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Bytes(v.to_vec()))
            }

            fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Bytes(v))
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_str(BytesVisitor)
        } else {
            deserializer.deserialize_byte_buf(BytesVisitor)
        }
    }
}

/// Hash algorithms from the IANA "Named Information Hash Algorithm" registry
#[repr(u64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashAlgorithm {
    Sha256 = 1,
    Sha256_128 = 2,
    Sha256_120 = 3,
    Sha256_96 = 4,
    Sha256_64 = 5,
    Sha256_32 = 6,
    Sha384 = 7,
    Sha512 = 8,
    Sha3_224 = 9,
    Sha3_256 = 10,
    Sha3_384 = 11,
    Sha3_512 = 12,
}

impl HashAlgorithm {
    /// Registry identifier of the algorithm
    pub const fn id(self) -> u64 {
        self as u64
    }

    /// Expected digest length in bytes
    pub const fn digest_len(self) -> usize {
        match self {
            Self::Sha256 | Self::Sha3_256 => 32,
            Self::Sha256_128 => 16,
            Self::Sha256_120 => 15,
            Self::Sha256_96 => 12,
            Self::Sha256_64 => 8,
            Self::Sha256_32 => 4,
            Self::Sha384 | Self::Sha3_384 => 48,
            Self::Sha512 | Self::Sha3_512 => 64,
            Self::Sha3_224 => 28,
        }
    }

    /// Registry name of the algorithm (e.g. `sha-256`)
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha-256",
            Self::Sha256_128 => "sha-256-128",
            Self::Sha256_120 => "sha-256-120",
            Self::Sha256_96 => "sha-256-96",
            Self::Sha256_64 => "sha-256-64",
            Self::Sha256_32 => "sha-256-32",
            Self::Sha384 => "sha-384",
            Self::Sha512 => "sha-512",
            Self::Sha3_224 => "sha3-224",
            Self::Sha3_256 => "sha3-256",
            Self::Sha3_384 => "sha3-384",
            Self::Sha3_512 => "sha3-512",
        }
    }
}

impl TryFrom<u64> for HashAlgorithm {
    type Error = CoreError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Sha256),
            2 => Ok(Self::Sha256_128),
            3 => Ok(Self::Sha256_120),
            4 => Ok(Self::Sha256_96),
            5 => Ok(Self::Sha256_64),
            6 => Ok(Self::Sha256_32),
            7 => Ok(Self::Sha384),
            8 => Ok(Self::Sha512),
            9 => Ok(Self::Sha3_224),
            10 => Ok(Self::Sha3_256),
            11 => Ok(Self::Sha3_384),
            12 => Ok(Self::Sha3_512),
            n => Err(CoreError::UnknownHashAlgorithm(n)),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Checks that `value` is a digest of the right length for the registered
/// algorithm `alg_id`.
pub fn valid_hash_entry(alg_id: u64, value: &[u8]) -> Result<(), CoreError> {
    let alg = HashAlgorithm::try_from(alg_id)?;

    if value.len() != alg.digest_len() {
        return Err(CoreError::HashLengthMismatch {
            alg,
            expected: alg.digest_len(),
            actual: value.len(),
        });
    }

    Ok(())
}

/// A hash entry with algorithm ID and hash value
///
/// The algorithm is kept as its raw registry identifier so that decoded
/// entries with unregistered algorithms can still be represented and
/// reported by [`HashEntry::valid`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HashEntry {
    /// Algorithm identifier for the hash
    pub hash_alg_id: u64,
    /// The hash value as bytes
    pub hash_value: Bytes,
}

impl HashEntry {
    pub fn new(alg: HashAlgorithm, value: impl Into<Bytes>) -> Self {
        Self {
            hash_alg_id: alg.id(),
            hash_value: value.into(),
        }
    }

    pub fn valid(&self) -> Result<(), CoreError> {
        valid_hash_entry(self.hash_alg_id, &self.hash_value)
    }
}

impl Serialize for HashEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            let mut map = serializer.serialize_map(Some(2))?;
            map.serialize_entry("hash-alg-id", &self.hash_alg_id)?;
            map.serialize_entry("hash-value", &self.hash_value)?;
            map.end()
        } else {
            let mut seq = serializer.serialize_seq(Some(2))?;
            seq.serialize_element(&self.hash_alg_id)?;
            seq.serialize_element(&self.hash_value)?;
            seq.end()
        }
    }
}

impl<'de> Deserialize<'de> for HashEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct HashEntryVisitor;

        impl<'de> Visitor<'de> for HashEntryVisitor {
            type Value = HashEntry;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a [hash-alg-id, hash-value] array or a hash entry object")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let hash_alg_id: u64 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let hash_value: Bytes = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;

                if seq.next_element::<de::IgnoredAny>()?.is_some() {
                    return Err(de::Error::invalid_length(3, &self));
                }

                Ok(HashEntry {
                    hash_alg_id,
                    hash_value,
                })
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut hash_alg_id: Option<u64> = None;
                let mut hash_value: Option<Bytes> = None;

                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "hash-alg-id" => hash_alg_id = Some(map.next_value()?),
                        "hash-value" => hash_value = Some(map.next_value()?),
                        s => {
                            return Err(de::Error::unknown_field(
                                s,
                                &["hash-alg-id", "hash-value"],
                            ))
                        }
                    }
                }

                Ok(HashEntry {
                    hash_alg_id: hash_alg_id.ok_or_else(|| de::Error::missing_field("hash-alg-id"))?,
                    hash_value: hash_value.ok_or_else(|| de::Error::missing_field("hash-value"))?,
                })
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_map(HashEntryVisitor)
        } else {
            deserializer.deserialize_seq(HashEntryVisitor)
        }
    }
}

/// An ASN.1 object identifier, held as its sequence of arcs.
///
/// The text form is dotted decimal (`2.16.840.1.101.3.4`); the binary form is
/// the BER encoding of the arcs without the ASN.1 tag and length octets.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, From)]
pub struct Oid(Vec<u64>);

impl Oid {
    pub fn arcs(&self) -> &[u64] {
        &self.0
    }

    /// Checks the X.660 constraints on the first two arcs.
    pub fn valid(&self) -> Result<(), CoreError> {
        match self.0.as_slice() {
            [] | [_] => Err(CoreError::invalid_oid("at least two arcs are required")),
            [first, _, ..] if *first > 2 => Err(CoreError::invalid_oid(format!(
                "first arc must be 0, 1 or 2, got {first}"
            ))),
            [first, second, ..] if *first < 2 && *second > 39 => Err(CoreError::invalid_oid(
                format!("second arc must be at most 39 under arc {first}, got {second}"),
            )),
            [2, second, ..] if *second > u64::MAX - 80 => {
                Err(CoreError::invalid_oid("second arc is too large"))
            }
            _ => Ok(()),
        }
    }

    pub fn to_ber(&self) -> Result<Vec<u8>, CoreError> {
        self.valid()?;

        let mut out = Vec::with_capacity(self.0.len() + 4);
        push_base128(&mut out, self.0[0] * 40 + self.0[1]);
        for arc in &self.0[2..] {
            push_base128(&mut out, *arc);
        }

        Ok(out)
    }

    pub fn from_ber(data: &[u8]) -> Result<Self, CoreError> {
        if data.is_empty() {
            return Err(CoreError::invalid_oid("empty encoding"));
        }

        let mut arcs = Vec::new();
        let mut current: u64 = 0;
        let mut in_progress = false;

        for &b in data {
            if !in_progress && b == 0x80 {
                return Err(CoreError::invalid_oid("non-minimal sub-identifier encoding"));
            }
            if current > (u64::MAX >> 7) {
                return Err(CoreError::invalid_oid("sub-identifier overflows 64 bits"));
            }

            current = (current << 7) | u64::from(b & 0x7f);

            if b & 0x80 == 0 {
                if arcs.is_empty() {
                    let (first, second) = match current {
                        0..=39 => (0, current),
                        40..=79 => (1, current - 40),
                        _ => (2, current - 80),
                    };
                    arcs.push(first);
                    arcs.push(second);
                } else {
                    arcs.push(current);
                }
                current = 0;
                in_progress = false;
            } else {
                in_progress = true;
            }
        }

        if in_progress {
            return Err(CoreError::invalid_oid("truncated sub-identifier"));
        }

        Ok(Self(arcs))
    }
}

fn push_base128(out: &mut Vec<u8>, mut value: u64) {
    let mut buf = [0u8; 10];
    let mut i = buf.len() - 1;

    buf[i] = (value & 0x7f) as u8;
    value >>= 7;

    while value > 0 {
        i -= 1;
        buf[i] = 0x80 | (value & 0x7f) as u8;
        value >>= 7;
    }

    out.extend_from_slice(&buf[i..]);
}

impl FromStr for Oid {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let arcs = s
            .split('.')
            .map(|arc| {
                if arc.is_empty() || !arc.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(CoreError::invalid_oid(format!("malformed arc \"{arc}\"")));
                }
                arc.parse::<u64>()
                    .map_err(|e| CoreError::invalid_oid(format!("arc \"{arc}\": {e}")))
            })
            .collect::<Result<Vec<u64>, CoreError>>()?;

        let oid = Self(arcs);
        oid.valid()?;
        Ok(oid)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arc) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{arc}")?;
        }
        Ok(())
    }
}

impl Serialize for Oid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            let ber = self.to_ber().map_err(ser::Error::custom)?;
            serializer.serialize_bytes(&ber)
        }
    }
}

impl<'de> Deserialize<'de> for Oid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OidVisitor<'de>(PhantomData<&'de ()>);

        impl<'de> Visitor<'de> for OidVisitor<'de> {
            type Value = Oid;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a dotted-decimal OID string or BER encoded OID bytes")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Oid::from_str(v).map_err(de::Error::custom)
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Oid::from_ber(v).map_err(de::Error::custom)
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_str(OidVisitor(PhantomData))
        } else {
            deserializer.deserialize_bytes(OidVisitor(PhantomData))
        }
    }
}

// SPDX-License-Identifier: MIT

//! # unsigned-corim
//!
//! The unsigned Concise Reference Integrity Manifest (CoRIM) container.
//!
//! An unsigned CoRIM bundles already-encoded sub-manifests (CoMID, CoSWID and
//! CoTL tags) with an identifier and optional metadata: locators of dependent
//! manifests, profile identifiers, a validity window and responsible
//! entities. This crate builds, validates and serializes that container in
//! CBOR and JSON. Signing and the contents of the sub-manifests are out of its
//! scope; sub-manifests plug in through the [`ConciseTag`](tag::ConciseTag)
//! trait.
//!
//! ```rust
//! use unsigned_corim::corim::UnsignedCorim;
//!
//! // { 0: "corim-1", 1: [ h'd901faa0' ] }
//! let cbor = [
//!     0xa2, 0x00, 0x67, 0x63, 0x6f, 0x72, 0x69, 0x6d, 0x2d, 0x31,
//!     0x01, 0x81, 0x44, 0xd9, 0x01, 0xfa, 0xa0,
//! ];
//!
//! let corim = UnsignedCorim::from_cbor(&cbor).unwrap();
//! corim.valid().unwrap();
//!
//! assert_eq!(corim.id_string(), "corim-1");
//! assert_eq!(
//!     corim.to_json().unwrap(),
//!     r#"{"corim-id":"corim-1","tags":["2QH6oA=="]}"#
//! );
//! ```

/// Primitive types shared by the container: bytes, digests, OIDs, tagged URIs
pub mod core;

/// The unsigned CoRIM container and its component maps
pub mod corim;

/// CBOR and JSON encoder/decoder configuration
pub mod codec;

/// Embedded sub-manifest tags
pub mod tag;

/// Macros for easier implementation definitions.
pub(crate) mod macros;

/// Errors for easily handling problems.
pub mod error;

/// Custom CoRIM Results.
pub mod result;

/// Provides the Empty Trait.
pub mod empty;


// Use all public items from each module
use self::core::*;
use codec::*;
use empty::*;
use error::*;
use result::*;
use tag::*;

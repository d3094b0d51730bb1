// SPDX-License-Identifier: MIT

//! Unsigned CoRIM container
//!
//! An [`UnsignedCorim`] bundles one or more encoded sub-manifests (CoMID,
//! CoSWID or CoTL tags) together with an identifier, optional locators of
//! other manifests it depends on, optional profile identifiers, an optional
//! validity window and optional entities responsible for the manifest.
//!
//! The container is assembled with a small set of builder operations, each of
//! which validates its input before touching the container, then checked as a
//! whole with [`UnsignedCorim::valid`] and serialized to CBOR or JSON.
//!
//! # Example
//!
//! ```rust
//! use std::convert::Infallible;
//!
//! use unsigned_corim::corim::UnsignedCorim;
//! use unsigned_corim::tag::ConciseTag;
//!
//! struct EmptyComid;
//!
//! impl ConciseTag for EmptyComid {
//!     type Error = Infallible;
//!
//!     fn valid(&self) -> Result<(), Infallible> {
//!         Ok(())
//!     }
//!
//!     fn to_cbor(&self) -> Result<Vec<u8>, Infallible> {
//!         Ok(vec![0xa0])
//!     }
//! }
//!
//! let mut corim = UnsignedCorim::new();
//! corim
//!     .set_id("corim-1").unwrap()
//!     .add_comid(&EmptyComid).unwrap()
//!     .add_profile("2.16.840.1.101.3.4").unwrap();
//!
//! corim.valid().unwrap();
//!
//! let cbor = corim.to_cbor().unwrap();
//! assert_eq!(UnsignedCorim::from_cbor(&cbor).unwrap(), corim);
//! ```

use std::{fmt, str::FromStr};

use serde::{
    de::{self, Visitor},
    ser::{Error as _, SerializeMap},
    Deserialize, Deserializer, Serialize, Serializer,
};
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::{
    codec::Codec, core::IntegerTime, macros::map_len, ConciseTag, CorimError, EntityError, Empty,
    HashEntry, LocatorError, Oid, ProfileError, Result, Tag, TagKind, TaggedUri, Text, Time,
    ValidityError,
};

/// CBOR tag number of a tagged unsigned CoRIM (`tagged-unsigned-corim-map`).
pub const UNSIGNED_CORIM_CBOR_TAG: u64 = 501;

/// The unsigned CoRIM map.
///
/// ```text
/// corim-map = {
///   &(id: 0) => corim-id-type-choice
///   &(tags: 1) => [ + $concise-tag-type-choice ]
///   ? &(dependent-rims: 2) => [ + corim-locator-map ]
///   ? &(profile: 3) => [ + profile-type-choice ]
///   ? &(rim-validity: 4) => validity-map
///   ? &(entities: 5) => [ + corim-entity-map ]
/// }
/// ```
///
/// Decoding does not validate; call [`valid`](Self::valid) on decoded
/// containers before trusting them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnsignedCorim {
    /// Identifier of the manifest, unset on a freshly created container
    pub id: Option<CorimIdTypeChoice>,
    /// Encoded sub-manifests, in insertion order
    pub tags: Vec<Tag>,
    /// Locators of other manifests this one depends on
    pub dependent_rims: Option<Vec<CorimLocatorMap>>,
    /// Profiles the manifest conforms to
    pub profiles: Option<Vec<ProfileTypeChoice>>,
    /// Window during which the manifest may be used
    pub rim_validity: Option<ValidityMap>,
    /// Entities responsible for the manifest
    pub entities: Option<Vec<CorimEntityMap>>,
}

impl UnsignedCorim {
    /// Creates an empty container. It does not pass [`valid`](Self::valid)
    /// until an id and at least one tag have been added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the container identifier, replacing any previous one.
    ///
    /// Strings that parse as a UUID are stored as a UUID; other non-empty
    /// strings are stored as text. Byte input must be exactly 16 bytes.
    pub fn set_id<T>(&mut self, id: T) -> Result<&mut Self>
    where
        T: TryInto<CorimIdTypeChoice, Error = CorimError>,
    {
        let id = id.try_into()?;
        debug!(%id, "setting CoRIM id");
        self.id = Some(id);
        Ok(self)
    }

    /// The identifier rendered as text, or an empty string when unset.
    pub fn id_string(&self) -> String {
        self.id.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    /// Validates `manifest`, encodes it and appends the result, prefixed with
    /// the tag header for `kind`, to the tags list.
    pub fn add_sub_manifest<T>(&mut self, manifest: &T, kind: TagKind) -> Result<&mut Self>
    where
        T: ConciseTag,
    {
        if let Err(err) = manifest.valid() {
            warn!(%kind, error = %err, "rejecting invalid sub-manifest");
            return Err(CorimError::InvalidConciseTag {
                kind,
                source: Box::new(err),
            }
            .into());
        }

        let payload = manifest.to_cbor().map_err(|err| CorimError::ConciseTagEncoding {
            kind,
            source: Box::new(err),
        })?;

        let tag = Tag::wrap(kind, &payload);
        debug!(%kind, len = tag.len(), "adding sub-manifest");
        self.tags.push(tag);

        Ok(self)
    }

    pub fn add_comid<T: ConciseTag>(&mut self, comid: &T) -> Result<&mut Self> {
        self.add_sub_manifest(comid, TagKind::Comid)
    }

    pub fn add_coswid<T: ConciseTag>(&mut self, coswid: &T) -> Result<&mut Self> {
        self.add_sub_manifest(coswid, TagKind::Coswid)
    }

    pub fn add_cotl<T: ConciseTag>(&mut self, cotl: &T) -> Result<&mut Self> {
        self.add_sub_manifest(cotl, TagKind::Cotl)
    }

    /// Appends a dependent manifest locator. The href and thumbprint are only
    /// checked by [`valid`](Self::valid).
    pub fn add_dependent_rim(
        &mut self,
        href: impl Into<Text>,
        thumbprint: Option<HashEntry>,
    ) -> &mut Self {
        let locator = CorimLocatorMap::new(href, thumbprint);
        debug!(href = %locator.href.as_str(), "adding dependent RIM");
        self.dependent_rims.get_or_insert_with(Vec::new).push(locator);
        self
    }

    /// Parses `profile` as an absolute URI or a dotted-decimal OID and appends
    /// it to the profiles list.
    pub fn add_profile(&mut self, profile: &str) -> Result<&mut Self> {
        let profile: ProfileTypeChoice = profile.parse()?;
        profile.valid()?;

        debug!(%profile, "adding profile");
        self.profiles.get_or_insert_with(Vec::new).push(profile);
        Ok(self)
    }

    /// Sets the validity window, replacing any previous one.
    pub fn set_rim_validity(&mut self, not_before: Option<Time>, not_after: Time) -> Result<&mut Self> {
        let validity = ValidityMap::new(not_before, not_after);
        validity.valid()?;

        self.rim_validity = Some(validity);
        Ok(self)
    }

    pub fn add_entity(
        &mut self,
        name: &str,
        reg_id: Option<&str>,
        roles: &[CorimRoleTypeChoice],
    ) -> Result<&mut Self> {
        let entity = CorimEntityMap::new(name, reg_id.map(TaggedUri::from), roles.to_vec());
        entity.valid()?;

        debug!(name, "adding entity");
        self.entities.get_or_insert_with(Vec::new).push(entity);
        Ok(self)
    }

    /// Checks the structural constraints on the container.
    ///
    /// Checks run in a fixed order (id, tags list, each tag, each dependent
    /// RIM, each profile, validity window, each entity) and the first failure
    /// is returned. Errors for list elements carry the element's position.
    pub fn valid(&self) -> Result<()> {
        self.check().map_err(|err| {
            debug!(error = %err, "unsigned CoRIM validation failed");
            err.into()
        })
    }

    fn check(&self) -> std::result::Result<(), CorimError> {
        if self.id.is_empty() {
            return Err(CorimError::EmptyId);
        }

        if self.tags.is_empty() {
            return Err(CorimError::NoTags);
        }

        for (position, tag) in self.tags.iter().enumerate() {
            tag.valid()
                .map_err(|source| CorimError::InvalidTag { position, source })?;
        }

        for (position, locator) in self.dependent_rims.iter().flatten().enumerate() {
            locator
                .valid()
                .map_err(|source| CorimError::InvalidDependentRim { position, source })?;
        }

        for (position, profile) in self.profiles.iter().flatten().enumerate() {
            profile
                .valid()
                .map_err(|source| CorimError::InvalidProfile { position, source })?;
        }

        if let Some(validity) = &self.rim_validity {
            validity.valid().map_err(CorimError::InvalidRimValidity)?;
        }

        for (position, entity) in self.entities.iter().flatten().enumerate() {
            entity
                .valid()
                .map_err(|source| CorimError::InvalidEntity { position, source })?;
        }

        Ok(())
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        self.to_cbor_with(&Codec::default())
    }

    pub fn to_cbor_with(&self, codec: &Codec) -> Result<Vec<u8>> {
        codec.encode_cbor(self)
    }

    pub fn from_cbor(data: &[u8]) -> Result<Self> {
        Self::from_cbor_with(data, &Codec::default())
    }

    pub fn from_cbor_with(data: &[u8], codec: &Codec) -> Result<Self> {
        codec.decode_cbor(data)
    }

    /// Encodes the container wrapped in CBOR tag 501.
    pub fn to_tagged_cbor(&self) -> Result<Vec<u8>> {
        Codec::default().encode_cbor(&ciborium::tag::Required::<&Self, UNSIGNED_CORIM_CBOR_TAG>(self))
    }

    /// Decodes a container that must be wrapped in CBOR tag 501.
    pub fn from_tagged_cbor(data: &[u8]) -> Result<Self> {
        Codec::default()
            .decode_cbor::<ciborium::tag::Required<Self, UNSIGNED_CORIM_CBOR_TAG>>(data)
            .map(|tagged| tagged.0)
    }

    pub fn to_json(&self) -> Result<String> {
        self.to_json_with(&Codec::default())
    }

    pub fn to_json_with(&self, codec: &Codec) -> Result<String> {
        codec.encode_json(self)
    }

    pub fn from_json(data: impl AsRef<[u8]>) -> Result<Self> {
        Self::from_json_with(data, &Codec::default())
    }

    pub fn from_json_with(data: impl AsRef<[u8]>, codec: &Codec) -> Result<Self> {
        codec.decode_json(data.as_ref())
    }
}

impl Serialize for UnsignedCorim {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let id = self
            .id
            .as_ref()
            .ok_or_else(|| S::Error::custom(CorimError::unset_mandatory_field("UnsignedCorim", "id")))?;

        let is_human_readable = serializer.is_human_readable();
        let len = map_len!(self, 2, dependent_rims, profiles, rim_validity, entities);
        let mut map = serializer.serialize_map(Some(len))?;

        if is_human_readable {
            map.serialize_entry("corim-id", id)?;
            map.serialize_entry("tags", &self.tags)?;
            if let Some(dependent_rims) = &self.dependent_rims {
                map.serialize_entry("dependent-rims", dependent_rims)?;
            }
            if let Some(profiles) = &self.profiles {
                map.serialize_entry("profiles", profiles)?;
            }
            if let Some(rim_validity) = &self.rim_validity {
                map.serialize_entry("rim-validity", rim_validity)?;
            }
            if let Some(entities) = &self.entities {
                map.serialize_entry("entities", entities)?;
            }
        } else {
            map.serialize_entry(&0, id)?;
            map.serialize_entry(&1, &self.tags)?;
            if let Some(dependent_rims) = &self.dependent_rims {
                map.serialize_entry(&2, dependent_rims)?;
            }
            if let Some(profiles) = &self.profiles {
                map.serialize_entry(&3, profiles)?;
            }
            if let Some(rim_validity) = &self.rim_validity {
                map.serialize_entry(&4, rim_validity)?;
            }
            if let Some(entities) = &self.entities {
                map.serialize_entry(&5, entities)?;
            }
        }

        map.end()
    }
}

const UNSIGNED_CORIM_FIELDS: &[&str] = &[
    "corim-id",
    "tags",
    "dependent-rims",
    "profiles",
    "rim-validity",
    "entities",
];

impl<'de> Deserialize<'de> for UnsignedCorim {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct UnsignedCorimVisitor {
            is_human_readable: bool,
        }

        impl<'de> Visitor<'de> for UnsignedCorimVisitor {
            type Value = UnsignedCorim;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map containing unsigned CoRIM fields")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut id: Option<CorimIdTypeChoice> = None;
                let mut tags: Option<Vec<Tag>> = None;
                let mut dependent_rims: Option<Vec<CorimLocatorMap>> = None;
                let mut profiles: Option<Vec<ProfileTypeChoice>> = None;
                let mut rim_validity: Option<ValidityMap> = None;
                let mut entities: Option<Vec<CorimEntityMap>> = None;

                loop {
                    // both encodings share one set of slots, indexed by CBOR key
                    let key = if self.is_human_readable {
                        match map.next_key::<String>()? {
                            Some(s) => match UNSIGNED_CORIM_FIELDS.iter().position(|f| *f == s) {
                                Some(index) => index,
                                None => {
                                    return Err(de::Error::unknown_field(&s, UNSIGNED_CORIM_FIELDS))
                                }
                            },
                            None => break,
                        }
                    } else {
                        match map.next_key::<i64>()? {
                            Some(n @ 0..=5) => n as usize,
                            Some(n) => {
                                return Err(de::Error::custom(format!(
                                    "unknown unsigned CoRIM map key {n}"
                                )))
                            }
                            None => break,
                        }
                    };

                    let name = UNSIGNED_CORIM_FIELDS[key];
                    match key {
                        0 => next_once(&mut map, &mut id, name)?,
                        1 => next_once(&mut map, &mut tags, name)?,
                        2 => next_once(&mut map, &mut dependent_rims, name)?,
                        3 => next_once(&mut map, &mut profiles, name)?,
                        4 => next_once(&mut map, &mut rim_validity, name)?,
                        _ => next_once(&mut map, &mut entities, name)?,
                    }
                }

                Ok(UnsignedCorim {
                    id,
                    tags: tags.unwrap_or_default(),
                    dependent_rims,
                    profiles,
                    rim_validity,
                    entities,
                })
            }
        }

        let is_hr = deserializer.is_human_readable();
        deserializer.deserialize_map(UnsignedCorimVisitor {
            is_human_readable: is_hr,
        })
    }
}

/// Reads the next map value into `slot`, rejecting repeated keys.
fn next_once<'de, A, T>(
    map: &mut A,
    slot: &mut Option<T>,
    field: &'static str,
) -> std::result::Result<(), A::Error>
where
    A: de::MapAccess<'de>,
    T: Deserialize<'de>,
{
    if slot.is_some() {
        return Err(de::Error::duplicate_field(field));
    }
    *slot = Some(map.next_value()?);
    Ok(())
}

/// Identifier of a CoRIM: free text or a UUID.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CorimIdTypeChoice {
    Tstr(Text),
    Uuid(Uuid),
}

impl CorimIdTypeChoice {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Tstr(text) => Some(text.as_str()),
            Self::Uuid(_) => None,
        }
    }

    pub fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Self::Uuid(uuid) => Some(uuid),
            Self::Tstr(_) => None,
        }
    }
}

impl Empty for CorimIdTypeChoice {
    fn is_empty(&self) -> bool {
        match self {
            Self::Tstr(text) => text.is_empty(),
            Self::Uuid(uuid) => uuid.is_nil(),
        }
    }
}

impl fmt::Display for CorimIdTypeChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tstr(text) => f.write_str(text),
            Self::Uuid(uuid) => write!(f, "{uuid}"),
        }
    }
}

impl TryFrom<Uuid> for CorimIdTypeChoice {
    type Error = CorimError;

    fn try_from(value: Uuid) -> std::result::Result<Self, Self::Error> {
        if value.is_nil() {
            return Err(CorimError::invalid_id("nil UUID"));
        }
        Ok(Self::Uuid(value))
    }
}

impl TryFrom<&str> for CorimIdTypeChoice {
    type Error = CorimError;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(CorimError::invalid_id("empty string"));
        }

        match Uuid::parse_str(value) {
            Ok(uuid) => Self::try_from(uuid),
            Err(_) => Ok(Self::Tstr(value.to_string())),
        }
    }
}

impl TryFrom<String> for CorimIdTypeChoice {
    type Error = CorimError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        if Uuid::parse_str(&value).is_ok() {
            return Self::try_from(value.as_str());
        }
        if value.is_empty() {
            return Err(CorimError::invalid_id("empty string"));
        }
        Ok(Self::Tstr(value))
    }
}

impl TryFrom<[u8; 16]> for CorimIdTypeChoice {
    type Error = CorimError;

    fn try_from(value: [u8; 16]) -> std::result::Result<Self, Self::Error> {
        Self::try_from(Uuid::from_bytes(value))
    }
}

impl TryFrom<&[u8]> for CorimIdTypeChoice {
    type Error = CorimError;

    fn try_from(value: &[u8]) -> std::result::Result<Self, Self::Error> {
        let uuid = Uuid::from_slice(value).map_err(CorimError::invalid_id)?;
        Self::try_from(uuid)
    }
}

impl Serialize for CorimIdTypeChoice {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Tstr(text) => serializer.serialize_str(text),
            Self::Uuid(uuid) if serializer.is_human_readable() => serializer.collect_str(uuid),
            Self::Uuid(uuid) => serializer.serialize_bytes(uuid.as_bytes()),
        }
    }
}

impl<'de> Deserialize<'de> for CorimIdTypeChoice {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CorimIdTypeChoiceVisitor {
            is_human_readable: bool,
        }

        impl<'de> Visitor<'de> for CorimIdTypeChoiceVisitor {
            type Value = CorimIdTypeChoice;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or 16 bytes of a UUID")
            }

            fn visit_str<E>(self, v: &str) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                self.visit_string(v.to_string())
            }

            fn visit_string<E>(self, v: String) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                // JSON has no distinct UUID form
                if self.is_human_readable {
                    if let Ok(uuid) = Uuid::parse_str(&v) {
                        return Ok(CorimIdTypeChoice::Uuid(uuid));
                    }
                }
                Ok(CorimIdTypeChoice::Tstr(v))
            }

            fn visit_bytes<E>(self, v: &[u8]) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Uuid::from_slice(v)
                    .map(CorimIdTypeChoice::Uuid)
                    .map_err(de::Error::custom)
            }
        }

        let is_hr = deserializer.is_human_readable();
        deserializer.deserialize_any(CorimIdTypeChoiceVisitor {
            is_human_readable: is_hr,
        })
    }
}

/// Location of a dependent manifest and, optionally, its expected digest.
///
/// ```text
/// corim-locator-map = {
///   &(href: 0) => uri
///   ? &(thumbprint: 1) => digest
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CorimLocatorMap {
    pub href: TaggedUri,
    pub thumbprint: Option<HashEntry>,
}

impl CorimLocatorMap {
    pub fn new(href: impl Into<Text>, thumbprint: Option<HashEntry>) -> Self {
        Self {
            href: TaggedUri::new(href.into()),
            thumbprint,
        }
    }

    pub fn valid(&self) -> std::result::Result<(), LocatorError> {
        if self.href.is_empty() {
            return Err(LocatorError::EmptyHref);
        }

        if let Some(thumbprint) = &self.thumbprint {
            thumbprint.valid().map_err(LocatorError::InvalidThumbprint)?;
        }

        Ok(())
    }
}

impl Serialize for CorimLocatorMap {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let is_human_readable = serializer.is_human_readable();
        let mut map = serializer.serialize_map(Some(map_len!(self, 1, thumbprint)))?;

        if is_human_readable {
            map.serialize_entry("href", &self.href)?;
            if let Some(thumbprint) = &self.thumbprint {
                map.serialize_entry("thumbprint", thumbprint)?;
            }
        } else {
            map.serialize_entry(&0, &self.href)?;
            if let Some(thumbprint) = &self.thumbprint {
                map.serialize_entry(&1, thumbprint)?;
            }
        }

        map.end()
    }
}

impl<'de> Deserialize<'de> for CorimLocatorMap {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CorimLocatorMapVisitor {
            is_human_readable: bool,
        }

        impl<'de> Visitor<'de> for CorimLocatorMapVisitor {
            type Value = CorimLocatorMap;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map containing CorimLocatorMap fields")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut href: Option<TaggedUri> = None;
                let mut thumbprint: Option<HashEntry> = None;

                loop {
                    if self.is_human_readable {
                        match map.next_key::<String>()?.as_deref() {
                            Some("href") => next_once(&mut map, &mut href, "href")?,
                            Some("thumbprint") => {
                                next_once(&mut map, &mut thumbprint, "thumbprint")?
                            }
                            Some(s) => {
                                return Err(de::Error::unknown_field(s, &["href", "thumbprint"]))
                            }
                            None => break,
                        }
                    } else {
                        match map.next_key::<i64>()? {
                            Some(0) => next_once(&mut map, &mut href, "href")?,
                            Some(1) => next_once(&mut map, &mut thumbprint, "thumbprint")?,
                            Some(n) => {
                                return Err(de::Error::unknown_field(
                                    n.to_string().as_str(),
                                    &["0-1"],
                                ))
                            }
                            None => break,
                        }
                    }
                }

                Ok(CorimLocatorMap {
                    href: href.ok_or_else(|| de::Error::missing_field("href"))?,
                    thumbprint,
                })
            }
        }

        let is_hr = deserializer.is_human_readable();
        deserializer.deserialize_map(CorimLocatorMapVisitor {
            is_human_readable: is_hr,
        })
    }
}

/// Identifies a profile the manifest conforms to.
///
/// ```text
/// profile-type-choice = uri / tagged-oid-type
/// ```
///
/// In CBOR a URI profile is carried under tag 32 and an OID profile under
/// tag 111; in JSON both are plain strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProfileTypeChoice {
    Uri(Url),
    Oid(Oid),
}

impl ProfileTypeChoice {
    pub fn valid(&self) -> std::result::Result<(), ProfileError> {
        match self {
            Self::Uri(_) => Ok(()),
            Self::Oid(oid) => oid.valid().map_err(ProfileError::InvalidOid),
        }
    }
}

impl FromStr for ProfileTypeChoice {
    type Err = ProfileError;

    /// An absolute URI is tried first, then a dotted-decimal OID.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if let Ok(url) = Url::parse(s) {
            return Ok(Self::Uri(url));
        }

        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
            return Oid::from_str(s)
                .map(Self::Oid)
                .map_err(ProfileError::InvalidOid);
        }

        Err(ProfileError::NotUriOrOid(s.to_string()))
    }
}

impl fmt::Display for ProfileTypeChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uri(url) => f.write_str(url.as_str()),
            Self::Oid(oid) => write!(f, "{oid}"),
        }
    }
}

impl From<Oid> for ProfileTypeChoice {
    fn from(value: Oid) -> Self {
        Self::Oid(value)
    }
}

impl From<Url> for ProfileTypeChoice {
    fn from(value: Url) -> Self {
        Self::Uri(value)
    }
}

impl Serialize for ProfileTypeChoice {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            return serializer.collect_str(self);
        }

        match self {
            Self::Uri(url) => ciborium::tag::Required::<&str, 32>(url.as_str()).serialize(serializer),
            Self::Oid(oid) => ciborium::tag::Required::<&Oid, 111>(oid).serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ProfileTypeChoice {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            return s.parse().map_err(de::Error::custom);
        }

        match ciborium::Value::deserialize(deserializer)? {
            ciborium::Value::Tag(32, inner) => match *inner {
                ciborium::Value::Text(s) => Url::parse(&s)
                    .map(Self::Uri)
                    .map_err(|e| de::Error::custom(format!("invalid profile URI \"{s}\": {e}"))),
                _ => Err(de::Error::custom("profile URI must be a text string")),
            },
            ciborium::Value::Tag(111, inner) => match *inner {
                ciborium::Value::Bytes(ber) => {
                    Oid::from_ber(&ber).map(Self::Oid).map_err(de::Error::custom)
                }
                _ => Err(de::Error::custom("profile OID must be a byte string")),
            },
            ciborium::Value::Tag(n, _) => Err(de::Error::custom(format!(
                "unexpected CBOR tag {n} for profile, expected 32 or 111"
            ))),
            _ => Err(de::Error::custom(
                "profile must be a URI (tag 32) or an OID (tag 111)",
            )),
        }
    }
}

/// Window during which the manifest may be used.
///
/// ```text
/// validity-map = {
///   ? &(not-before: 0) => time
///   &(not-after: 1) => time
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ValidityMap {
    pub not_before: Option<Time>,
    pub not_after: Time,
}

impl ValidityMap {
    pub const fn new(not_before: Option<Time>, not_after: Time) -> Self {
        Self {
            not_before,
            not_after,
        }
    }

    pub fn valid(&self) -> std::result::Result<(), ValidityError> {
        match self.not_before {
            Some(not_before) if not_before > self.not_after => Err(ValidityError::Inverted {
                not_before,
                not_after: self.not_after,
            }),
            _ => Ok(()),
        }
    }

    /// Whether `time` falls inside the window, bounds included.
    pub fn contains(&self, time: Time) -> bool {
        self.not_before.map_or(true, |not_before| not_before <= time) && time <= self.not_after
    }
}

impl Serialize for ValidityMap {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let is_human_readable = serializer.is_human_readable();
        let mut map = serializer.serialize_map(Some(map_len!(self, 1, not_before)))?;

        if is_human_readable {
            if let Some(not_before) = &self.not_before {
                map.serialize_entry("not-before", not_before)?;
            }
            map.serialize_entry("not-after", &self.not_after)?;
        } else {
            if let Some(not_before) = self.not_before {
                map.serialize_entry(&0, &IntegerTime::new(not_before))?;
            }
            map.serialize_entry(&1, &IntegerTime::new(self.not_after))?;
        }

        map.end()
    }
}

impl<'de> Deserialize<'de> for ValidityMap {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValidityMapVisitor {
            is_human_readable: bool,
        }

        impl<'de> Visitor<'de> for ValidityMapVisitor {
            type Value = ValidityMap;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map containing ValidityMap fields")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                // IntegerTime is transparent in JSON
                let mut not_before: Option<IntegerTime> = None;
                let mut not_after: Option<IntegerTime> = None;

                loop {
                    if self.is_human_readable {
                        match map.next_key::<String>()?.as_deref() {
                            Some("not-before") => {
                                next_once(&mut map, &mut not_before, "not-before")?
                            }
                            Some("not-after") => {
                                next_once(&mut map, &mut not_after, "not-after")?
                            }
                            Some(s) => {
                                return Err(de::Error::unknown_field(
                                    s,
                                    &["not-before", "not-after"],
                                ))
                            }
                            None => break,
                        }
                    } else {
                        match map.next_key::<i64>()? {
                            Some(0) => next_once(&mut map, &mut not_before, "not-before")?,
                            Some(1) => next_once(&mut map, &mut not_after, "not-after")?,
                            Some(n) => {
                                return Err(de::Error::unknown_field(
                                    n.to_string().as_str(),
                                    &["0-1"],
                                ))
                            }
                            None => break,
                        }
                    }
                }

                Ok(ValidityMap {
                    not_before: not_before.map(IntegerTime::into_inner),
                    not_after: not_after
                        .ok_or_else(|| de::Error::missing_field("not-after"))?
                        .into_inner(),
                })
            }
        }

        let is_hr = deserializer.is_human_readable();
        deserializer.deserialize_map(ValidityMapVisitor {
            is_human_readable: is_hr,
        })
    }
}

/// An entity responsible for the manifest.
///
/// ```text
/// corim-entity-map = {
///   &(entity-name: 0) => $entity-name-type-choice
///   ? &(reg-id: 1) => uri
///   &(role: 2) => [ + $corim-role-type-choice ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CorimEntityMap {
    pub entity_name: Text,
    pub reg_id: Option<TaggedUri>,
    pub roles: Vec<CorimRoleTypeChoice>,
}

impl CorimEntityMap {
    pub fn new(
        entity_name: impl Into<Text>,
        reg_id: Option<TaggedUri>,
        roles: Vec<CorimRoleTypeChoice>,
    ) -> Self {
        Self {
            entity_name: entity_name.into(),
            reg_id,
            roles,
        }
    }

    pub fn valid(&self) -> std::result::Result<(), EntityError> {
        if self.entity_name.is_empty() {
            return Err(EntityError::EmptyName);
        }

        if matches!(&self.reg_id, Some(reg_id) if reg_id.is_empty()) {
            return Err(EntityError::EmptyRegId);
        }

        if self.roles.is_empty() {
            return Err(EntityError::NoRoles);
        }

        Ok(())
    }
}

impl Serialize for CorimEntityMap {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let is_human_readable = serializer.is_human_readable();
        let mut map = serializer.serialize_map(Some(map_len!(self, 2, reg_id)))?;

        if is_human_readable {
            map.serialize_entry("entity-name", &self.entity_name)?;
            if let Some(reg_id) = &self.reg_id {
                map.serialize_entry("reg-id", reg_id)?;
            }
            map.serialize_entry("role", &self.roles)?;
        } else {
            map.serialize_entry(&0, &self.entity_name)?;
            if let Some(reg_id) = &self.reg_id {
                map.serialize_entry(&1, reg_id)?;
            }
            map.serialize_entry(&2, &self.roles)?;
        }

        map.end()
    }
}

impl<'de> Deserialize<'de> for CorimEntityMap {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CorimEntityMapVisitor {
            is_human_readable: bool,
        }

        impl<'de> Visitor<'de> for CorimEntityMapVisitor {
            type Value = CorimEntityMap;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map containing CorimEntityMap fields")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut entity_name: Option<Text> = None;
                let mut reg_id: Option<TaggedUri> = None;
                let mut roles: Option<Vec<CorimRoleTypeChoice>> = None;

                loop {
                    if self.is_human_readable {
                        match map.next_key::<String>()?.as_deref() {
                            Some("entity-name") => {
                                next_once(&mut map, &mut entity_name, "entity-name")?
                            }
                            Some("reg-id") => next_once(&mut map, &mut reg_id, "reg-id")?,
                            Some("role") => next_once(&mut map, &mut roles, "role")?,
                            Some(s) => {
                                return Err(de::Error::unknown_field(
                                    s,
                                    &["entity-name", "reg-id", "role"],
                                ))
                            }
                            None => break,
                        }
                    } else {
                        match map.next_key::<i64>()? {
                            Some(0) => {
                                next_once(&mut map, &mut entity_name, "entity-name")?
                            }
                            Some(1) => next_once(&mut map, &mut reg_id, "reg-id")?,
                            Some(2) => next_once(&mut map, &mut roles, "role")?,
                            Some(n) => {
                                return Err(de::Error::unknown_field(
                                    n.to_string().as_str(),
                                    &["0-2"],
                                ))
                            }
                            None => break,
                        }
                    }
                }

                Ok(CorimEntityMap {
                    entity_name: entity_name
                        .ok_or_else(|| de::Error::missing_field("entity-name"))?,
                    reg_id,
                    roles: roles.ok_or_else(|| de::Error::missing_field("role"))?,
                })
            }
        }

        let is_hr = deserializer.is_human_readable();
        deserializer.deserialize_map(CorimEntityMapVisitor {
            is_human_readable: is_hr,
        })
    }
}

/// Roles an entity can hold with respect to a CoRIM
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum CorimRoleTypeChoice {
    /// Creator of the manifest
    ManifestCreator = 1,
    /// Signer of the manifest
    ManifestSigner = 2,
}

impl CorimRoleTypeChoice {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ManifestCreator => "manifest-creator",
            Self::ManifestSigner => "manifest-signer",
        }
    }
}

impl fmt::Display for CorimRoleTypeChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i64> for CorimRoleTypeChoice {
    type Error = CorimError;

    fn try_from(value: i64) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::ManifestCreator),
            2 => Ok(Self::ManifestSigner),
            n => Err(CorimError::InvalidRole(n.to_string())),
        }
    }
}

impl FromStr for CorimRoleTypeChoice {
    type Err = CorimError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "manifest-creator" => Ok(Self::ManifestCreator),
            "manifest-signer" => Ok(Self::ManifestSigner),
            s => Err(CorimError::InvalidRole(s.to_string())),
        }
    }
}

impl Serialize for CorimRoleTypeChoice {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(self.as_str())
        } else {
            serializer.serialize_u8(*self as u8)
        }
    }
}

impl<'de> Deserialize<'de> for CorimRoleTypeChoice {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            String::deserialize(deserializer)?
                .parse()
                .map_err(de::Error::custom)
        } else {
            i64::deserialize(deserializer)?
                .try_into()
                .map_err(de::Error::custom)
        }
    }
}

#[cfg(test)]
#[rustfmt::skip::macros(vec)]
mod tests {
    use super::*;
    use crate::{
        test::{MockTag, SerdeTestCase},
        CodecConfig, CoreError, Error, HashAlgorithm, TagError, ValidationCategory,
    };

    fn comid() -> MockTag {
        MockTag::new(vec![0xa0])
    }

    fn minimal_corim() -> UnsignedCorim {
        let mut corim = UnsignedCorim::new();
        corim.set_id("corim-1").unwrap().add_comid(&comid()).unwrap();
        corim
    }

    fn corim_error(result: Result<()>) -> CorimError {
        match result {
            Err(Error::Corim(err)) => err,
            other => panic!("expected a CoRIM error, got {other:?}"),
        }
    }

    #[test]
    fn test_unsigned_corim_serde() {
        let mut corim = minimal_corim();
        corim.add_profile("2.16.840.1.101.3.4").unwrap();

        let test_cases = vec![
            SerdeTestCase {
                value: corim,
                expected_cbor: vec![
                    0xa3, // map(3)
                      0x00, // key: 0 [id]
                      0x67, // value: tstr(7)
                        0x63, 0x6f, 0x72, 0x69, 0x6d, 0x2d, 0x31, // "corim-1"
                      0x01, // key: 1 [tags]
                      0x81, // value: array(1)
                        0x44, // bstr(4)
                          0xd9, 0x01, 0xfa, // tag(506)
                          0xa0, // map(0)
                      0x03, // key: 3 [profiles]
                      0x81, // value: array(1)
                        0xd8, 0x6f, // tag(111)
                          0x47, // bstr(7)
                            0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04,
                ],
                expected_json: r#"{"corim-id":"corim-1","tags":["2QH6oA=="],"profiles":["2.16.840.1.101.3.4"]}"#,
            },
        ];

        for tc in test_cases.into_iter() {
            tc.run();
        }
    }

    #[test]
    fn test_unsigned_corim_full_round_trip() {
        let thumbprint = HashEntry::new(HashAlgorithm::Sha256, [0x5a; 32]);

        let mut corim = UnsignedCorim::new();
        corim
            .set_id("5c57e8f4-4d18-4c24-b6c0-e2d0e8f6a1b3")
            .unwrap()
            .add_comid(&comid())
            .unwrap()
            .add_coswid(&MockTag::new(vec![0xa1, 0x00, 0x61, 0x78]))
            .unwrap()
            .add_cotl(&MockTag::new(vec![0x80]))
            .unwrap()
            .add_dependent_rim("https://example.com/rim", Some(thumbprint))
            .add_dependent_rim("https://example.com/other", None)
            .add_profile("https://example.com/profile")
            .unwrap()
            .add_profile("1.3.6.1.4.1.5")
            .unwrap()
            .set_rim_validity(Some(1_700_000_000), 1_800_000_000)
            .unwrap()
            .add_entity(
                "ACME Ltd.",
                Some("https://acme.example"),
                &[CorimRoleTypeChoice::ManifestCreator, CorimRoleTypeChoice::ManifestSigner],
            )
            .unwrap();

        corim.valid().unwrap();
        assert!(corim.id.as_ref().unwrap().as_uuid().is_some());

        let cbor = corim.to_cbor().unwrap();
        let decoded = UnsignedCorim::from_cbor(&cbor).unwrap();
        assert_eq!(decoded, corim);
        assert_eq!(decoded.to_cbor().unwrap(), cbor);
        decoded.valid().unwrap();

        let json = corim.to_json().unwrap();
        let decoded = UnsignedCorim::from_json(&json).unwrap();
        assert_eq!(decoded, corim);
        assert_eq!(decoded.to_json().unwrap(), json);

        let kinds: Vec<Option<TagKind>> = decoded.tags.iter().map(Tag::kind).collect();
        assert_eq!(
            kinds,
            vec![Some(TagKind::Comid), Some(TagKind::Coswid), Some(TagKind::Cotl)]
        );
    }

    #[test]
    fn test_unsigned_corim_json_layout() {
        let mut corim = UnsignedCorim::new();
        corim
            .set_id(Uuid::from_bytes([0x11; 16]))
            .unwrap()
            .add_coswid(&MockTag::new(vec![0xa0]))
            .unwrap()
            .set_rim_validity(None, 1_800_000_000)
            .unwrap()
            .add_entity("ACME", None, &[CorimRoleTypeChoice::ManifestSigner])
            .unwrap();

        assert_eq!(
            corim.to_json().unwrap(),
            concat!(
                r#"{"corim-id":"11111111-1111-1111-1111-111111111111","#,
                r#""tags":["2QH5oA=="],"#,
                r#""rim-validity":{"not-after":1800000000},"#,
                r#""entities":[{"entity-name":"ACME","role":["manifest-signer"]}]}"#,
            )
        );

        let pretty = corim
            .to_json_with(&Codec::new(CodecConfig::default().with_pretty_json(true)))
            .unwrap();
        assert!(pretty.contains("\n  \"tags\": [\n"));
        assert_eq!(UnsignedCorim::from_json(pretty).unwrap(), corim);
    }

    #[test]
    fn test_unsigned_corim_cbor_uuid_id() {
        let mut corim = UnsignedCorim::new();
        corim
            .set_id([0x11; 16])
            .unwrap()
            .add_comid(&comid())
            .unwrap();

        let mut expected: Vec<u8> = vec![0xa2, 0x00, 0x50];
        expected.extend_from_slice(&[0x11; 16]);
        expected.extend_from_slice(&[0x01, 0x81, 0x44, 0xd9, 0x01, 0xfa, 0xa0]);

        assert_eq!(corim.to_cbor().unwrap(), expected);
        assert_eq!(UnsignedCorim::from_cbor(&expected).unwrap(), corim);
    }

    #[test]
    fn test_unsigned_corim_tagged_cbor() {
        let corim = minimal_corim();

        let tagged = corim.to_tagged_cbor().unwrap();
        assert_eq!(&tagged[..3], &[0xd9, 0x01, 0xf5]);
        assert_eq!(&tagged[3..], corim.to_cbor().unwrap().as_slice());

        assert_eq!(UnsignedCorim::from_tagged_cbor(&tagged).unwrap(), corim);

        let err = UnsignedCorim::from_tagged_cbor(&corim.to_cbor().unwrap()).unwrap_err();
        assert!(matches!(err, Error::Codec(_)));
    }

    #[test]
    fn test_unsigned_corim_decode_does_not_validate() {
        // { 1: [] }
        let cbor: Vec<u8> = vec![0xa1, 0x01, 0x80];

        let corim = UnsignedCorim::from_cbor(&cbor).unwrap();
        assert_eq!(corim.id, None);
        assert!(corim.tags.is_empty());
        assert!(matches!(corim_error(corim.valid()), CorimError::EmptyId));

        let corim = UnsignedCorim::from_json(r#"{"corim-id":"x","tags":[""]}"#).unwrap();
        let err = corim_error(corim.valid());
        assert!(matches!(
            err,
            CorimError::InvalidTag {
                position: 0,
                source: TagError::Empty
            }
        ));
        assert_eq!(err.to_string(), "tag validation failed at pos 0: empty tag");
    }

    #[test]
    fn test_unsigned_corim_decode_rejects_malformed() {
        // unknown key 9
        let err = UnsignedCorim::from_cbor(&[0xa1, 0x09, 0x80]).unwrap_err();
        assert!(matches!(err, Error::Codec(_)));

        // duplicate key 1
        let err = UnsignedCorim::from_cbor(&[0xa2, 0x01, 0x80, 0x01, 0x80]).unwrap_err();
        assert!(matches!(err, Error::Codec(_)));

        // not a map
        let err = UnsignedCorim::from_cbor(&[0x80]).unwrap_err();
        assert!(matches!(err, Error::Codec(_)));

        // truncated
        let cbor = minimal_corim().to_cbor().unwrap();
        assert!(UnsignedCorim::from_cbor(&cbor[..cbor.len() - 1]).is_err());

        let err = UnsignedCorim::from_json(r#"{"corim-id":"x","tag":[]}"#).unwrap_err();
        assert!(matches!(err, Error::Codec(_)));

        // a locator without its href
        let err =
            UnsignedCorim::from_json(r#"{"corim-id":"x","tags":[],"dependent-rims":[{}]}"#)
                .unwrap_err();
        assert!(err.to_string().contains("href"));
    }

    #[test]
    fn test_unsigned_corim_serialize_requires_id() {
        let mut corim = UnsignedCorim::new();
        corim.add_comid(&comid()).unwrap();

        let err = corim.to_cbor().unwrap_err();
        assert!(err.to_string().contains("UnsignedCorim field(s) id must be set"));
        assert!(corim.to_json().is_err());
    }

    #[test]
    fn test_valid_ordering() {
        assert!(matches!(corim_error(UnsignedCorim::new().valid()), CorimError::EmptyId));

        let mut corim = UnsignedCorim::new();
        corim.set_id("corim-1").unwrap();
        let err = corim_error(corim.valid());
        assert!(matches!(err, CorimError::NoTags));
        assert_eq!(err.to_string(), "tags validation failed: no tags");

        // every later category is broken, only the first one is reported
        corim.tags.push(Tag::wrap(TagKind::Comid, &[0xa0]));
        corim.tags.push(Tag::default());
        corim.add_dependent_rim("", None);
        corim.profiles = Some(vec![ProfileTypeChoice::Oid(Oid::from(vec![7, 1]))]);
        corim.rim_validity = Some(ValidityMap::new(Some(2), 1));
        corim.entities = Some(vec![CorimEntityMap::new("", None, vec![])]);

        let expected = [
            (ValidationCategory::Tag, Some(1)),
            (ValidationCategory::DependentRim, Some(0)),
            (ValidationCategory::Profile, Some(0)),
            (ValidationCategory::RimValidity, None),
            (ValidationCategory::Entity, Some(0)),
        ];

        for (category, position) in expected {
            let err = corim_error(corim.valid());
            assert_eq!(err.category(), Some(category), "{err}");
            assert_eq!(err.position(), position);

            match category {
                ValidationCategory::Tag => {
                    corim.tags.pop();
                }
                ValidationCategory::DependentRim => corim.dependent_rims = None,
                ValidationCategory::Profile => corim.profiles = None,
                ValidationCategory::RimValidity => corim.rim_validity = None,
                _ => corim.entities = None,
            }
        }

        corim.valid().unwrap();
    }

    #[test]
    fn test_valid_nil_uuid_id() {
        let mut corim = minimal_corim();
        corim.id = Some(CorimIdTypeChoice::Uuid(Uuid::nil()));
        assert!(matches!(corim_error(corim.valid()), CorimError::EmptyId));

        corim.id = Some(CorimIdTypeChoice::Tstr(String::new()));
        assert_eq!(corim_error(corim.valid()).to_string(), "empty id");
    }

    #[test]
    fn test_valid_dependent_rims() {
        let mut corim = minimal_corim();
        corim.add_dependent_rim("", None);

        let err = corim_error(corim.valid());
        assert!(matches!(
            err,
            CorimError::InvalidDependentRim {
                position: 0,
                source: LocatorError::EmptyHref
            }
        ));
        assert_eq!(
            err.to_string(),
            "dependent RIM validation failed at pos 0: empty href"
        );

        let mut corim = minimal_corim();
        corim
            .add_dependent_rim("https://example.com/a", None)
            .add_dependent_rim(
                "https://example.com/b",
                Some(HashEntry::new(HashAlgorithm::Sha256, [0u8; 4])),
            );

        let err = corim_error(corim.valid());
        assert_eq!(err.position(), Some(1));
        assert!(matches!(
            err,
            CorimError::InvalidDependentRim {
                source: LocatorError::InvalidThumbprint(CoreError::HashLengthMismatch {
                    expected: 32,
                    actual: 4,
                    ..
                }),
                ..
            }
        ));
        assert!(err
            .to_string()
            .starts_with("dependent RIM validation failed at pos 1: invalid locator thumbprint: "));
    }

    #[test]
    fn test_set_id() {
        let mut corim = UnsignedCorim::new();
        assert_eq!(corim.id_string(), "");

        corim.set_id("corim-1").unwrap();
        assert_eq!(corim.id, Some(CorimIdTypeChoice::Tstr("corim-1".to_string())));
        assert_eq!(corim.id_string(), "corim-1");

        corim.set_id(String::from("5C57E8F4-4D18-4C24-B6C0-E2D0E8F6A1B3")).unwrap();
        assert_eq!(corim.id_string(), "5c57e8f4-4d18-4c24-b6c0-e2d0e8f6a1b3");

        let bytes: &[u8] = &[0x22; 16];
        corim.set_id(bytes).unwrap();
        assert_eq!(corim.id, Some(CorimIdTypeChoice::Uuid(Uuid::from_bytes([0x22; 16]))));

        // failures leave the previous id in place
        assert!(corim.set_id("").is_err());
        assert!(corim.set_id(String::new()).is_err());
        assert!(corim.set_id(Uuid::nil()).is_err());
        assert!(corim.set_id("00000000-0000-0000-0000-000000000000").is_err());
        let short: &[u8] = &[0x22; 15];
        let err = corim.set_id(short).unwrap_err();
        assert!(matches!(err, Error::Corim(CorimError::InvalidId(_))));

        assert_eq!(corim.id_string(), "22222222-2222-2222-2222-222222222222");
    }

    #[test]
    fn test_add_sub_manifest() {
        let mut corim = minimal_corim();

        corim.add_sub_manifest(&MockTag::new(vec![0xa0]), TagKind::Coswid).unwrap();
        assert_eq!(corim.tags.len(), 2);
        assert_eq!(corim.tags[0].as_bytes(), &[0xd9, 0x01, 0xfa, 0xa0]);
        assert_eq!(corim.tags[1].as_bytes(), &[0xd9, 0x01, 0xf9, 0xa0]);

        corim.add_cotl(&MockTag::new(vec![0xa0])).unwrap();
        assert_eq!(corim.tags[2].as_bytes(), &[0xd9, 0x01, 0xfc, 0xa0]);

        let err = corim.add_comid(&MockTag::invalid()).unwrap_err();
        assert_eq!(err.to_string(), "CoMID validation failed: mock tag is invalid");
        assert!(std::error::Error::source(&err).is_some());

        let err = corim.add_coswid(&MockTag::unencodable()).unwrap_err();
        assert!(matches!(
            err,
            Error::Corim(CorimError::ConciseTagEncoding {
                kind: TagKind::Coswid,
                ..
            })
        ));

        assert_eq!(corim.tags.len(), 3);
    }

    #[test]
    fn test_add_profile() {
        let mut corim = UnsignedCorim::new();

        corim
            .add_profile("https://example.com/profile")
            .unwrap()
            .add_profile("tag:example.com,2024:p")
            .unwrap()
            .add_profile("2.16.840.1.101.3.4")
            .unwrap();

        let profiles = corim.profiles.as_ref().unwrap();
        assert!(matches!(profiles[0], ProfileTypeChoice::Uri(_)));
        assert!(matches!(profiles[1], ProfileTypeChoice::Uri(_)));
        assert_eq!(
            profiles[2],
            ProfileTypeChoice::Oid(Oid::from(vec![2, 16, 840, 1, 101, 3, 4]))
        );

        for bad in ["", "not a profile", "/relative/path", "1", "3.1.2", "1.2..3"] {
            let err = corim.add_profile(bad).unwrap_err();
            assert!(
                err.to_string().starts_with("profile should be OID or URI"),
                "{bad}: {err}"
            );
        }

        assert_eq!(corim.profiles.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn test_profile_type_choice_serde() {
        let test_cases = vec![
            SerdeTestCase {
                value: ProfileTypeChoice::from_str("https://a.eu").unwrap(),
                expected_cbor: vec![
                    0xd8, 0x20, // tag(32)
                      0x6d, // tstr(13)
                        0x68, 0x74, 0x74, 0x70, 0x73, 0x3a, 0x2f, 0x2f, 0x61, 0x2e, 0x65, 0x75,
                        0x2f,
                ],
                expected_json: r#""https://a.eu/""#,
            },
            SerdeTestCase {
                value: ProfileTypeChoice::from_str("1.3.6.1.4.1.5").unwrap(),
                expected_cbor: vec![
                    0xd8, 0x6f, // tag(111)
                      0x46, // bstr(6)
                        0x2b, 0x06, 0x01, 0x04, 0x01, 0x05,
                ],
                expected_json: r#""1.3.6.1.4.1.5""#,
            },
        ];

        for tc in test_cases.into_iter() {
            tc.run();
        }

        // an untagged OID is not a profile
        let err = Codec::default()
            .decode_cbor::<ProfileTypeChoice>(&[0x46, 0x2b, 0x06, 0x01, 0x04, 0x01, 0x05])
            .unwrap_err();
        assert!(matches!(err, Error::Codec(_)));
    }

    #[test]
    fn test_corim_locator_map_serde() {
        let test_cases = vec![
            SerdeTestCase {
                value: CorimLocatorMap::new(
                    "https://example.com/rim",
                    Some(HashEntry {
                        hash_alg_id: 6,
                        hash_value: vec![0xde, 0xad, 0xbe, 0xef].into(),
                    }),
                ),
                expected_cbor: vec![
                    0xa2, // map(2)
                      0x00, // key: 0 [href]
                      0xd8, 0x20, // tag(32)
                        0x77, // tstr(23)
                          0x68, 0x74, 0x74, 0x70, 0x73, 0x3a, 0x2f, 0x2f, 0x65, 0x78, 0x61, 0x6d,
                          0x70, 0x6c, 0x65, 0x2e, 0x63, 0x6f, 0x6d, 0x2f, 0x72, 0x69, 0x6d,
                      0x01, // key: 1 [thumbprint]
                      0x82, // array(2)
                        0x06, // sha-256-32
                        0x44, 0xde, 0xad, 0xbe, 0xef,
                ],
                expected_json: r#"{"href":"https://example.com/rim","thumbprint":{"hash-alg-id":6,"hash-value":"3q2+7w=="}}"#,
            },
            SerdeTestCase {
                value: CorimLocatorMap::new("https://a.eu", None),
                expected_cbor: vec![
                    0xa1, // map(1)
                      0x00, // key: 0 [href]
                      0xd8, 0x20, // tag(32)
                        0x6c, // tstr(12)
                          0x68, 0x74, 0x74, 0x70, 0x73, 0x3a, 0x2f, 0x2f, 0x61, 0x2e, 0x65, 0x75,
                ],
                expected_json: r#"{"href":"https://a.eu"}"#,
            },
        ];

        for tc in test_cases.into_iter() {
            tc.run();
        }
    }

    #[test]
    fn test_validity_map() {
        let validity = ValidityMap::new(Some(10), 20);
        validity.valid().unwrap();
        assert!(validity.contains(10));
        assert!(validity.contains(20));
        assert!(!validity.contains(9));
        assert!(!validity.contains(21));
        assert!(ValidityMap::new(None, 20).contains(i64::MIN));

        let mut corim = minimal_corim();
        let err = corim.set_rim_validity(Some(21), 20).unwrap_err();
        assert_eq!(err.to_string(), "not-before 21 is later than not-after 20");
        assert_eq!(corim.rim_validity, None);

        let test_cases = vec![SerdeTestCase {
            value: ValidityMap::new(Some(1), 2),
            expected_cbor: vec![
                0xa2, // map(2)
                  0x00, // key: 0 [not-before]
                  0xc1, 0x01, // tag(1) 1
                  0x01, // key: 1 [not-after]
                  0xc1, 0x02, // tag(1) 2
            ],
            expected_json: r#"{"not-before":1,"not-after":2}"#,
        }];

        for tc in test_cases.into_iter() {
            tc.run();
        }
    }

    #[test]
    fn test_corim_entity_map() {
        let mut corim = minimal_corim();

        let err = corim
            .add_entity("", None, &[CorimRoleTypeChoice::ManifestCreator])
            .unwrap_err();
        assert!(matches!(err, Error::Corim(CorimError::Entity(EntityError::EmptyName))));

        let err = corim
            .add_entity("ACME", Some(""), &[CorimRoleTypeChoice::ManifestCreator])
            .unwrap_err();
        assert!(matches!(err, Error::Corim(CorimError::Entity(EntityError::EmptyRegId))));

        let err = corim.add_entity("ACME", None, &[]).unwrap_err();
        assert!(matches!(err, Error::Corim(CorimError::Entity(EntityError::NoRoles))));
        assert_eq!(corim.entities, None);

        let test_cases = vec![SerdeTestCase {
            value: CorimEntityMap::new(
                "ACME",
                Some(TaggedUri::from("https://a.eu")),
                vec![CorimRoleTypeChoice::ManifestCreator],
            ),
            expected_cbor: vec![
                0xa3, // map(3)
                  0x00, // key: 0 [entity-name]
                  0x64, 0x41, 0x43, 0x4d, 0x45, // "ACME"
                  0x01, // key: 1 [reg-id]
                  0xd8, 0x20, // tag(32)
                    0x6c, 0x68, 0x74, 0x74, 0x70, 0x73, 0x3a, 0x2f, 0x2f, 0x61, 0x2e, 0x65, 0x75,
                  0x02, // key: 2 [role]
                  0x81, 0x01, // [manifest-creator]
            ],
            expected_json: r#"{"entity-name":"ACME","reg-id":"https://a.eu","role":["manifest-creator"]}"#,
        }];

        for tc in test_cases.into_iter() {
            tc.run();
        }

        let err = Codec::default()
            .decode_json::<CorimRoleTypeChoice>(br#""manifest-reader""#)
            .unwrap_err();
        assert!(err.to_string().contains("manifest-reader"));
    }
}

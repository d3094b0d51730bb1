// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::{CoreError, TagKind, Time};

/// Boxed error reported by an embedded sub-manifest's own validator or encoder.
pub type ConciseTagSource = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    #[error("empty tag")]
    Empty,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocatorError {
    #[error("empty href")]
    EmptyHref,
    #[error("invalid locator thumbprint: {0}")]
    InvalidThumbprint(#[source] CoreError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("profile should be OID or URI, got \"{0}\"")]
    NotUriOrOid(String),
    #[error("profile should be OID or URI: {0}")]
    InvalidOid(#[source] CoreError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidityError {
    #[error("not-before {not_before} is later than not-after {not_after}")]
    Inverted { not_before: Time, not_after: Time },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntityError {
    #[error("empty entity-name")]
    EmptyName,
    #[error("empty reg-id")]
    EmptyRegId,
    #[error("no roles")]
    NoRoles,
}

/// Checks performed by [`UnsignedCorim::valid`](crate::corim::UnsignedCorim::valid),
/// in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationCategory {
    Id,
    Tags,
    Tag,
    DependentRim,
    Profile,
    RimValidity,
    Entity,
}

#[derive(Error, Debug)]
pub enum CorimError {
    #[error("empty id")]
    EmptyId,
    #[error("tags validation failed: no tags")]
    NoTags,
    #[error("tag validation failed at pos {position}: {source}")]
    InvalidTag { position: usize, source: TagError },
    #[error("dependent RIM validation failed at pos {position}: {source}")]
    InvalidDependentRim {
        position: usize,
        source: LocatorError,
    },
    #[error("profile validation failed at pos {position}: {source}")]
    InvalidProfile {
        position: usize,
        source: ProfileError,
    },
    #[error("rim-validity validation failed: {0}")]
    InvalidRimValidity(#[source] ValidityError),
    #[error("entity validation failed at pos {position}: {source}")]
    InvalidEntity { position: usize, source: EntityError },

    #[error("invalid corim-id: {0}")]
    InvalidId(String),
    #[error("invalid CoRIM role {0}")]
    InvalidRole(String),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Validity(#[from] ValidityError),
    #[error(transparent)]
    Entity(#[from] EntityError),
    #[error("{kind} validation failed: {source}")]
    InvalidConciseTag {
        kind: TagKind,
        source: ConciseTagSource,
    },
    #[error("{kind} encoding failed: {source}")]
    ConciseTagEncoding {
        kind: TagKind,
        source: ConciseTagSource,
    },
    #[error("{0} field(s) {1} must be set")]
    UnsetMandatoryField(String, String),
}

impl CorimError {
    pub fn invalid_id<D: std::fmt::Display>(message: D) -> Self {
        CorimError::InvalidId(message.to_string())
    }

    pub fn unset_mandatory_field<D: std::fmt::Display>(object: D, field: D) -> Self {
        CorimError::UnsetMandatoryField(object.to_string(), field.to_string())
    }

    /// The validation check that produced this error, if it came from the
    /// structural validator rather than from a builder operation.
    pub fn category(&self) -> Option<ValidationCategory> {
        match self {
            Self::EmptyId => Some(ValidationCategory::Id),
            Self::NoTags => Some(ValidationCategory::Tags),
            Self::InvalidTag { .. } => Some(ValidationCategory::Tag),
            Self::InvalidDependentRim { .. } => Some(ValidationCategory::DependentRim),
            Self::InvalidProfile { .. } => Some(ValidationCategory::Profile),
            Self::InvalidRimValidity(_) => Some(ValidationCategory::RimValidity),
            Self::InvalidEntity { .. } => Some(ValidationCategory::Entity),
            _ => None,
        }
    }

    /// Zero-based index of the offending element within its category.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::InvalidTag { position, .. }
            | Self::InvalidDependentRim { position, .. }
            | Self::InvalidProfile { position, .. }
            | Self::InvalidEntity { position, .. } => Some(*position),
            _ => None,
        }
    }
}

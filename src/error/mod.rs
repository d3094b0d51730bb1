// SPDX-License-Identifier: MIT

mod codec;
mod core;
mod corim;

pub use codec::*;
pub use self::core::*;
pub use corim::*;
use derive_more::From;

#[derive(Debug, From)]
pub enum Error {
    Codec(CodecError),
    Core(CoreError),
    Corim(CorimError),
}

impl Error {
    /// Returns the container error, if this is one.
    pub fn as_corim(&self) -> Option<&CorimError> {
        match self {
            Self::Corim(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProfileError> for Error {
    fn from(value: ProfileError) -> Self {
        Self::Corim(value.into())
    }
}

impl From<ValidityError> for Error {
    fn from(value: ValidityError) -> Self {
        Self::Corim(value.into())
    }
}

impl From<EntityError> for Error {
    fn from(value: EntityError) -> Self {
        Self::Corim(value.into())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Codec(err) => std::error::Error::source(err),
            Self::Core(err) => std::error::Error::source(err),
            Self::Corim(err) => std::error::Error::source(err),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            Self::Codec(err) => write!(f, "{err}"),
            Self::Core(err) => write!(f, "{err}"),
            Self::Corim(err) => write!(f, "{err}"),
        }
    }
}

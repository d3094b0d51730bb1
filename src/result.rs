// SPDX-License-Identifier: MIT

use crate::error::Error;

/// Result type returned by container operations and codecs.
pub type Result<T> = std::result::Result<T, Error>;

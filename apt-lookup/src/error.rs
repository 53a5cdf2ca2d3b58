// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Error handling. */

use thiserror::Error;

/// Primary crate error type.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    #[error("integer parsing error: {0:?}")]
    ParseInt(#[from] std::num::ParseIntError),

    #[error("version error: {0}")]
    Version(#[from] crate::package_version::VersionError),

    #[error("required field missing in package record: {0}")]
    RecordRequiredFieldMissing(&'static str),

    #[error("external index tool did not finish within {0:?}")]
    IndexToolTimeout(std::time::Duration),
}

/// Result wrapper for this crate.
pub type Result<T> = std::result::Result<T, LookupError>;

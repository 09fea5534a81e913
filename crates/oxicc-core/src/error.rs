//! Error types for oxicc

use thiserror::Error;

/// Result type for oxicc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when decoding, encoding or evaluating ICC profiles
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The profile container is malformed at the given byte offset
    #[error("invalid profile (byte {offset}): {reason}")]
    InvalidProfile { offset: usize, reason: &'static str },

    /// A tag element body is truncated or internally inconsistent
    #[error("invalid tag data")]
    InvalidTagData,

    /// A decoder was invoked on a tag element of a different type
    #[error("unexpected tag data type")]
    UnexpectedTagType,

    /// A required tag is absent from the profile
    #[error("missing tag")]
    MissingTag,

    /// `Profile::encode` was called with the version field unset
    #[error("ICC profile version not set")]
    InvalidVersion,

    /// The profile has no recognisable TRC or LUT shape
    #[error("unsupported profile type")]
    UnsupportedProfileType,

    /// No LUT tag exists for the requested intent and direction
    #[error("missing LUT tag")]
    MissingLutTag,

    /// The primary matrix of a matrix/TRC profile is not invertible
    #[error("singular colour matrix")]
    SingularMatrix,
}

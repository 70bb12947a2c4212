//! Error types.

use std::fmt;

/// Result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type.
///
/// Every variant carries a human-readable message; for several BER/DER
/// rules the exact message text is part of this crate's observable
/// contract (see the per-type payload and validation tables in the
/// X.690 mapping this crate implements), so callers should not assume the
/// messages are cosmetic.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// Programmer error at the boundary, e.g. empty input to `decode`.
    InvalidArgument(String),

    /// The input buffer is syntactically consistent so far but incomplete.
    ///
    /// Raised only at the root of a `decode` call; a caller holding a
    /// socket should read more bytes and retry. Nested shortfalls inside
    /// an already-bounded TLV are reported as [`Error::Encoder`] instead.
    PartialPdu(String),

    /// The bytes or the value violate a BER/DER encoding rule.
    Encoder(String),
}

impl Error {
    /// Shorthand for constructing an [`Error::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    /// Shorthand for constructing an [`Error::PartialPdu`].
    pub fn partial_pdu(message: impl Into<String>) -> Self {
        Error::PartialPdu(message.into())
    }

    /// Shorthand for constructing an [`Error::Encoder`].
    pub fn encoder(message: impl Into<String>) -> Self {
        Error::Encoder(message.into())
    }

    /// The message text carried by this error, regardless of kind.
    pub fn message(&self) -> &str {
        match self {
            Error::InvalidArgument(message) => message,
            Error::PartialPdu(message) => message,
            Error::Encoder(message) => message,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(message) => write!(f, "invalid argument: {}", message),
            Error::PartialPdu(message) => write!(f, "partial PDU: {}", message),
            Error::Encoder(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for Error {}

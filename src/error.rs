//! The encoder's error domain (spec.md §6, §7).
//!
//! Three taxonomies collapse into one enum: argument errors, state errors,
//! and resource failures. Resource failures are also what the encoder
//! latches into its sticky "unrecoverable" flag (see `crate::encoder`).

use thiserror::Error;

/// Numeric error codes, matching the C-ABI-flavored domain in spec.md §6.
///
/// Callers that need to cross an FFI boundary can map an [`Error`] to one
/// of these with [`Error::code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Ok = 0,
    BadArg = -11,
    InternalError = -13,
    Unimplemented = -15,
    AllocFail = -17,
    CannotOpen = -30,
    TooLate = -31,
    Unrecoverable = -32,
}

/// Errors returned by public operations on [`crate::Encoder`] and
/// [`crate::packer::OggPacker`].
#[derive(Debug, Error)]
pub enum Error {
    /// A synchronously-rejected bad argument (e.g. negative frame count).
    #[error("bad argument: {0}")]
    BadArg(&'static str),

    /// A request this build does not support.
    #[error("unimplemented: {0}")]
    Unimplemented(&'static str),

    /// A mutation that is no longer legal because the stream's header has
    /// already been frozen.
    #[error("too late: {0}")]
    TooLate(&'static str),

    /// An allocation failed somewhere in the pipeline (packer buffer growth,
    /// staging buffer, etc).
    #[error("allocation failure")]
    AllocFail,

    /// The Opus codec rejected a call.
    #[error("opus codec error: {0}")]
    Codec(#[from] audiopus::Error),

    /// The sink's underlying file could not be opened.
    #[error("cannot open sink: {0}")]
    CannotOpen(#[source] std::io::Error),

    /// A condition the pipeline assumes can never happen actually did.
    #[error("internal error: {0}")]
    Internal(&'static str),

    /// The encoder has latched a prior resource failure and is no longer
    /// usable except for `destroy`.
    #[error("encoder is in an unrecoverable state")]
    Unrecoverable,
}

impl Error {
    /// Translates this error into the numeric domain of spec.md §6.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::BadArg(_) => ErrorCode::BadArg,
            Self::Unimplemented(_) => ErrorCode::Unimplemented,
            Self::TooLate(_) => ErrorCode::TooLate,
            Self::AllocFail => ErrorCode::AllocFail,
            Self::Codec(_) | Self::Internal(_) => ErrorCode::InternalError,
            Self::CannotOpen(_) => ErrorCode::CannotOpen,
            Self::Unrecoverable => ErrorCode::Unrecoverable,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

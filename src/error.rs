//! The error taxonomy this crate surfaces to callers.
//!
//! Each variant names a *kind* of failure, not a wire detail; callers match
//! on the variant to decide whether a connection is still usable
//! ([`Error::is_fatal`]).

/// Errors produced by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The underlying byte stream failed to read or write, or hit EOF.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame or primitive could not be decoded: length mismatch, a
    /// malformed length-encoded integer, or a discard-byte mismatch.
    #[error("codec error: {0}")]
    Codec(String),

    /// A packet arrived that the state machine did not expect: wrong tag,
    /// a missing EOF, a sequence-number mismatch.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server returned an `ERR` packet.
    #[error("server error {code} ({sql_state}): {message}")]
    Server {
        code: u16,
        sql_state: String,
        message: String,
    },

    /// Authentication failed, or the server requested a plugin we do not
    /// support.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Caller misuse: unbound parameter, bad index, invalid limit/offset,
    /// using a disposed handle, re-executing a statement whose rows are
    /// still being drained.
    #[error("usage error: {0}")]
    Usage(String),

    /// A pool-level failure: checkout on a disposed pool, or connection
    /// creation failed.
    #[error("pool error: {0}")]
    Pool(String),

    /// The operation was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn codec(msg: impl Into<String>) -> Self {
        Error::Codec(msg.into())
    }

    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        Error::Protocol(msg.into())
    }

    pub(crate) fn usage(msg: impl Into<String>) -> Self {
        Error::Usage(msg.into())
    }

    /// Whether this error means the connection's protocol alignment is
    /// lost and the [`crate::client::Client`] that produced it must be
    /// shut down.
    ///
    /// `Server` errors are explicitly excluded: the wire stays in sync
    /// after an `ERR` packet.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Io(_) | Error::Codec(_) | Error::Protocol(_))
    }
}

/// A specialized `Result` for this crate.
pub type Result<T> = std::result::Result<T, Error>;

macro_rules! protocol_err {
    ($($arg:tt)*) => {
        $crate::error::Error::protocol(format!($($arg)*))
    };
}

macro_rules! codec_err {
    ($($arg:tt)*) => {
        $crate::error::Error::codec(format!($($arg)*))
    };
}

pub(crate) use codec_err;
pub(crate) use protocol_err;

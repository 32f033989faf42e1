//! Error types and result aliases for keyshard.
//!
//! Every failure in the pipeline is fatal for the run. The variants are grouped into a
//! small number of [`ErrorKind`]s so callers can tell a cancelled run apart from a
//! processing failure without matching on every variant.

use std::fmt;
use std::path::PathBuf;

/// The result type used throughout keyshard.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while partitioning a record stream.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required setting is absent or a present one is malformed.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the bad setting.
        message: String,
    },

    /// The input container stream could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[source] apache_avro::Error),

    /// The input stream decoded to a datum that is not a record.
    #[error("decode error: expected a record datum, found {found}")]
    NotARecord {
        /// Short name of the datum kind that was found.
        found: &'static str,
    },

    /// The primary key field is missing, of an unsupported kind, or malformed.
    #[error("invalid key")]
    InvalidKey,

    /// A filesystem operation failed.
    #[error("io error on {}: {source}", .path.display())]
    Io {
        /// The path the operation targeted.
        path: PathBuf,
        /// The underlying cause.
        #[source]
        source: std::io::Error,
    },

    /// The output container could not be written.
    #[error("encode error: {0}")]
    Encode(#[source] apache_avro::Error),

    /// Several sub-steps of a single write failed.
    #[error("{}", JoinDisplay(.0))]
    Multiple(Vec<Error>),

    /// The run was cancelled.
    #[error("cancelled")]
    Cancelled,

    /// The run's deadline passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Decode,
    InvalidKey,
    Write,
    Cancelled,
}

impl Error {
    /// Creates a new configuration error with the given message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a new filesystem error for `path`.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Combines the errors of several sub-steps into one.
    ///
    /// Returns `None` for an empty list and the sole error unchanged for a list of one.
    #[must_use]
    pub fn join(errors: Vec<Error>) -> Option<Self> {
        let mut errors = errors;
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }

    /// Classifies this error.
    ///
    /// An aggregate is a write failure unless every member is a cancellation.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Config,
            Self::Decode(_) | Self::NotARecord { .. } => ErrorKind::Decode,
            Self::InvalidKey => ErrorKind::InvalidKey,
            Self::Io { .. } | Self::Encode(_) => ErrorKind::Write,
            Self::Multiple(errors) => {
                if !errors.is_empty() && errors.iter().all(Error::is_cancellation) {
                    ErrorKind::Cancelled
                } else {
                    ErrorKind::Write
                }
            }
            Self::Cancelled | Self::DeadlineExceeded => ErrorKind::Cancelled,
        }
    }

    /// Whether the run stopped because its context was cancelled or timed out.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }
}

struct JoinDisplay<'a>(&'a [Error]);

impl fmt::Display for JoinDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

//! All error types for the locflow crate.
//!
//! These are returned from all fallible operations (event-stream validation,
//! skeleton resolution, output writing, pipeline runs, etc.). Programming
//! contract violations inside the coded-text engine panic instead; see the
//! `# Panics` sections in [`crate::fragment`].

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// An event stream broke the document grammar (e.g. END_GROUP without a
    /// matching START_GROUP). Fatal for the current document.
    #[error("structural violation: {0}")]
    Structure(String),

    /// A character cannot be represented in the requested output encoding and
    /// the output path offers no escape for it.
    #[error("cannot encode {character:?} as {encoding}")]
    Encoding { character: char, encoding: String },

    /// The requested encoding name is not recognized.
    #[error("unknown encoding `{0}`")]
    UnknownEncoding(String),

    /// I/O error, wrapped from std.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A language tag failed BCP-47 validation.
    #[error("invalid locale tag `{0}`")]
    Locale(String),

    /// Parameter data could not be parsed or serialized.
    #[error("parameter error: {0}")]
    Parameters(#[from] serde_json::Error),

    /// No filter or writer is registered under the configuration key.
    #[error("unknown configuration key `{0}`")]
    UnknownConfiguration(String),

    /// A skeleton part referenced a resource the writer has not seen.
    #[error("unresolved reference to resource `{0}`")]
    MissingReferent(String),

    /// An event did not carry the resource kind the caller asked for.
    #[error("unexpected resource: expected {expected}, found {found}")]
    UnexpectedResource {
        expected: &'static str,
        found: &'static str,
    },

    /// A filter failed while producing events.
    #[error("filter error: {0}")]
    Filter(String),

    /// A pipeline step failed while handling an event.
    #[error("step `{step}` failed: {message}")]
    Step { step: String, message: String },
}

impl Error {
    /// Creates a new structural-violation error.
    pub fn structure(message: impl Into<String>) -> Self {
        Error::Structure(message.into())
    }

    /// Creates a new filter error.
    pub fn filter(message: impl Into<String>) -> Self {
        Error::Filter(message.into())
    }

    /// Creates a new step error.
    pub fn step(step: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Step {
            step: step.into(),
            message: message.into(),
        }
    }
}

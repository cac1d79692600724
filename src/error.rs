//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum BrambleError {
    /// Unknown parameters were sent to an agent configuration.
    ///
    /// This is a caller error and is raised eagerly, before any training
    /// happens.
    #[error("Unknown parameters sent to agent: {0:?}")]
    UnknownParams(Vec<String>),

    /// The operation is not implemented by the agent.
    ///
    /// Distinct from runtime failures so that callers can tell
    /// "unsupported" apart from "broken".
    #[error("agent.{0}() is not implemented")]
    Unsupported(&'static str),

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}

//! Error types for hacceptance.

use std::time::Duration;

/// Result type alias using HarnessError.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors that fail a scripted run.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// The pty, console or target process could not be set up.
    #[error("Setup failed: {0}")]
    Setup(String),

    /// The session recorder is not on the executable search path.
    #[error("{program} must be installed to record sessions: {source}")]
    RecorderNotFound {
        /// Recorder program that was looked up.
        program: String,
        /// Lookup failure.
        source: which::Error,
    },

    /// Expected content did not appear before the timeout.
    #[error("Failed to find [{criteria:?}] in {buffer:?} after {timeout:?}")]
    MatchTimeout {
        /// The unmatched expectation.
        criteria: String,
        /// ANSI-stripped output observed while waiting.
        buffer: String,
        /// How long we waited.
        timeout: Duration,
    },

    /// The process closed its output before the expected content appeared.
    #[error("Output ended before [{criteria:?}] appeared; unmatched output: {buffer:?}")]
    StreamClosed {
        /// The unmatched expectation.
        criteria: String,
        /// ANSI-stripped output left after the last match.
        buffer: String,
    },

    /// Reading terminal output failed while waiting for content.
    #[error("Error occurred while matching {criteria:?}: {message}")]
    Read {
        /// The expectation being matched.
        criteria: String,
        /// Underlying read error.
        message: String,
    },

    /// Writing input to the console failed.
    #[error("Failed to send {payload:?}: {source}")]
    Send {
        /// Bytes we tried to send.
        payload: String,
        /// Underlying write error.
        source: std::io::Error,
    },

    /// Only part of the input reached the console.
    #[error("Only sent {sent} of {expected} bytes for {payload:?}")]
    ShortWrite {
        /// Bytes we tried to send.
        payload: String,
        /// Bytes actually written.
        sent: usize,
        /// Bytes requested.
        expected: usize,
    },

    /// A step needs a running session but no invocation preceded it.
    #[error("No session is running for step: {step}")]
    NoSession {
        /// Description of the step.
        step: String,
    },

    /// A second invocation was issued while a session is open.
    #[error("A session is already running; cannot invoke {cmd:?}")]
    SessionAlreadyOpen {
        /// Command of the rejected invocation.
        cmd: String,
    },

    /// Invalid or unreadable configuration.
    #[error("Config error: {0}")]
    Config(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Problems while tearing a session down.
///
/// These are reported but never fail a run.
#[derive(Debug, thiserror::Error)]
pub enum TeardownError {
    /// Sending the terminate signal failed.
    #[error("Failed to signal process {pid}: {message}")]
    Signal {
        /// Target process id.
        pid: u32,
        /// Underlying error.
        message: String,
    },

    /// Force-killing the process failed.
    #[error("Failed to kill process: {0}")]
    Kill(std::io::Error),

    /// Polling or reaping the process failed.
    #[error("Failed to wait for process: {0}")]
    Wait(std::io::Error),
}

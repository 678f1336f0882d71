//! Failure reporting sinks.
//!
//! The driver stops at the first failing step and hands the error to a
//! [`Reporter`]. Diagnostics that should not fail the run (teardown problems,
//! recording locations) go through [`Reporter::log`].

use crate::error::HarnessError;

/// Destination for run diagnostics and the first failure.
pub trait Reporter: Send + Sync {
    /// Record an informational message.
    fn log(&self, message: &str);

    /// Report the failure that halted the run.
    fn fail(&self, error: &HarnessError);
}

/// Reports through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn log(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn fail(&self, error: &HarnessError) {
        tracing::error!(%error, "script failed");
    }
}

/// Sink for use inside `#[test]` functions: failures panic, failing the test.
#[derive(Debug, Default, Clone, Copy)]
pub struct PanicReporter;

impl Reporter for PanicReporter {
    fn log(&self, message: &str) {
        eprintln!("{message}");
    }

    fn fail(&self, error: &HarnessError) {
        panic!("{error}");
    }
}

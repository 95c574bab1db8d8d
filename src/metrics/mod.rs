use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::error;

use crate::errors::AppError;

/// Sink for failures that should be recorded even though they are also
/// returned to the caller
pub trait ErrorReporter: Send + Sync {
    fn report(&self, operation: &str, error: &AppError);
}

/// Error reporter backed by structured logging
#[derive(Clone, Default)]
pub struct TracingErrorReporter {
    // Surfaced by the health endpoint
    reported: Arc<AtomicU64>,
}

impl TracingErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of errors reported since startup
    pub fn reported_count(&self) -> u64 {
        self.reported.load(Ordering::Relaxed)
    }
}

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, operation: &str, err: &AppError) {
        let total = self.reported.fetch_add(1, Ordering::Relaxed) + 1;
        error!(
            operation = %operation,
            error = %err,
            constraint_violation = err.is_constraint_violation(),
            reported_total = total,
            "Operation failed"
        );
    }
}

/// Reporter that keeps the reported messages, for assertions
#[cfg(test)]
#[derive(Default)]
pub struct RecordingErrorReporter {
    reports: std::sync::Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
impl RecordingErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(operation, error message)` pairs in report order
    pub fn reports(&self) -> Vec<(String, String)> {
        self.reports
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
impl ErrorReporter for RecordingErrorReporter {
    fn report(&self, operation: &str, err: &AppError) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push((operation.to_string(), err.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_reporter_counts() {
        let reporter = TracingErrorReporter::new();
        let clone = reporter.clone();
        reporter.report("create_visitor", &AppError::not_found("visitor", "boom"));
        clone.report("create_visitor", &AppError::not_found("visitor", "again"));
        assert_eq!(reporter.reported_count(), 2);
    }

    #[test]
    fn test_recording_reporter_keeps_messages() {
        let reporter = RecordingErrorReporter::new();
        reporter.report("create_visitor", &AppError::not_found("visitor", "boom"));
        assert_eq!(
            reporter.reports(),
            vec![(
                "create_visitor".to_string(),
                "Not found: visitor with id boom".to_string()
            )]
        );
    }
}

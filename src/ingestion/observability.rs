use std::fmt;
use std::sync::Arc;

use crate::error::ReportError;

use super::unified::PayloadFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (the payload could not be ingested).
    Error,
    /// Critical error (I/O and other infrastructure failures).
    Critical,
}

/// Context about an ingestion attempt.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    /// Where the payload came from (a path, or a caller-supplied label for in-memory bytes).
    pub source: String,
    /// Format used for ingestion.
    pub format: PayloadFormat,
}

/// Stats reported on successful ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    /// Number of ingested rows.
    pub rows: usize,
    /// Payload size in bytes before decompression.
    pub bytes: usize,
}

/// Observer interface for ingestion outcomes.
pub trait IngestionObserver: Send + Sync {
    /// Called when ingestion succeeds.
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    /// Called when ingestion fails.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &ReportError) {}

    /// Called when an ingestion failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &ReportError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &ReportError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &ReportError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs ingestion events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl IngestionObserver for StdErrObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        eprintln!(
            "[ingest][ok] format={:?} source={} rows={} bytes={}",
            ctx.format, ctx.source, stats.rows, stats.bytes
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &ReportError) {
        eprintln!(
            "[ingest][{:?}] format={:?} source={} err={}",
            severity, ctx.format, ctx.source, error
        );
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &ReportError) {
        eprintln!(
            "[ALERT][ingest][{:?}] format={:?} source={} err={}",
            severity, ctx.format, ctx.source, error
        );
    }
}

/// Emits ingestion events as `tracing` events (target `ads_report_processing::ingestion`).
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        tracing::info!(
            source = %ctx.source,
            format = ?ctx.format,
            rows = stats.rows,
            bytes = stats.bytes,
            "report payload ingested"
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &ReportError) {
        tracing::warn!(
            source = %ctx.source,
            format = ?ctx.format,
            ?severity,
            %error,
            "report payload ingestion failed"
        );
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &ReportError) {
        tracing::error!(
            source = %ctx.source,
            format = ?ctx.format,
            ?severity,
            %error,
            "report payload ingestion alert"
        );
    }
}

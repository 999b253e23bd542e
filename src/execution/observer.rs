use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Which transformation an engine run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Derive,
    Project,
    /// Derive and project in a single pass.
    Process,
}

/// Execution events emitted by the engine.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted { stage: Stage, rows: usize },
    ChunkStarted { index: usize, row_count: usize },
    ChunkFinished { index: usize, output_rows: usize },
    RunFinished {
        stage: Stage,
        elapsed: Duration,
        metrics: ExecutionMetricsSnapshot,
    },
}

/// Observer hook for execution events.
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

/// Forwards execution events to `tracing`: chunk events at `trace`, runs at `debug`/`info`.
#[derive(Debug, Default)]
pub struct TracingExecutionObserver;

impl ExecutionObserver for TracingExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::RunStarted { stage, rows } => {
                tracing::debug!(?stage, rows, "transform run started");
            }
            ExecutionEvent::ChunkStarted { index, row_count } => {
                tracing::trace!(index, row_count, "chunk started");
            }
            ExecutionEvent::ChunkFinished { index, output_rows } => {
                tracing::trace!(index, output_rows, "chunk finished");
            }
            ExecutionEvent::RunFinished {
                stage,
                elapsed,
                metrics,
            } => {
                tracing::info!(?stage, ?elapsed, %metrics, "transform run finished");
            }
        }
    }
}

/// Real-time metrics for an execution run.
///
/// The engine updates these counters during execution; callers can snapshot them at any time.
pub struct ExecutionMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,

    rows_processed: AtomicU64,
    chunks_started: AtomicU64,
    chunks_finished: AtomicU64,

    active_chunks: AtomicUsize,
    max_active_chunks: AtomicUsize,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self {
            run_id: AtomicU64::new(0),
            elapsed_ns: AtomicU64::new(0),
            rows_processed: AtomicU64::new(0),
            chunks_started: AtomicU64::new(0),
            chunks_finished: AtomicU64::new(0),
            active_chunks: AtomicUsize::new(0),
            max_active_chunks: AtomicUsize::new(0),
        }
    }

    pub(crate) fn begin_run(&self) {
        self.run_id.fetch_add(1, Ordering::SeqCst);
        self.elapsed_ns.store(0, Ordering::SeqCst);
        self.rows_processed.store(0, Ordering::SeqCst);
        self.chunks_started.store(0, Ordering::SeqCst);
        self.chunks_finished.store(0, Ordering::SeqCst);
        self.active_chunks.store(0, Ordering::SeqCst);
        self.max_active_chunks.store(0, Ordering::SeqCst);
    }

    pub(crate) fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns
            .store(elapsed.as_nanos().min(u64::MAX as u128) as u64, Ordering::SeqCst);
    }

    pub(crate) fn on_rows_processed(&self, n: usize) {
        self.rows_processed.fetch_add(n as u64, Ordering::SeqCst);
    }

    pub(crate) fn on_chunk_start(&self) {
        self.chunks_started.fetch_add(1, Ordering::SeqCst);
        let now = self.active_chunks.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_chunks.fetch_max(now, Ordering::SeqCst);
    }

    pub(crate) fn on_chunk_end(&self) {
        self.chunks_finished.fetch_add(1, Ordering::SeqCst);
        self.active_chunks.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        ExecutionMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed: (elapsed_ns > 0).then(|| Duration::from_nanos(elapsed_ns)),
            rows_processed: self.rows_processed.load(Ordering::SeqCst),
            chunks_started: self.chunks_started.load(Ordering::SeqCst),
            chunks_finished: self.chunks_finished.load(Ordering::SeqCst),
            max_active_chunks: self.max_active_chunks.load(Ordering::SeqCst),
        }
    }
}

impl Default for ExecutionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable snapshot of [`ExecutionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    pub rows_processed: u64,
    pub chunks_started: u64,
    pub chunks_finished: u64,
    pub max_active_chunks: usize,
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, rows_processed={}, chunks={}/{}, max_active_chunks={}, elapsed={:?}",
            self.run_id,
            self.rows_processed,
            self.chunks_finished,
            self.chunks_started,
            self.max_active_chunks,
            self.elapsed
        )
    }
}

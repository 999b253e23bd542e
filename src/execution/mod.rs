//! Row-parallel execution of the transformation stages.
//!
//! Rows are independent, so derivation and projection can run across a rayon thread pool.
//! The engine splits a dataset into fixed-size chunks, transforms chunks in parallel, and
//! reassembles the output in the original row order. It also provides:
//!
//! - Real-time metrics ([`ExecutionMetrics`])
//! - Observer hooks for monitoring ([`ExecutionObserver`])

mod observer;

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;

use crate::catalog::ProductTypeConfig;
use crate::error::{ConfigError, ReportResult};
use crate::processing::{derive_row, ColumnRule, RenameSchema};
use crate::types::{ReportDataset, Row};

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, Stage,
    TracingExecutionObserver,
};

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Number of rows per chunk.
    pub chunk_size: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            num_threads: None,
            chunk_size: 1_024,
        }
    }
}

/// A configurable execution engine for report transformations.
pub struct ExecutionEngine {
    pool: ThreadPool,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidOption`] if `chunk_size == 0` or `num_threads == Some(0)`, or a
    /// thread pool error if the pool cannot be built.
    pub fn new(opts: ExecutionOptions) -> ReportResult<Self> {
        if opts.chunk_size == 0 {
            return Err(ConfigError::InvalidOption {
                message: "chunk_size must be > 0".to_string(),
            }
            .into());
        }
        if opts.num_threads == Some(0) {
            return Err(ConfigError::InvalidOption {
                message: "num_threads must be > 0 when set".to_string(),
            }
            .into());
        }

        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));
        let pool = ThreadPoolBuilder::new().num_threads(n_threads).build()?;

        Ok(Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        })
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Parallel [`crate::processing::derive_columns`].
    pub fn derive_parallel(&self, dataset: ReportDataset, rules: &[ColumnRule]) -> ReportDataset {
        self.run(Stage::Derive, dataset, &|row| derive_row(row, rules))
    }

    /// Parallel [`crate::processing::project_columns`].
    pub fn project_parallel(&self, dataset: ReportDataset, schema: &RenameSchema) -> ReportDataset {
        self.run(Stage::Project, dataset, &|row| schema.project_row(&row))
    }

    /// Parallel [`crate::processing::process_with_config`]: derive and project each row in one
    /// pass.
    pub fn process_parallel(&self, dataset: ReportDataset, config: &ProductTypeConfig) -> ReportDataset {
        self.run(Stage::Process, dataset, &|row| {
            config.schema.project_row(&derive_row(row, &config.rules))
        })
    }

    fn run(
        &self,
        stage: Stage,
        dataset: ReportDataset,
        transform: &(dyn Fn(Row) -> Row + Send + Sync),
    ) -> ReportDataset {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(ExecutionEvent::RunStarted {
            stage,
            rows: dataset.row_count(),
        });

        let chunks = into_chunks(dataset.rows, self.opts.chunk_size);
        let per_chunk: Vec<Vec<Row>> = self.pool.install(|| {
            chunks
                .into_par_iter()
                .enumerate()
                .map(|(index, chunk)| {
                    self.metrics.on_chunk_start();
                    self.emit(ExecutionEvent::ChunkStarted {
                        index,
                        row_count: chunk.len(),
                    });

                    let out: Vec<Row> = chunk.into_iter().map(transform).collect();

                    self.metrics.on_rows_processed(out.len());
                    self.emit(ExecutionEvent::ChunkFinished {
                        index,
                        output_rows: out.len(),
                    });
                    self.metrics.on_chunk_end();
                    out
                })
                .collect()
        });

        let out = ReportDataset::new(per_chunk.into_iter().flatten().collect());

        self.metrics.end_run(start.elapsed());
        self.emit(ExecutionEvent::RunFinished {
            stage,
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });
        out
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

fn into_chunks(rows: Vec<Row>, chunk_size: usize) -> Vec<Vec<Row>> {
    let mut chunks = Vec::with_capacity(rows.len().div_ceil(chunk_size));
    let mut iter = rows.into_iter();
    loop {
        let chunk: Vec<Row> = iter.by_ref().take(chunk_size).collect();
        if chunk.is_empty() {
            break;
        }
        chunks.push(chunk);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::{ExecutionEngine, ExecutionOptions};
    use crate::catalog::{ProductCatalog, ProductType};
    use crate::error::{ConfigError, ReportError};
    use crate::execution::{ExecutionEvent, ExecutionObserver};
    use crate::processing::{process_with_config, ColumnRule};
    use crate::types::{ReportDataset, Row, Value};

    fn dataset_of_n(n: usize) -> ReportDataset {
        (0..n as i64)
            .map(|i| {
                [
                    ("id", Value::Int64(i)),
                    ("clicks", Value::Int64(i % 7)),
                    ("impressions", Value::Int64(i % 5)),
                    ("cost", Value::Float64(i as f64 * 0.5)),
                ]
                .into_iter()
                .collect::<Row>()
            })
            .collect()
    }

    fn engine(threads: usize, chunk_size: usize) -> ExecutionEngine {
        ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(threads),
            chunk_size,
        })
        .unwrap()
    }

    #[test]
    fn derive_parallel_preserves_row_order() {
        let ds = dataset_of_n(1_000);
        let rules = vec![ColumnRule::ratio("CTR", "clicks", "impressions")];
        let out = engine(4, 7).derive_parallel(ds, &rules);

        assert_eq!(out.row_count(), 1_000);
        for (i, row) in out.rows.iter().enumerate() {
            assert_eq!(row.get("id"), Some(&Value::Int64(i as i64)));
        }
    }

    #[test]
    fn process_parallel_matches_sequential_pipeline() {
        let config = ProductCatalog::builtin()
            .get(ProductType::SponsoredBrands)
            .unwrap();
        let sequential = process_with_config(dataset_of_n(333), config);
        let parallel = engine(3, 10).process_parallel(dataset_of_n(333), config);
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn metrics_are_available_after_run() {
        let engine = engine(2, 10);
        let metrics = engine.metrics();
        let out = engine.project_parallel(
            dataset_of_n(95),
            &crate::processing::RenameSchema::new().with("id", "ID"),
        );

        assert_eq!(out.row_count(), 95);
        let snap = metrics.snapshot();
        assert_eq!(snap.run_id, 1);
        assert_eq!(snap.rows_processed, 95);
        assert_eq!(snap.chunks_started, 10);
        assert_eq!(snap.chunks_finished, 10);
        assert!(snap.max_active_chunks >= 1);
        assert!(snap.elapsed.is_some());
    }

    #[derive(Default)]
    struct CountingObserver {
        chunks: AtomicUsize,
        runs: AtomicUsize,
    }

    impl ExecutionObserver for CountingObserver {
        fn on_event(&self, event: &ExecutionEvent) {
            match event {
                ExecutionEvent::ChunkFinished { .. } => {
                    self.chunks.fetch_add(1, Ordering::SeqCst);
                }
                ExecutionEvent::RunFinished { .. } => {
                    self.runs.fetch_add(1, Ordering::SeqCst);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn observer_sees_every_chunk() {
        let observer = Arc::new(CountingObserver::default());
        let obs_trait: Arc<dyn ExecutionObserver> = observer.clone();
        let engine = engine(4, 3).with_observer(obs_trait);

        let _ = engine.derive_parallel(dataset_of_n(10), &[]);

        assert_eq!(observer.chunks.load(Ordering::SeqCst), 4);
        assert_eq!(observer.runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_dataset_runs_without_chunks() {
        let engine = engine(2, 8);
        let out = engine.derive_parallel(ReportDataset::default(), &[]);
        assert!(out.is_empty());
        assert_eq!(engine.metrics().snapshot().chunks_started, 0);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let zero_chunk = ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(1),
            chunk_size: 0,
        });
        assert!(matches!(
            zero_chunk,
            Err(ReportError::Config(ConfigError::InvalidOption { .. }))
        ));

        let zero_threads = ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(0),
            chunk_size: 1,
        });
        assert!(zero_threads.is_err());
    }
}

//! Unified ingestion entrypoint.
//!
//! Most callers should use [`ingest_from_bytes`] (for downloaded report bodies) or
//! [`ingest_from_path`], which decode a payload into a [`crate::types::ReportDataset`].
//!
//! - If [`IngestionOptions::format`] is `None`, the format is inferred from the file name, or
//!   sniffed from the bytes: gzip magic, then `[`/`{` for JSON, then a comma-only header line
//!   for CSV, otherwise TSV. Gzip payloads are sniffed from a decompressed prefix.
//! - If an [`super::observability::IngestionObserver`] is provided, success/failure/alerts are
//!   reported to it.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{ReportError, ReportResult};
use crate::types::ReportDataset;

use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::{delimited, gzip, json};

/// Supported report payload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// JSON array-of-objects or NDJSON.
    Json,
    /// Gzip-compressed JSON (Ads API `GZIP_JSON`).
    GzipJson,
    /// Tab-separated flat file (SP-API flat-file reports).
    Tsv,
    /// Gzip-compressed tab-separated flat file.
    GzipTsv,
    /// Comma-separated values.
    Csv,
    /// Gzip-compressed comma-separated values.
    GzipCsv,
}

impl PayloadFormat {
    /// Infer the format from a file name (case-insensitive).
    pub fn from_file_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        let (stem, gzipped) = match name.strip_suffix(".gz") {
            Some(stem) => (stem, true),
            None => (name.as_str(), false),
        };
        let ext = stem.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
        match (ext, gzipped) {
            ("json" | "ndjson", false) => Some(Self::Json),
            ("tsv" | "txt", false) => Some(Self::Tsv),
            ("csv", false) => Some(Self::Csv),
            ("tsv" | "txt", true) => Some(Self::GzipTsv),
            ("csv", true) => Some(Self::GzipCsv),
            (_, true) => Some(Self::GzipJson),
            _ => None,
        }
    }

    /// Sniff the format from the payload bytes.
    pub fn sniff(bytes: &[u8]) -> ReportResult<Self> {
        if gzip::is_gzip(bytes) {
            let head = gzip::decompress_prefix(bytes, SNIFF_LIMIT)?;
            return Ok(match Self::sniff_plain(&head) {
                Self::Json => Self::GzipJson,
                Self::Csv => Self::GzipCsv,
                _ => Self::GzipTsv,
            });
        }
        Ok(Self::sniff_plain(bytes))
    }

    fn sniff_plain(bytes: &[u8]) -> Self {
        if looks_like_json(bytes) {
            Self::Json
        } else if looks_like_csv(bytes) {
            Self::Csv
        } else {
            Self::Tsv
        }
    }
}

/// Decompressed bytes inspected when sniffing a gzip payload.
const SNIFF_LIMIT: u64 = 4096;

fn looks_like_json(bytes: &[u8]) -> bool {
    matches!(
        bytes.iter().find(|b| !b.is_ascii_whitespace()),
        Some(b'[' | b'{')
    )
}

/// Header line has commas and no tabs.
fn looks_like_csv(bytes: &[u8]) -> bool {
    let header = bytes.split(|&b| b == b'\n').next().unwrap_or_default();
    header.contains(&b',') && !header.contains(&b'\t')
}

/// Options controlling unified ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// If `None`, infer the format from the file name or sniff the bytes.
    pub format: Option<PayloadFormat>,
    /// Dot path of the record array inside a JSON envelope (e.g. `salesAndTrafficByAsin`).
    pub records_path: Option<String>,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("records_path", &self.records_path)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            records_path: None,
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Ingest a report file.
///
/// ```no_run
/// use ads_report_processing::ingestion::{ingest_from_path, IngestionOptions};
///
/// # fn main() -> Result<(), ads_report_processing::ReportError> {
/// // `.json.gz` selects gzip + JSON decoding.
/// let ds = ingest_from_path("sb-search-term.json.gz", &IngestionOptions::default())?;
/// println!("rows={}", ds.row_count());
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path(path: impl AsRef<Path>, options: &IngestionOptions) -> ReportResult<ReportDataset> {
    let path = path.as_ref();
    let source = path.display().to_string();
    let format = options.format.or_else(|| {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(PayloadFormat::from_file_name)
    });

    match std::fs::read(path) {
        Ok(bytes) => ingest_from_bytes(&bytes, &source, &IngestionOptions { format, ..options.clone() }),
        Err(e) => {
            let ctx = IngestionContext {
                source,
                format: format.unwrap_or(PayloadFormat::Json),
            };
            let result = Err(ReportError::from(e));
            report_outcome(options, &ctx, 0, &result);
            result
        }
    }
}

/// Ingest an in-memory report body. `source` labels the payload in observer callbacks.
///
/// ```rust
/// use ads_report_processing::ingestion::{ingest_from_bytes, IngestionOptions};
/// use ads_report_processing::types::Value;
///
/// let body = br#"[{"date":"2024-06-01","clicks":5}]"#;
/// let ds = ingest_from_bytes(body, "inline", &IngestionOptions::default()).unwrap();
/// assert_eq!(ds.rows[0].get("clicks"), Some(&Value::Int64(5)));
/// ```
pub fn ingest_from_bytes(
    bytes: &[u8],
    source: &str,
    options: &IngestionOptions,
) -> ReportResult<ReportDataset> {
    let format = match options.format {
        Some(f) => Ok(f),
        None => PayloadFormat::sniff(bytes),
    };
    let ctx = IngestionContext {
        source: source.to_string(),
        format: format.as_ref().copied().unwrap_or(PayloadFormat::Json),
    };

    let result = format.and_then(|f| decode(bytes, f, options.records_path.as_deref()));
    report_outcome(options, &ctx, bytes.len(), &result);
    result
}

fn decode(bytes: &[u8], format: PayloadFormat, records_path: Option<&str>) -> ReportResult<ReportDataset> {
    match format {
        PayloadFormat::Json => json::ingest_json_from_str(utf8(bytes)?, records_path),
        PayloadFormat::GzipJson => {
            let inner = gzip::maybe_decompress(bytes)?;
            json::ingest_json_from_str(utf8(&inner)?, records_path)
        }
        PayloadFormat::Tsv => delimited::ingest_delimited_from_bytes(bytes, b'\t'),
        PayloadFormat::GzipTsv => delimited::ingest_delimited_from_bytes(&gzip::maybe_decompress(bytes)?, b'\t'),
        PayloadFormat::Csv => delimited::ingest_delimited_from_bytes(bytes, b','),
        PayloadFormat::GzipCsv => delimited::ingest_delimited_from_bytes(&gzip::maybe_decompress(bytes)?, b','),
    }
}

fn utf8(bytes: &[u8]) -> ReportResult<&str> {
    std::str::from_utf8(bytes).map_err(|e| ReportError::InvalidPayload {
        message: format!("payload is not valid utf-8: {e}"),
    })
}

fn report_outcome(
    options: &IngestionOptions,
    ctx: &IngestionContext,
    bytes: usize,
    result: &ReportResult<ReportDataset>,
) {
    let Some(obs) = options.observer.as_ref() else {
        return;
    };
    match result {
        Ok(ds) => obs.on_success(
            ctx,
            IngestionStats {
                rows: ds.row_count(),
                bytes,
            },
        ),
        Err(e) => {
            let sev = severity_for_error(e);
            obs.on_failure(ctx, sev, e);
            if sev >= options.alert_at_or_above {
                obs.on_alert(ctx, sev, e);
            }
        }
    }
}

fn severity_for_error(e: &ReportError) -> IngestionSeverity {
    match e {
        ReportError::Io(_) => IngestionSeverity::Critical,
        ReportError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => IngestionSeverity::Critical,
            _ => IngestionSeverity::Error,
        },
        _ => IngestionSeverity::Error,
    }
}

//! One report run: which product, which day, and how the payload is decoded.
//!
//! A [`ReportJob`] carries everything a run needs explicitly, so the same process can produce
//! several reports (or re-run a past day) without touching global state.
//!
//! Without an explicit report date, "today" is the calendar date in the job's
//! [`ReportTimeZone`] (US Pacific by default, where Amazon Ads rolls its reporting day), not
//! the host's local zone.
//!
//! ```rust
//! use ads_report_processing::catalog::ProductType;
//! use ads_report_processing::job::ReportJob;
//! use chrono::NaiveDate;
//!
//! let job = ReportJob::new(ProductType::SponsoredProducts)
//!     .with_report_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
//!
//! let out = job
//!     .run_payload(br#"[{"campaignName":"Brand","clicks":4,"purchases7d":1}]"#)
//!     .unwrap();
//! assert_eq!(job.file_name(), "SP 2024-06-01.xlsx");
//! assert_eq!(out.rows[0].get("Date").unwrap().to_string(), "2024-06-01");
//! assert_eq!(out.rows[0].get("7 Day Conversion Rate").unwrap().to_string(), "0.25");
//! ```

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, TimeDelta, Utc, Weekday};

use crate::catalog::{ProductCatalog, ProductType};
use crate::error::ReportResult;
use crate::ingestion::{ingest_from_bytes, IngestionOptions};
use crate::types::{ReportDataset, Value};

/// Field stamped on rows that do not carry their own report date.
pub const DATE_FIELD: &str = "date";

/// The report date for a run on `today`: `lag_days` earlier.
///
/// Saturates at [`NaiveDate::MIN`].
pub fn report_date_for(today: NaiveDate, lag_days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(lag_days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Time zone whose calendar date is "today" for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportTimeZone {
    /// `America/Los_Angeles`: UTC-8, or UTC-7 under US daylight saving time.
    #[default]
    UsPacific,
    Fixed(FixedOffset),
}

impl ReportTimeZone {
    /// Calendar date in this zone at instant `now`.
    pub fn date_at(&self, now: DateTime<Utc>) -> NaiveDate {
        match self {
            ReportTimeZone::UsPacific => {
                let hours = if us_daylight_saving(now) { 7 } else { 8 };
                (now.naive_utc() - TimeDelta::hours(hours)).date()
            }
            ReportTimeZone::Fixed(offset) => now.with_timezone(offset).date_naive(),
        }
    }
}

/// US daylight saving: from 02:00 local on the second Sunday of March until 02:00 local on the
/// first Sunday of November. In Pacific time those instants are 10:00 and 09:00 UTC.
fn us_daylight_saving(now: DateTime<Utc>) -> bool {
    let switch = |month, nth, utc_hour| {
        NaiveDate::from_weekday_of_month_opt(now.year(), month, Weekday::Sun, nth)
            .and_then(|day| day.and_hms_opt(utc_hour, 0, 0))
            .map(|at| at.and_utc())
    };
    match (switch(3, 2, 10), switch(11, 1, 9)) {
        (Some(start), Some(end)) => start <= now && now < end,
        _ => false,
    }
}

/// Explicit configuration for a single report run.
#[derive(Debug, Clone)]
pub struct ReportJob {
    pub product_type: ProductType,
    /// Day the report covers. If `None`, derived from today's date in `time_zone` and the
    /// product's lag.
    pub report_date: Option<NaiveDate>,
    pub time_zone: ReportTimeZone,
    pub ingestion: IngestionOptions,
    /// Overrides [`ProductCatalog::builtin`].
    pub catalog: Option<ProductCatalog>,
}

impl ReportJob {
    /// A job using the built-in catalog and the product's default payload layout.
    pub fn new(product_type: ProductType) -> Self {
        Self {
            product_type,
            report_date: None,
            time_zone: ReportTimeZone::default(),
            ingestion: IngestionOptions {
                records_path: product_type.records_path().map(str::to_string),
                ..Default::default()
            },
            catalog: None,
        }
    }

    pub fn with_report_date(mut self, date: NaiveDate) -> Self {
        self.report_date = Some(date);
        self
    }

    pub fn with_time_zone(mut self, time_zone: ReportTimeZone) -> Self {
        self.time_zone = time_zone;
        self
    }

    pub fn with_ingestion(mut self, ingestion: IngestionOptions) -> Self {
        self.ingestion = ingestion;
        self
    }

    pub fn with_catalog(mut self, catalog: ProductCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// The configured report date, or the default for a run now.
    pub fn report_date(&self) -> NaiveDate {
        self.report_date_at(Utc::now())
    }

    /// The configured report date, or the default for a run at instant `now`.
    pub fn report_date_at(&self, now: DateTime<Utc>) -> NaiveDate {
        self.report_date.unwrap_or_else(|| {
            report_date_for(self.time_zone.date_at(now), self.product_type.report_lag_days())
        })
    }

    /// Output file name, e.g. `SB 2024-06-01.xlsx`.
    pub fn file_name(&self) -> String {
        self.product_type.file_name(self.report_date())
    }

    /// Worksheet name for XLSX output.
    pub fn tab_name(&self) -> &'static str {
        self.product_type.tab_name()
    }

    fn catalog(&self) -> &ProductCatalog {
        match &self.catalog {
            Some(catalog) => catalog,
            None => ProductCatalog::builtin(),
        }
    }

    /// Stamp the report date on rows without one, then derive and project.
    pub fn run(&self, dataset: ReportDataset) -> ReportResult<ReportDataset> {
        let date = self.report_date();
        let rows_in = dataset.row_count();
        tracing::info!(
            product = %self.product_type,
            report_date = %date,
            rows = rows_in,
            "processing report"
        );

        let stamp = Value::Utf8(date.format("%Y-%m-%d").to_string());
        let dataset = dataset.map_rows(|mut row| {
            if !row.contains_key(DATE_FIELD) {
                row.insert(DATE_FIELD, stamp.clone());
            }
            row
        });

        let out = self.catalog().process(dataset, self.product_type)?;
        tracing::debug!(
            product = %self.product_type,
            rows = out.row_count(),
            columns = out.column_names().len(),
            "report processed"
        );
        Ok(out)
    }

    /// Decode a downloaded report body with [`Self::ingestion`], then [`Self::run`] it.
    pub fn run_payload(&self, bytes: &[u8]) -> ReportResult<ReportDataset> {
        let source = self.file_name();
        let dataset = ingest_from_bytes(bytes, &source, &self.ingestion).inspect_err(|e| {
            tracing::warn!(product = %self.product_type, error = %e, "payload rejected");
        })?;
        self.run(dataset)
    }
}

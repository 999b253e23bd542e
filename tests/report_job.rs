use std::io::Write;
use std::sync::Arc;

use chrono::NaiveDate;
use flate2::write::GzEncoder;
use flate2::Compression;

use ads_report_processing::catalog::{ProductCatalog, ProductType};
use ads_report_processing::execution::{
    ExecutionEngine, ExecutionOptions, TracingExecutionObserver,
};
use ads_report_processing::ingestion::{ingest_from_bytes, IngestionOptions, TracingObserver};
use ads_report_processing::job::{report_date_for, ReportJob};
use ads_report_processing::types::Value;

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(bytes).unwrap();
    enc.finish().unwrap()
}

fn sd_payload(rows: usize) -> Vec<u8> {
    let items: Vec<String> = (0..rows)
        .map(|i| {
            format!(
                r#"{{"campaignName":"c{i}","adGroupName":"g","promotedSku":"SKU-{i}","impressions":{imp},"clicks":{clk},"cost":{cost},"sales":{sales},"salesClicks":{sales}}}"#,
                imp = 100 + i,
                clk = i % 5,
                cost = (i % 7) as f64 * 0.5,
                sales = (i % 3) * 10,
            )
        })
        .collect();
    gzip(format!("[{}]", items.join(",")).as_bytes())
}

#[test]
fn gzip_payload_to_report() {
    let job = ReportJob::new(ProductType::SponsoredDisplay)
        .with_report_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());

    let out = job.run_payload(&sd_payload(3)).unwrap();
    assert_eq!(out.row_count(), 3);

    let r = &out.rows[1];
    assert_eq!(r.get("Date"), Some(&Value::from("2024-06-01")));
    assert_eq!(r.get("Campaign Name"), Some(&Value::from("c1")));
    assert_eq!(r.get("Advertised SKU"), Some(&Value::from("SKU-1")));
    // cost 0.5 / clicks 1
    assert_eq!(r.get("Cost Per Click (CPC)"), Some(&Value::Float64(0.5)));
    // sales 10 / cost 0.5
    assert_eq!(r.get("Total Return on Advertising Spend (ROAS)"), Some(&Value::Float64(20.0)));
    assert_eq!(job.file_name(), "SD 2024-06-01.xlsx");
}

#[test]
fn parallel_engine_matches_job_output() {
    let job = ReportJob::new(ProductType::SponsoredDisplay)
        .with_report_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    let payload = sd_payload(500);
    let expected = job.run_payload(&payload).unwrap();

    let ingest_opts = IngestionOptions {
        observer: Some(Arc::new(TracingObserver)),
        ..Default::default()
    };
    let raw = ingest_from_bytes(&payload, "sd", &ingest_opts).unwrap();
    let raw = raw.map_rows(|mut row| {
        row.insert("date", Value::from("2024-06-01"));
        row
    });

    let engine = ExecutionEngine::new(ExecutionOptions {
        num_threads: Some(4),
        chunk_size: 64,
    })
    .unwrap()
    .with_observer(Arc::new(TracingExecutionObserver));
    let config = ProductCatalog::builtin()
        .get(ProductType::SponsoredDisplay)
        .unwrap();

    let parallel = engine.process_parallel(raw, config);
    assert_eq!(parallel, expected);
    assert_eq!(engine.metrics().snapshot().rows_processed, 500);
}

#[test]
fn default_report_dates_lag_by_product() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap();
    assert_eq!(
        report_date_for(today, ProductType::SponsoredBrands.report_lag_days()),
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    );
    assert_eq!(
        report_date_for(today, ProductType::SalesAndTraffic.report_lag_days()),
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    );
}

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use ads_report_processing::output::{to_csv_string, write_csv_to_path};
use ads_report_processing::processing::process_data;
use ads_report_processing::types::{ReportDataset, Row, Value};

fn tmp_file(ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("ads-report-processing-output-{nanos}.{ext}"))
}

fn sb_report() -> ReportDataset {
    let raw: Row = [
        ("date", Value::from("2024-06-01")),
        ("campaignName", Value::from("Brand, Exact")),
        ("impressions", Value::Int64(200)),
        ("clicks", Value::Int64(10)),
        ("cost", Value::Float64(5.0)),
    ]
    .into_iter()
    .collect();
    process_data(ReportDataset::new(vec![raw]), "SPONSORED_BRANDS").unwrap()
}

#[test]
fn csv_header_follows_schema_order() {
    let csv = to_csv_string(&sb_report()).unwrap();
    let mut lines = csv.lines();

    let header = lines.next().unwrap();
    assert!(header.starts_with("Date,Portfolio name,Currency,Campaign Name,"));

    let first = lines.next().unwrap();
    assert!(first.starts_with("2024-06-01,Not grouped,,\"Brand, Exact\","));
    assert!(lines.next().is_none());
}

#[test]
fn csv_file_round_trips_through_reader() {
    let path = tmp_file("csv");
    write_csv_to_path(&sb_report(), &path).unwrap();

    let mut rdr = csv::Reader::from_path(&path).unwrap();
    let headers = rdr.headers().unwrap().clone();
    let record = rdr.records().next().unwrap().unwrap();
    let ctr_idx = headers.iter().position(|h| h == "Click-Thru Rate (CTR)").unwrap();
    let roas_idx = headers
        .iter()
        .position(|h| h == "Total Return on Advertising Spend (ROAS)")
        .unwrap();
    assert_eq!(&record[ctr_idx], "0.05");
    assert_eq!(&record[roas_idx], "");

    let _ = std::fs::remove_file(&path);
}

#[cfg(feature = "xlsx")]
#[test]
fn xlsx_file_is_written() {
    use ads_report_processing::catalog::ProductType;
    use ads_report_processing::output::write_xlsx;

    let path = tmp_file("xlsx");
    write_xlsx(&sb_report(), ProductType::SponsoredBrands.tab_name(), &path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"PK"));

    let _ = std::fs::remove_file(&path);
}

#[cfg(feature = "xlsx_test_reader")]
#[test]
fn xlsx_cells_are_typed_and_dates_are_serials() {
    use ads_report_processing::catalog::ProductType;
    use ads_report_processing::output::write_xlsx;
    use calamine::{open_workbook_auto, Data, Reader};

    let path = tmp_file("xlsx");
    let tab = ProductType::SponsoredBrands.tab_name();
    write_xlsx(&sb_report(), tab, &path).unwrap();

    let mut wb = open_workbook_auto(&path).unwrap();
    assert_eq!(wb.sheet_names(), vec![tab.to_string()]);
    let range = wb.worksheet_range(tab).unwrap();

    assert_eq!(range.get((0, 0)), Some(&Data::String("Date".to_string())));
    let serial = match range.get((1, 0)) {
        Some(Data::Float(f)) => *f,
        Some(Data::DateTime(dt)) => dt.as_f64(),
        other => panic!("expected a date serial, got {other:?}"),
    };
    assert_eq!(serial, 45444.0);

    assert_eq!(range.get((1, 1)), Some(&Data::String("Not grouped".to_string())));

    let header: Vec<String> = range.rows().next().unwrap().iter().map(|c| c.to_string()).collect();
    let clicks_idx = header.iter().position(|h| h == "Clicks").unwrap();
    assert_eq!(range.get((1, clicks_idx)), Some(&Data::Float(10.0)));

    let _ = std::fs::remove_file(&path);
}

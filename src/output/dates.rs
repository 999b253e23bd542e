//! Date helpers for spreadsheet output.

use chrono::NaiveDate;

/// Excel's day zero. Serial numbers count days from here (1900 date system).
fn excel_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// Convert an ISO `YYYY-MM-DD` date to an Excel serial date number.
///
/// Returns `None` if `s` is not a valid calendar date in that format.
///
/// ```
/// use ads_report_processing::output::excel_serial_date;
///
/// assert_eq!(excel_serial_date("2024-06-01"), Some(45444.0));
/// assert_eq!(excel_serial_date("June 1"), None);
/// ```
pub fn excel_serial_date(s: &str) -> Option<f64> {
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()?;
    let days = date.signed_duration_since(excel_epoch()?).num_days();
    Some(days as f64)
}

/// Cell-level parsing: lake levels and header dates.
///
/// Level cells are free-form text such as `"675.20 msm"` or
/// `"Niveau max. 680.50 msm"`. "msm" is the French "mètres sur mer",
/// metres above sea level. Cells without a reading yield `None`; the
/// extractor decides what to store in that case.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static MSM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.\d+).*msm").expect("valid regex"));

static HEADER_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})\.(\d{1,2})\.(\d{4})$").expect("valid regex"));

/// Reads a level expressed in metres above sea level.
///
/// Matches the first `digits.digits` that is followed, anywhere later on the
/// same line, by the literal `msm`. Returns `None` when there is no such
/// match or the digits do not parse.
pub fn msm(text: &str) -> Option<f64> {
    let caps = MSM_RE.captures(text)?;
    caps[1].parse::<f64>().ok()
}

/// Parses a header date of the form `day.month.year`, e.g. `"2.1.2024"`.
///
/// Day and month take one or two digits, the year exactly four. The text
/// must already be trimmed.
pub fn parse_header_date(text: &str) -> Option<NaiveDate> {
    let caps = HEADER_DATE_RE.captures(text)?;
    let day = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

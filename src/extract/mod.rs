/// Extraction of lake levels from the source page.
///
/// Pure functions: HTML text in, `Lakes` out. No I/O.
///
/// Submodules:
/// - `layout`: locates the level table, its header dates and body cells.
/// - `levels`: parses level cells (`"675.20 msm"`) and header dates (`"2.1.2024"`).

pub mod layout;
pub mod levels;

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use scraper::Html;

use crate::model::{ExtractError, Lakes, LevelRecord};

pub use layout::{RowCells, TableLayout, TableLocator};
pub use levels::{msm, parse_header_date};

static START_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[A-Za-z!]").expect("valid regex"));

/// Extracts every lake on the page using the default table layout.
pub fn extract(html: &str) -> Result<Lakes, ExtractError> {
    extract_with(&TableLocator::default(), html)
}

/// Extracts every lake on the page using the given table locator.
///
/// The record's `date` is the later of the two header dates and `today`
/// comes from that date's column, whichever order the page uses. When
/// both header dates are equal the second column is taken as today.
/// A lake listed twice keeps its last row. Unreadable level cells are
/// stored as `0`.
pub fn extract_with(locator: &TableLocator, html: &str) -> Result<Lakes, ExtractError> {
    let doc = parse_document(html)?;

    let (first_col, second_col) = locator.date_columns();
    let (first_text, second_text) = locator.header_dates(&doc);
    let first_date = header_date(first_col, first_text)?;
    let second_date = header_date(second_col, second_text)?;

    let first_is_today = first_date > second_date;
    let date = if first_is_today { first_date } else { second_date };
    let date = date.and_time(NaiveTime::MIN).and_utc();

    let mut lakes = Lakes::new();
    for row in locator.rows(&doc) {
        let first_level = level_or_zero(&row.first_level);
        let second_level = level_or_zero(&row.second_level);
        let (today, yesterday) = if first_is_today {
            (first_level, second_level)
        } else {
            (second_level, first_level)
        };

        let record = LevelRecord {
            name: row.name.clone(),
            max_level: level_or_zero(&row.max_level),
            date,
            today,
            yesterday,
        };
        lakes.insert(row.name, record);
    }

    Ok(lakes)
}

/// Builds a document tree, rejecting content with no markup at all.
///
/// The HTML parser itself accepts anything, so "not HTML" is decided here:
/// empty content, or content without a single start tag, is a parse failure.
fn parse_document(html: &str) -> Result<Html, ExtractError> {
    if html.trim().is_empty() {
        return Err(ExtractError::ParseFailure("empty document".to_string()));
    }
    if html.contains('\0') {
        return Err(ExtractError::ParseFailure("document contains NUL bytes".to_string()));
    }
    if !START_TAG_RE.is_match(html) {
        return Err(ExtractError::ParseFailure("no HTML markup found".to_string()));
    }
    Ok(Html::parse_document(html))
}

fn header_date(column: usize, text: Option<String>) -> Result<NaiveDate, ExtractError> {
    match text {
        Some(text) => match parse_header_date(&text) {
            Some(date) => Ok(date),
            None => Err(ExtractError::HeaderParseFailure { column, text: Some(text) }),
        },
        None => Err(ExtractError::HeaderParseFailure { column, text: None }),
    }
}

fn level_or_zero(text: &str) -> f64 {
    msm(text).unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn page(first: &str, second: &str, rows: &[[&str; 4]]) -> String {
        let body: String = rows
            .iter()
            .map(|r| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                    r[0], r[1], r[2], r[3]
                )
            })
            .collect();
        format!(
            "<!DOCTYPE html><html><body><table>\
             <thead><tr><th>Lac</th><th>Niveau max.</th><th>{}</th><th>{}</th></tr></thead>\
             <tbody>{}</tbody></table></body></html>",
            first, second, body
        )
    }

    const GRUYERE: [&str; 4] = ["Lac de la Gruyère", "680.50 msm", "675.20 msm", "674.80 msm"];

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_later_date_in_first_column() {
        let lakes = extract(&page("2.1.2024", "1.1.2024", &[GRUYERE])).expect("should extract");
        let lake = &lakes["Lac de la Gruyère"];
        assert_eq!(lake.level_date(), day(2024, 1, 2));
        assert_eq!(lake.today, 675.20);
        assert_eq!(lake.yesterday, 674.80);
        assert_eq!(lake.max_level, 680.50);
    }

    #[test]
    fn test_later_date_in_second_column_swaps_values() {
        let lakes = extract(&page("1.1.2024", "2.1.2024", &[GRUYERE])).expect("should extract");
        let lake = &lakes["Lac de la Gruyère"];
        assert_eq!(lake.level_date(), day(2024, 1, 2));
        assert_eq!(lake.today, 674.80);
        assert_eq!(lake.yesterday, 675.20);
    }

    #[test]
    fn test_dates_compare_chronologically_not_textually() {
        // "9.1.2024" sorts after "10.1.2024" as text.
        let lakes = extract(&page("9.1.2024", "10.1.2024", &[GRUYERE])).expect("should extract");
        let lake = &lakes["Lac de la Gruyère"];
        assert_eq!(lake.level_date(), day(2024, 1, 10));
        assert_eq!(lake.today, 674.80);
    }

    #[test]
    fn test_year_boundary() {
        let lakes = extract(&page("1.1.2024", "31.12.2023", &[GRUYERE])).expect("should extract");
        let lake = &lakes["Lac de la Gruyère"];
        assert_eq!(lake.level_date(), day(2024, 1, 1));
        assert_eq!(lake.today, 675.20);
    }

    #[test]
    fn test_equal_dates_take_second_column_as_today() {
        let lakes = extract(&page("2.1.2024", "2.1.2024", &[GRUYERE])).expect("should extract");
        let lake = &lakes["Lac de la Gruyère"];
        assert_eq!(lake.today, 674.80);
        assert_eq!(lake.yesterday, 675.20);
    }

    #[test]
    fn test_unreadable_cell_is_zero() {
        let row = ["Lac de Montsalvens", "no data available", "801.10 msm", "-"];
        let lakes = extract(&page("2.1.2024", "1.1.2024", &[row])).expect("should extract");
        let lake = &lakes["Lac de Montsalvens"];
        assert_eq!(lake.max_level, 0.0);
        assert_eq!(lake.today, 801.10);
        assert_eq!(lake.yesterday, 0.0);
        assert_eq!(lake.missing_fields(), vec!["max_level", "yesterday"]);
    }

    #[test]
    fn test_invalid_header_dates_fail() {
        let result = extract(&page("invalid", "invalid", &[GRUYERE]));
        assert_eq!(
            result,
            Err(ExtractError::HeaderParseFailure { column: 2, text: Some("invalid".to_string()) })
        );
    }

    #[test]
    fn test_second_header_date_invalid_fails() {
        let result = extract(&page("2.1.2024", "hier", &[GRUYERE]));
        assert_eq!(
            result,
            Err(ExtractError::HeaderParseFailure { column: 3, text: Some("hier".to_string()) })
        );
    }

    #[test]
    fn test_missing_table_is_header_failure() {
        let result = extract("<html><body><p>Page en maintenance</p></body></html>");
        assert_eq!(result, Err(ExtractError::HeaderParseFailure { column: 2, text: None }));
    }

    #[test]
    fn test_non_html_input_is_parse_failure() {
        assert!(matches!(extract(""), Err(ExtractError::ParseFailure(_))));
        assert!(matches!(extract("   \n"), Err(ExtractError::ParseFailure(_))));
        assert!(matches!(extract("675.20 msm; 674.80 msm"), Err(ExtractError::ParseFailure(_))));
        assert!(matches!(extract("<table>\0</table>"), Err(ExtractError::ParseFailure(_))));
    }

    #[test]
    fn test_empty_body_is_empty_result() {
        let lakes = extract(&page("2.1.2024", "1.1.2024", &[])).expect("should extract");
        assert!(lakes.is_empty());
    }

    #[test]
    fn test_duplicate_names_keep_last_row() {
        let rows = [
            ["Lac de la Gruyère", "680.50 msm", "600.00 msm", "600.00 msm"],
            GRUYERE,
        ];
        let lakes = extract(&page("2.1.2024", "1.1.2024", &rows)).expect("should extract");
        assert_eq!(lakes.len(), 1);
        assert_eq!(lakes["Lac de la Gruyère"].today, 675.20);
    }

    #[test]
    fn test_empty_name_still_produces_record() {
        let row = ["", "680.50 msm", "675.20 msm", "674.80 msm"];
        let lakes = extract(&page("2.1.2024", "1.1.2024", &[row])).expect("should extract");
        assert_eq!(lakes[""].store_path(), "current/");
    }

    #[test]
    fn test_extract_is_repeatable() {
        let html = page("2.1.2024", "1.1.2024", &[GRUYERE]);
        assert_eq!(extract(&html), extract(&html));
    }
}

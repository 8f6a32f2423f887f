//! Source Page Verification
//!
//! Dry run of a sync: fetches the page and extracts the lakes without
//! writing anything, then reports what would have been stored. Use it after
//! changing `[layout]` or when the source site has been redesigned.
//!
//! # Clock injection
//! Staleness is computed against a `now: DateTime<Utc>` argument so the
//! report is deterministic in tests.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::extract::{self, TableLocator};
use crate::ingest::Fetcher;
use crate::model::Lakes;

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub source_url: String,
    pub status: VerificationStatus,
    pub level_date: Option<NaiveDate>,
    pub stale: bool,
    pub lakes: Vec<LakeVerification>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LakeVerification {
    pub name: String,
    pub path: String,
    pub max_level: f64,
    pub today: f64,
    pub yesterday: f64,
    pub missing_fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VerificationStatus {
    /// Every lake has all three values and the date is recent
    Success,
    /// Lakes were found but some values are unreadable or the date is old
    PartialSuccess,
    Failed,
}

// ============================================================================
// Staleness
// ============================================================================

/// Returns `true` if `level_date` is more than `max_age_days` before the
/// calendar day of `now`.
///
/// Staleness is strictly greater than the threshold:
///   age > max_age_days  →  stale
///   age == max_age_days →  not stale
pub fn is_stale_at(level_date: NaiveDate, max_age_days: i64, now: DateTime<Utc>) -> bool {
    (now.date_naive() - level_date).num_days() > max_age_days
}

// ============================================================================
// Verification
// ============================================================================

/// Fetches and extracts the page, reporting what a sync would write.
pub fn verify_source<F: Fetcher>(
    fetcher: &F,
    locator: &TableLocator,
    source_url: &str,
    max_age_days: i64,
    now: DateTime<Utc>,
) -> VerificationReport {
    let mut report = VerificationReport {
        timestamp: now.to_rfc3339(),
        source_url: source_url.to_string(),
        status: VerificationStatus::Failed,
        level_date: None,
        stale: false,
        lakes: Vec::new(),
        error_message: None,
    };

    let html = match fetcher.fetch(source_url) {
        Ok(html) => html,
        Err(e) => {
            report.error_message = Some(format!("Fetch failed: {}", e));
            return report;
        }
    };

    match extract::extract_with(locator, &html) {
        Ok(lakes) => fill_report(&mut report, &lakes, max_age_days, now),
        Err(e) => report.error_message = Some(format!("Extraction failed: {}", e)),
    }

    report
}

fn fill_report(report: &mut VerificationReport, lakes: &Lakes, max_age_days: i64, now: DateTime<Utc>) {
    report.lakes = lakes
        .values()
        .map(|lake| LakeVerification {
            name: lake.name.clone(),
            path: lake.store_path(),
            max_level: lake.max_level,
            today: lake.today,
            yesterday: lake.yesterday,
            missing_fields: lake.missing_fields().into_iter().map(String::from).collect(),
        })
        .collect();

    report.level_date = lakes.values().next().map(|lake| lake.level_date());
    report.stale = report
        .level_date
        .map(|date| is_stale_at(date, max_age_days, now))
        .unwrap_or(false);

    if report.lakes.is_empty() {
        report.error_message = Some("Level table has no rows".to_string());
        return;
    }

    let complete = report.lakes.iter().all(|lake| lake.missing_fields.is_empty());
    report.status = if complete && !report.stale {
        VerificationStatus::Success
    } else {
        VerificationStatus::PartialSuccess
    };
}

pub fn print_summary(report: &VerificationReport) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("Source: {}", report.source_url);
    println!("Status: {:?}", report.status);
    if let Some(date) = report.level_date {
        println!("Level date: {}{}", date, if report.stale { " (STALE)" } else { "" });
    }
    for lake in &report.lakes {
        println!(
            "  {:<28} today {:>8.2}  yesterday {:>8.2}  max {:>8.2}",
            lake.name, lake.today, lake.yesterday, lake.max_level
        );
        if !lake.missing_fields.is_empty() {
            println!("    ⚠ unreadable: {}", lake.missing_fields.join(", "));
        }
    }
    if let Some(error) = &report.error_message {
        println!("Error: {}", error);
    }
    println!("═══════════════════════════════════════════════════════════\n");
}

// ============================================================================
// Tests
// ============================================================================

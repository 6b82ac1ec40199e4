//! Demographic summaries for the diversity spreadsheet.
//!
//! Two inputs are supported:
//! - `cfp`: the CFP system export, one row per submission with a `status`
//!   column and one column per demographic type
//! - `reg`: the `demo_data.csv` and `totals.csv` reports written by
//!   `reg_stats`, already aggregated per answer
//!
//! Both lay out their values in a fixed per-type order so the CSV lines up
//! with previous years.

mod cfp;
mod order;
mod reg;

pub use cfp::{CfpSummary, CfpTally, Decision, ValueCounts};
pub use order::{FieldOrder, order_preference, preferred_order, reg_label};
pub use reg::{RegSummary, RegTally};

use clap::ValueEnum;
use csv::StringRecord;
use thiserror::Error;

/// Demographic types summarized when none are requested explicitly.
pub const ALL_DEMO_TYPES: [&str; 7] = [
    "gender",
    "age",
    "ethnicity",
    "education",
    "employment status",
    "marital status",
    "household income",
];

/// Value recorded for a blank answer.
pub const NO_RESPONSE: &str = "no response";

/// Where the demographic data comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum InputType {
    /// CFP system export of individual submissions
    #[default]
    Cfp,
    /// Registration reports (demo_data.csv plus totals.csv)
    Reg,
}

/// How each demographic type is printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputType {
    /// Field-name line plus value line, including calculated fields
    #[default]
    Csv,
    /// Human-readable printout of the parsed counts only
    Simple,
}

/// Diversity summary error types
#[derive(Error, Debug)]
pub enum DiversityError {
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Submissions have no '{0}' column")]
    MissingColumn(String),

    #[error("Got unexpected status: '{status}' on line {line}")]
    UnexpectedStatus { status: String, line: u64 },

    #[error("Unrecognized demographic type {0}")]
    UnrecognizedType(String),

    #[error("Invalid count '{value}' on line {line}")]
    InvalidCount { value: String, line: u64 },
}

/// Normalize a header or demographic type name for matching.
///
/// Lowercases, drops punctuation, and joins words with underscores, so
/// `Employment Status`, `employment status` and `employment_status` match.
pub fn normalize_key(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Normalize an answer value: lowercased, empty as `no response`.
///
/// Whitespace is kept, so `" male"` and `"male"` stay distinct values.
pub fn normalize_value(value: &str) -> String {
    if value.is_empty() {
        NO_RESPONSE.to_string()
    } else {
        value.to_lowercase()
    }
}

/// Percentage rounded to one decimal; `None` when the denominator is zero.
pub fn percent(numerator: f64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    let pct = numerator / denominator as f64 * 100.0;
    Some((pct * 10.0).round() / 10.0)
}

/// Render an optional value; missing values are empty.
fn field_or_empty<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn format_pct(value: Option<f64>) -> String {
    value.map(|v| format!("{:.1}", v)).unwrap_or_default()
}

/// Three-line csv block: type name, `# field, ...`, values.
fn render_csv_block(demo_type: &str, columns: &[(String, String)]) -> String {
    let names = columns.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>();
    let values = columns.iter().map(|(_, v)| v.as_str()).collect::<Vec<_>>();
    format!(
        "{}\n# {}\n{}\n",
        demo_type.to_uppercase(),
        names.join(", "),
        values.join(", ")
    )
}

fn parse_count(raw: &str, record: &StringRecord) -> Result<u64, DiversityError> {
    raw.trim().parse().map_err(|_| DiversityError::InvalidCount {
        value: raw.to_string(),
        line: record.position().map_or(0, |p| p.line()),
    })
}

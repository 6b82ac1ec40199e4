//! Summary of the registration reports written by `reg_stats`.
//!
//! `demo_data.csv` is already aggregated: one row per answer with the
//! question text in column 1, the answer text in column 3 and the attendee
//! count in column 4. `totals.csv` holds one count per badge type in column 1.
//! Nobody answers "no response" in registration, so that count is derived
//! from the attendee total.

use std::collections::HashMap;
use std::io::Read;

use csv::ReaderBuilder;
use tracing::debug;

use super::order::FieldOrder;
use super::{
    ALL_DEMO_TYPES, DiversityError, InputType, NO_RESPONSE, field_or_empty, format_pct,
    normalize_key, parse_count, percent, render_csv_block,
};

const TYPE_COLUMN: usize = 1;
const VALUE_COLUMN: usize = 3;
const COUNT_COLUMN: usize = 4;
const TOTAL_COLUMN: usize = 1;

#[derive(Debug, Default)]
struct TypeAnswers {
    seen: Vec<String>,
    counts: HashMap<String, u64>,
    answered: u64,
}

/// Answer counts from the registration reports.
#[derive(Debug)]
pub struct RegTally {
    demo_types: Vec<String>,
    total: u64,
    answers: HashMap<String, TypeAnswers>,
}

impl RegTally {
    /// Read `demo_data.csv` and `totals.csv` contents.
    ///
    /// Questions that are known demographic types but were not requested
    /// are skipped; any other question text is an error.
    pub fn from_readers<D: Read, T: Read>(
        demo_data: D,
        totals: T,
        demo_types: &[String],
    ) -> Result<Self, DiversityError> {
        let mut total = 0;
        let mut totals_csv = ReaderBuilder::new().from_reader(totals);
        for record in totals_csv.records() {
            let record = record?;
            total += parse_count(record.get(TOTAL_COLUMN).unwrap_or(""), &record)?;
        }

        let requested: HashMap<String, &String> =
            demo_types.iter().map(|t| (normalize_key(t), t)).collect();
        let known: Vec<String> = ALL_DEMO_TYPES.iter().map(|t| normalize_key(t)).collect();

        let mut answers: HashMap<String, TypeAnswers> = HashMap::new();
        let mut demo_csv = ReaderBuilder::new().from_reader(demo_data);
        for record in demo_csv.records() {
            let record = record?;
            let question = record.get(TYPE_COLUMN).unwrap_or("").to_lowercase();
            let value = record.get(VALUE_COLUMN).unwrap_or("").to_lowercase();
            let count = parse_count(record.get(COUNT_COLUMN).unwrap_or(""), &record)?;
            debug!("Logging a {}/{}", question, value);

            let key = normalize_key(&question);
            let Some(demo_type) = requested.get(&key) else {
                if known.contains(&key) {
                    continue;
                }
                return Err(DiversityError::UnrecognizedType(question));
            };

            let entry = answers.entry((*demo_type).clone()).or_default();
            if !entry.counts.contains_key(&value) {
                entry.seen.push(value.clone());
            }
            entry.counts.insert(value, count);
            entry.answered += count;
        }

        Ok(Self {
            demo_types: demo_types.to_vec(),
            total,
            answers,
        })
    }

    pub fn demo_types(&self) -> &[String] {
        &self.demo_types
    }

    /// Attendees across all badge types
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Summary of one demographic type in its output order.
    pub fn summarize(&self, demo_type: &str) -> RegSummary {
        let empty = TypeAnswers::default();
        let answers = self.answers.get(demo_type).unwrap_or(&empty);
        let order = FieldOrder::resolve(demo_type, &answers.seen, InputType::Reg);
        let counts = order
            .fields
            .iter()
            .map(|f| {
                if f == NO_RESPONSE {
                    Some(self.total as i64 - answers.answered as i64)
                } else {
                    answers.counts.get(f).map(|&n| n as i64)
                }
            })
            .collect();

        RegSummary {
            demo_type: demo_type.to_string(),
            order,
            counts,
            total: self.total,
            answered: answers.answered,
        }
    }
}

/// One demographic type's attendee counts, aligned with `order.fields`.
///
/// `counts` is `None` for answers nobody gave.
#[derive(Debug, Clone, PartialEq)]
pub struct RegSummary {
    pub demo_type: String,
    pub order: FieldOrder,
    pub counts: Vec<Option<i64>>,
    pub total: u64,
    /// Attendees who answered this question
    pub answered: u64,
}

impl RegSummary {
    /// Counts, then `pct:` of all attendees, then `pct_replies:` of those
    /// who answered (not defined for `no response`).
    pub fn csv_columns(&self) -> Vec<(String, String)> {
        let fields = &self.order.fields;
        let mut columns: Vec<(String, String)> = fields
            .iter()
            .zip(&self.counts)
            .map(|(f, n)| (f.clone(), field_or_empty(*n)))
            .collect();

        for (field, n) in fields.iter().zip(&self.counts) {
            let pct = percent(n.unwrap_or(0) as f64, self.total);
            columns.push((format!("pct:{}", field), format_pct(pct)));
        }

        for (field, n) in fields.iter().zip(&self.counts) {
            if field == NO_RESPONSE {
                continue;
            }
            let pct = percent(n.unwrap_or(0) as f64, self.answered);
            columns.push((format!("pct_replies:{}", field), format_pct(pct)));
        }

        columns
    }

    pub fn render_csv(&self) -> String {
        render_csv_block(&self.demo_type, &self.csv_columns())
    }
}

//! Tally of CFP submissions by decision and demographic value.

use std::collections::HashMap;
use std::io::Read;

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use super::order::FieldOrder;
use super::{
    DiversityError, InputType, format_pct, normalize_key, normalize_value, percent,
    render_csv_block,
};

/// Review outcome of one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    /// `Accepted` and `Hold` count as accepts; `Rejected` and blank as rejects.
    pub fn from_status(status: &str) -> Option<Self> {
        match status {
            "Accepted" | "Hold" => Some(Self::Accept),
            "Rejected" | "" => Some(Self::Reject),
            _ => None,
        }
    }
}

/// Per-value submission counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueCounts {
    pub totals: u64,
    pub accepts: u64,
    pub rejects: u64,
}

#[derive(Debug, Default)]
struct TypeTally {
    seen: Vec<String>,
    counts: HashMap<String, ValueCounts>,
}

impl TypeTally {
    fn record(&mut self, value: String, decision: Decision) {
        if !self.counts.contains_key(&value) {
            self.seen.push(value.clone());
        }
        let counts = self.counts.entry(value).or_default();
        counts.totals += 1;
        match decision {
            Decision::Accept => counts.accepts += 1,
            Decision::Reject => counts.rejects += 1,
        }
    }
}

/// Counts from a CFP submissions export.
#[derive(Debug)]
pub struct CfpTally {
    demo_types: Vec<String>,
    tallies: HashMap<String, TypeTally>,
    submissions: u64,
    accepts: u64,
}

impl CfpTally {
    /// Read a submissions export with a `status` column and one column per
    /// demographic type.
    pub fn from_reader<R: Read>(reader: R, demo_types: &[String]) -> Result<Self, DiversityError> {
        let mut csv = ReaderBuilder::new().from_reader(reader);
        let headers: Vec<String> = csv.headers()?.iter().map(normalize_key).collect();
        let column = |name: &str| {
            let key = normalize_key(name);
            headers
                .iter()
                .position(|h| *h == key)
                .ok_or_else(|| DiversityError::MissingColumn(name.to_string()))
        };

        let status_idx = column("status")?;
        let type_columns = demo_types
            .iter()
            .map(|t| column(t.as_str()).map(|idx| (t.clone(), idx)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tally = Self {
            demo_types: demo_types.to_vec(),
            tallies: HashMap::new(),
            submissions: 0,
            accepts: 0,
        };

        for record in csv.records() {
            let record = record?;
            let status = record.get(status_idx).unwrap_or("");
            let decision = Decision::from_status(status).ok_or_else(|| {
                DiversityError::UnexpectedStatus {
                    status: status.to_string(),
                    line: line_of(&record),
                }
            })?;

            tally.submissions += 1;
            if decision == Decision::Accept {
                tally.accepts += 1;
            }

            for (demo_type, idx) in &type_columns {
                let value = normalize_value(record.get(*idx).unwrap_or(""));
                debug!("Logging a {}/{}/{}", demo_type, value, status);
                tally
                    .tallies
                    .entry(demo_type.clone())
                    .or_default()
                    .record(value, decision);
            }
        }

        Ok(tally)
    }

    pub fn demo_types(&self) -> &[String] {
        &self.demo_types
    }

    pub fn submissions(&self) -> u64 {
        self.submissions
    }

    pub fn accepts(&self) -> u64 {
        self.accepts
    }

    /// Summary of one demographic type in its output order.
    pub fn summarize(&self, demo_type: &str) -> CfpSummary {
        let empty = TypeTally::default();
        let tally = self.tallies.get(demo_type).unwrap_or(&empty);
        let order = FieldOrder::resolve(demo_type, &tally.seen, InputType::Cfp);
        let counts = order
            .fields
            .iter()
            .map(|f| tally.counts.get(f).copied())
            .collect();

        CfpSummary {
            demo_type: demo_type.to_string(),
            order,
            counts,
            total_submissions: self.submissions,
            total_accepts: self.accepts,
        }
    }
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

/// One demographic type's counts, aligned with `order.fields`.
///
/// `counts` is `None` for values no submission gave.
#[derive(Debug, Clone, PartialEq)]
pub struct CfpSummary {
    pub demo_type: String,
    pub order: FieldOrder,
    pub counts: Vec<Option<ValueCounts>>,
    pub total_submissions: u64,
    pub total_accepts: u64,
}

impl CfpSummary {
    fn count_of(&self, pick: fn(&ValueCounts) -> u64) -> impl Iterator<Item = u64> + '_ {
        self.counts
            .iter()
            .map(move |c| c.as_ref().map_or(0, pick))
    }

    /// Field name and rendered value for every csv column.
    ///
    /// Counts come first, then the global totals, then the calculated
    /// percentages. Calculated fields are blank for values never seen.
    pub fn csv_columns(&self) -> Vec<(String, String)> {
        let fields = &self.order.fields;
        let mut columns = Vec::new();

        for (status, pick) in [
            ("totals", (|c: &ValueCounts| c.totals) as fn(&ValueCounts) -> u64),
            ("accepts", |c: &ValueCounts| c.accepts),
        ] {
            for (field, n) in fields.iter().zip(self.count_of(pick)) {
                columns.push((format!("{}:{}", status, field), n.to_string()));
            }
        }

        columns.push(("total submissions".to_string(), self.total_submissions.to_string()));
        columns.push(("total accepts".to_string(), self.total_accepts.to_string()));

        let calculated: [(&str, fn(&ValueCounts, &Self) -> Option<f64>); 3] = [
            ("accept_rate", |c, _| percent(c.accepts as f64, c.totals)),
            ("submission_pct", |c, s| {
                percent(c.totals as f64, s.total_submissions)
            }),
            ("accept_pct", |c, s| percent(c.accepts as f64, s.total_accepts)),
        ];
        for (name, calc) in calculated {
            for (field, counts) in fields.iter().zip(&self.counts) {
                let value = counts.as_ref().and_then(|c| calc(c, self));
                columns.push((format!("{}:{}", name, field), format_pct(value)));
            }
        }

        columns
    }

    pub fn render_csv(&self) -> String {
        render_csv_block(&self.demo_type, &self.csv_columns())
    }

    /// Human-readable counts without calculated fields.
    pub fn render_simple(&self) -> String {
        let mut out = format!(
            "{}\n\tPossible values: {}\n",
            self.demo_type.to_uppercase(),
            self.order.fields.join(", ")
        );
        for (name, pick) in [
            ("Submissions", (|c: &ValueCounts| c.totals) as fn(&ValueCounts) -> u64),
            ("Accepts", |c: &ValueCounts| c.accepts),
            ("Rejects", |c: &ValueCounts| c.rejects),
        ] {
            let values = self
                .counts
                .iter()
                .map(|c| c.as_ref().map_or(0, pick).to_string())
                .collect::<Vec<_>>();
            out.push_str(&format!("\t{}: \n\t{}\n", name, values.join(", ")));
        }
        out
    }
}

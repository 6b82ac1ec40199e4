//! Preferred field order per demographic type.

use super::{InputType, NO_RESPONSE};

const AGE_ORDER: &[&str] = &[
    "under 18",
    "18-24",
    "25-34",
    "35-44",
    "45-54",
    "55+",
    "prefer not to say",
    "no response",
];

const EDUCATION_ORDER: &[&str] = &[
    "some high school",
    "high school or equivalent",
    "trade school",
    "bachelor's degree",
    "master's degree",
    "doctorate (e.g. phd, edd, md)",
    "other",
    "prefer not to say",
    "no response",
];

// Every value is listed, seen or not, so the columns line up year to year.
const ETHNICITY_ORDER: &[&str] = &[
    "asian",
    "black / african american",
    "latino / hispanic",
    "native american / american indian",
    "native hawaiian or pacific islander",
    "other/unknown",
    "prefer not to say",
    "two or more",
    "white / caucasian",
    "no response",
];

const GENDER_ORDER: &[&str] = &[
    "male",
    "female",
    "other",
    "no response",
    "prefer not to say",
    "non-binary",
];

const HOUSEHOLD_INCOME_ORDER: &[&str] = &[
    "below $10k / year",
    "$10k-$50k / year",
    "$50k-$100k / year",
    "$100k-$200k / year",
    "$200k-$500k / year",
    "more than $500k / year",
    "prefer not to say",
    "no response",
];

/// Column order that pastes straight into the diversity spreadsheet.
pub fn order_preference(demo_type: &str) -> Option<&'static [&'static str]> {
    match demo_type {
        "age" => Some(AGE_ORDER),
        "education" => Some(EDUCATION_ORDER),
        "ethnicity" => Some(ETHNICITY_ORDER),
        "gender" => Some(GENDER_ORDER),
        "household income" => Some(HOUSEHOLD_INCOME_ORDER),
        _ => None,
    }
}

/// Registration spells age brackets out: `18 to 24`, `55 and up`.
pub fn reg_label(value: &str) -> String {
    if value == "55+" {
        "55 and up".to_string()
    } else {
        value.replace('-', " to ")
    }
}

/// Preferred order for a type, with labels as the given input spells them.
pub fn preferred_order(demo_type: &str, input: InputType) -> Option<Vec<String>> {
    let preferred = order_preference(demo_type)?;
    let munge = input == InputType::Reg && demo_type == "age";
    Some(
        preferred
            .iter()
            .map(|v| if munge { reg_label(v) } else { v.to_string() })
            .collect(),
    )
}

/// Output order for one type plus what differed from the preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOrder {
    pub fields: Vec<String>,
    /// Seen values not covered by the preferred order
    pub extra: Vec<String>,
    /// Preferred values never seen
    pub missing: Vec<String>,
}

impl FieldOrder {
    /// Order `seen` (first-seen order) for `demo_type`.
    ///
    /// Types with a preference use it, followed by any unlisted values.
    /// Other types are sorted with `no response` always last.
    pub fn resolve(demo_type: &str, seen: &[String], input: InputType) -> Self {
        match preferred_order(demo_type, input) {
            Some(preferred) => {
                let extra: Vec<String> = seen
                    .iter()
                    .filter(|v| !preferred.contains(*v))
                    .cloned()
                    .collect();
                let missing: Vec<String> = preferred
                    .iter()
                    .filter(|p| !seen.contains(*p))
                    .cloned()
                    .collect();
                let mut fields = preferred;
                fields.extend(extra.iter().cloned());
                Self {
                    fields,
                    extra,
                    missing,
                }
            }
            None => {
                let mut fields: Vec<String> = seen
                    .iter()
                    .filter(|v| v.as_str() != NO_RESPONSE)
                    .cloned()
                    .collect();
                fields.sort();
                fields.push(NO_RESPONSE.to_string());
                Self {
                    fields,
                    extra: Vec::new(),
                    missing: Vec::new(),
                }
            }
        }
    }

    /// Warnings about values outside the preferred order.
    ///
    /// A preference missing only `no response` is not worth a warning.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.extra.is_empty() {
            warnings.push(format!("Preferred field order is missing vals: {:?}", self.extra));
        }
        if !self.missing.is_empty() && self.missing != [NO_RESPONSE] {
            warnings.push(format!(
                "Did not see any entries with vals specified in order preference: {}",
                self.missing.join(", ")
            ));
        }
        warnings
    }
}

//! Fixed report definitions.
//!
//! Each report is a single aggregation query whose result set is written
//! verbatim to `<name>.csv`.

/// A named aggregation query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub name: &'static str,
    pub sql: &'static str,
}

impl Report {
    /// Output file name for this report.
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.name)
    }
}

/// Demographic question ids asked during registration.
pub const DEMOGRAPHIC_QUESTION_IDS: [i32; 7] = [4, 5, 20, 21, 22, 23, 24];

/// Answer counts per demographic question, most popular answer first.
pub const DEMO_DATA: Report = Report {
    name: "demo_data",
    sql: "\
SELECT
    a.question_id,
    q.text AS question_text,
    a.id AS answer_id,
    a.text AS answer_text,
    COUNT(aa.attendee_id) AS num_attendees
FROM reg6_answer a
JOIN reg6_attendee_answers aa ON a.id = aa.answer_id
JOIN reg6_question q ON a.question_id = q.id
JOIN reg6_attendee att ON aa.attendee_id = att.id
WHERE a.question_id IN (4, 5, 20, 21, 22, 23, 24)
AND att.valid
GROUP BY a.question_id, q.text, a.id, a.text
ORDER BY a.question_id, num_attendees DESC",
};

/// Valid attendee counts per badge type.
pub const TOTALS: Report = Report {
    name: "totals",
    sql: "\
SELECT badge_type_id, COUNT(*) AS count
FROM reg6_attendee
WHERE valid
GROUP BY badge_type_id
ORDER BY badge_type_id",
};

/// Reports in the order they run.
pub const ALL_REPORTS: [Report; 2] = [DEMO_DATA, TOTALS];

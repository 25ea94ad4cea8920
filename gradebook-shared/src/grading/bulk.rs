/// Bulk marks submission
///
/// A bulk submission carries one student's marks for many subjects of the same
/// exam. Each entry may leave out either value. [`plan`] checks the whole
/// submission first and only then describes the writes, so a single bad entry
/// rejects everything:
///
/// - every value that is present is range-checked on its own
/// - when both values are present, marks must not exceed max marks
/// - entries with only one value are skipped without a write
/// - exam totals are produced only when the written sheets have max marks
///
/// Entries are planned in subject ID order (the map's order).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::grade::{check_marks_obtained, check_max_marks, MarksError, ScoredMarks};
use super::MarksTally;

/// Submitted values for one subject
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectMarks {
    #[serde(default)]
    pub marks_obtained: Option<Decimal>,
    #[serde(default)]
    pub max_marks: Option<Decimal>,
}

/// A rule broken by one entry of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarksViolation {
    pub subject_id: Uuid,
    pub error: MarksError,
}

impl MarksViolation {
    /// Request field path, e.g. `marks.<subject_id>.max_marks`
    pub fn field(&self) -> String {
        format!("marks.{}.{}", self.subject_id, self.error.field())
    }
}

/// A sheet the submission will write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedSheet {
    pub subject_id: Uuid,
    pub scored: ScoredMarks,
}

/// Totals written to the exam result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExamTotals {
    pub total_marks: Decimal,
    pub max_possible_marks: Decimal,
    pub average_percentage: Decimal,
}

/// Every write a valid submission results in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkPlan {
    pub sheets: Vec<PlannedSheet>,
    /// None when no sheet is written
    pub totals: Option<ExamTotals>,
}

/// Validates a submission and plans its writes
///
/// Returns every violation found rather than stopping at the first one.
pub fn plan(entries: &BTreeMap<Uuid, SubjectMarks>) -> Result<BulkPlan, Vec<MarksViolation>> {
    let mut violations = Vec::new();
    let mut sheets = Vec::new();
    let mut tally = MarksTally::default();

    for (&subject_id, entry) in entries {
        let mut reject = |error| violations.push(MarksViolation { subject_id, error });

        let marks_ok = match entry.marks_obtained {
            Some(marks) => check_marks_obtained(marks).map_err(&mut reject).is_ok(),
            None => false,
        };
        let max_ok = match entry.max_marks {
            Some(max) => check_max_marks(max).map_err(&mut reject).is_ok(),
            None => false,
        };

        let (Some(marks), Some(max)) = (entry.marks_obtained, entry.max_marks) else {
            continue;
        };

        if !(marks_ok && max_ok) {
            continue;
        }

        match ScoredMarks::new(marks, max) {
            Ok(scored) => {
                tally.add(scored.marks_obtained, scored.max_marks);
                sheets.push(PlannedSheet { subject_id, scored });
            }
            Err(errors) => {
                for error in errors {
                    reject(error);
                }
            }
        }
    }

    if !violations.is_empty() {
        return Err(violations);
    }

    let totals = (tally.max_marks > Decimal::ZERO).then(|| ExamTotals {
        total_marks: tally.total_marks,
        max_possible_marks: tally.max_marks,
        average_percentage: tally.average_percentage(),
    });

    Ok(BulkPlan { sheets, totals })
}

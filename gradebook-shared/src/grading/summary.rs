/// Per-exam-type totals for one student's sheets
use rust_decimal::Decimal;
use serde::Serialize;

use super::MarksTally;
use crate::models::progress_sheet::{ExamType, ProgressSheet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExamSummary {
    pub exam_type: ExamType,
    pub total_marks: Decimal,
    pub max_marks: Decimal,
    pub subjects_count: usize,
    pub average_percentage: Decimal,
}

/// Groups sheets by exam type, in order of first appearance
pub fn summarize<'a>(sheets: impl IntoIterator<Item = &'a ProgressSheet>) -> Vec<ExamSummary> {
    let mut groups: Vec<(ExamType, MarksTally)> = Vec::new();

    for sheet in sheets {
        let index = match groups.iter().position(|(t, _)| *t == sheet.exam_type) {
            Some(index) => index,
            None => {
                groups.push((sheet.exam_type, MarksTally::default()));
                groups.len() - 1
            }
        };
        groups[index].1.add(sheet.marks_obtained, sheet.max_marks);
    }

    groups
        .into_iter()
        .map(|(exam_type, tally)| ExamSummary {
            exam_type,
            total_marks: tally.total_marks,
            max_marks: tally.max_marks,
            subjects_count: tally.count,
            average_percentage: tally.average_percentage(),
        })
        .collect()
}

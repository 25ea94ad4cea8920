/// Class ranking for one exam type
///
/// Each student with at least one sheet of the exam type gets a tally across
/// all of those sheets. Students are then ordered by average percentage,
/// highest first. The sort is stable, so students with equal averages keep
/// their input order (roll number order when fed from [`Student::list`]), and
/// ranks are plain 1-based positions: ties share no rank.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use super::MarksTally;
use crate::models::progress_sheet::{ExamType, ProgressSheet};
use crate::models::student::{ClassBatch, Student};

/// One row of the ranking table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedStudent {
    pub rank: usize,
    pub student_id: Uuid,
    pub full_name: String,
    pub roll_number: String,
    pub class_batch: ClassBatch,
    pub total_marks: Decimal,
    pub max_marks: Decimal,
    pub average_percentage: Decimal,
    pub subject_count: usize,
}

/// Ranks `students` by their sheets of `exam_type`
///
/// Sheets of other exam types are ignored, as are sheets whose student is not
/// in `students`.
pub fn rank_students(
    exam_type: ExamType,
    students: &[Student],
    sheets: &[ProgressSheet],
) -> Vec<RankedStudent> {
    let mut tallies: HashMap<Uuid, MarksTally> = HashMap::new();

    for sheet in sheets.iter().filter(|s| s.exam_type == exam_type) {
        tallies
            .entry(sheet.student_id)
            .or_default()
            .add(sheet.marks_obtained, sheet.max_marks);
    }

    let mut ranked: Vec<RankedStudent> = students
        .iter()
        .filter_map(|student| {
            let tally = tallies.get(&student.id)?;

            Some(RankedStudent {
                rank: 0,
                student_id: student.id,
                full_name: student.full_name.clone(),
                roll_number: student.roll_number.clone(),
                class_batch: student.class_batch,
                total_marks: tally.total_marks,
                max_marks: tally.max_marks,
                average_percentage: tally.average_percentage(),
                subject_count: tally.count,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.average_percentage.cmp(&a.average_percentage));

    for (position, row) in ranked.iter_mut().enumerate() {
        row.rank = position + 1;
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn student(roll_number: &str) -> Student {
        Student {
            id: Uuid::new_v4(),
            full_name: format!("Student {}", roll_number),
            email: format!("{}@example.com", roll_number.to_lowercase()),
            roll_number: roll_number.to_string(),
            class_batch: ClassBatch::FirstYear,
            date_of_birth: NaiveDate::from_ymd_opt(2006, 1, 1).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sheet(student: &Student, exam_type: ExamType, marks: i64, max: i64) -> ProgressSheet {
        ProgressSheet {
            id: Uuid::new_v4(),
            student_id: student.id,
            subject_id: Uuid::new_v4(),
            exam_type,
            exam_date: NaiveDate::from_ymd_opt(2024, 9, 15).unwrap(),
            marks_obtained: Decimal::from(marks),
            max_marks: Decimal::from(max),
            percentage: Decimal::ZERO,
            grade: "F".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_ties_keep_input_order() {
        let a = student("A01");
        let b = student("B01");
        let c = student("C01");

        let sheets = vec![
            sheet(&c, ExamType::Quarterly, 70, 100),
            sheet(&b, ExamType::Quarterly, 90, 100),
            sheet(&a, ExamType::Quarterly, 90, 100),
        ];

        let ranked = rank_students(ExamType::Quarterly, &[a.clone(), b.clone(), c.clone()], &sheets);

        let order: Vec<(usize, &str)> = ranked
            .iter()
            .map(|r| (r.rank, r.roll_number.as_str()))
            .collect();
        assert_eq!(order, vec![(1, "A01"), (2, "B01"), (3, "C01")]);
        assert_eq!(ranked[0].average_percentage, Decimal::from(90));
    }

    #[test]
    fn test_totals_across_subjects() {
        let a = student("A01");
        let sheets = vec![
            sheet(&a, ExamType::Midterm, 40, 50),
            sheet(&a, ExamType::Midterm, 30, 50),
        ];

        let ranked = rank_students(ExamType::Midterm, &[a], &sheets);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].total_marks, Decimal::from(70));
        assert_eq!(ranked[0].max_marks, Decimal::from(100));
        assert_eq!(ranked[0].average_percentage, Decimal::from(70));
        assert_eq!(ranked[0].subject_count, 2);
    }

    #[test]
    fn test_students_without_sheets_are_left_out() {
        let a = student("A01");
        let b = student("B01");
        let sheets = vec![
            sheet(&a, ExamType::Quarterly, 50, 100),
            sheet(&b, ExamType::Model, 99, 100),
        ];

        let ranked = rank_students(ExamType::Quarterly, &[a, b], &sheets);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].roll_number, "A01");
        assert_eq!(ranked[0].rank, 1);
    }

    #[test]
    fn test_higher_average_ranks_first() {
        let a = student("A01");
        let b = student("B01");
        let sheets = vec![
            sheet(&a, ExamType::EndTerm, 60, 100),
            sheet(&b, ExamType::EndTerm, 45, 50),
        ];

        let ranked = rank_students(ExamType::EndTerm, &[a, b], &sheets);

        assert_eq!(ranked[0].roll_number, "B01");
        assert_eq!(ranked[1].roll_number, "A01");
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(rank_students(ExamType::Quarterly, &[], &[]).is_empty());
    }
}

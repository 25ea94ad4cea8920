/// Grading rules
///
/// Everything here is pure computation over marks; database access lives in
/// [`crate::models`].
///
/// # Modules
///
/// - [`grade`]: Marks validation, percentage and letter grade
/// - [`ranking`]: Class ranking for one exam type
/// - [`bulk`]: Validation and planning of a bulk marks submission
/// - [`summary`]: Per-exam-type totals for one student

pub mod bulk;
pub mod grade;
pub mod ranking;
pub mod summary;

use rust_decimal::Decimal;

/// Running totals over a set of (marks, max) pairs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarksTally {
    pub total_marks: Decimal,
    pub max_marks: Decimal,
    pub count: usize,
}

impl MarksTally {
    pub fn add(&mut self, marks_obtained: Decimal, max_marks: Decimal) {
        self.total_marks += marks_obtained;
        self.max_marks += max_marks;
        self.count += 1;
    }

    /// Overall percentage, zero when nothing was counted
    pub fn average_percentage(&self) -> Decimal {
        grade::percentage(self.total_marks, self.max_marks)
    }
}

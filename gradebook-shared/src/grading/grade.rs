/// Percentage and letter grade for a single exam record
///
/// Marks are decimals with two fractional digits. A record is valid when
/// `0 <= marks_obtained <= max_marks <= 100` and `max_marks > 0`; anything else
/// is rejected before it can reach the database.
///
/// # Thresholds
///
/// | Percentage | Grade |
/// |------------|-------|
/// | >= 90      | A+    |
/// | >= 80      | A     |
/// | >= 70      | B+    |
/// | >= 60      | B     |
/// | >= 50      | C     |
/// | >= 40      | D     |
/// | otherwise  | F     |
///
/// # Example
///
/// ```
/// use gradebook_shared::grading::grade::{ScoredMarks, Grade};
/// use rust_decimal::Decimal;
///
/// let scored = ScoredMarks::new(Decimal::from(45), Decimal::from(50)).unwrap();
/// assert_eq!(scored.percentage, Decimal::from(90));
/// assert_eq!(scored.grade, Grade::APlus);
/// ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound for both marks obtained and max marks
pub const MARKS_CEILING: Decimal = Decimal::ONE_HUNDRED;

/// Fractional digits a marks column can store
pub const MARKS_DECIMAL_PLACES: u32 = 2;

/// Letter grade derived from a percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "F")]
    F,
}

impl Grade {
    /// Grade for a percentage in `[0, 100]`
    pub fn from_percentage(percentage: Decimal) -> Self {
        let thresholds = [
            (90, Grade::APlus),
            (80, Grade::A),
            (70, Grade::BPlus),
            (60, Grade::B),
            (50, Grade::C),
            (40, Grade::D),
        ];

        thresholds
            .into_iter()
            .find(|(floor, _)| percentage >= Decimal::from(*floor))
            .map(|(_, grade)| grade)
            .unwrap_or(Grade::F)
    }

    /// Stored representation (at most three characters)
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule broken by a (marks obtained, max marks) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MarksError {
    #[error("Marks obtained cannot be negative.")]
    NegativeMarks,

    #[error("Marks obtained cannot exceed 100.")]
    MarksAboveCeiling,

    #[error("Ensure that there are no more than 2 decimal places.")]
    MarksTooPrecise,

    #[error("Max marks must be greater than 0.")]
    NonPositiveMax,

    #[error("Max marks cannot exceed 100.")]
    MaxAboveCeiling,

    #[error("Ensure that there are no more than 2 decimal places.")]
    MaxTooPrecise,

    #[error("Marks obtained cannot be greater than max marks.")]
    MarksAboveMax,
}

impl MarksError {
    /// Request field the error belongs to
    pub fn field(&self) -> &'static str {
        match self {
            MarksError::NegativeMarks
            | MarksError::MarksAboveCeiling
            | MarksError::MarksTooPrecise
            | MarksError::MarksAboveMax => "marks_obtained",
            MarksError::NonPositiveMax | MarksError::MaxAboveCeiling | MarksError::MaxTooPrecise => {
                "max_marks"
            }
        }
    }
}

/// True when `value` has more fractional digits than the columns keep
///
/// Trailing zeros don't count, so `45.500` is fine.
fn exceeds_scale(value: Decimal) -> bool {
    value.normalize().scale() > MARKS_DECIMAL_PLACES
}

/// Range and precision check for marks obtained on its own
pub fn check_marks_obtained(marks: Decimal) -> Result<(), MarksError> {
    if marks < Decimal::ZERO {
        Err(MarksError::NegativeMarks)
    } else if marks > MARKS_CEILING {
        Err(MarksError::MarksAboveCeiling)
    } else if exceeds_scale(marks) {
        Err(MarksError::MarksTooPrecise)
    } else {
        Ok(())
    }
}

/// Range and precision check for max marks on its own
pub fn check_max_marks(max_marks: Decimal) -> Result<(), MarksError> {
    if max_marks <= Decimal::ZERO {
        Err(MarksError::NonPositiveMax)
    } else if max_marks > MARKS_CEILING {
        Err(MarksError::MaxAboveCeiling)
    } else if exceeds_scale(max_marks) {
        Err(MarksError::MaxTooPrecise)
    } else {
        Ok(())
    }
}

/// Validates a complete pair, reporting every broken rule
///
/// The `marks <= max` comparison only runs when both values are in range.
pub fn validate_marks(marks: Decimal, max_marks: Decimal) -> Result<(), Vec<MarksError>> {
    let mut errors = Vec::new();

    let marks_ok = check_marks_obtained(marks).map_err(|e| errors.push(e)).is_ok();
    let max_ok = check_max_marks(max_marks).map_err(|e| errors.push(e)).is_ok();

    if marks_ok && max_ok && marks > max_marks {
        errors.push(MarksError::MarksAboveMax);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `total / max * 100` rounded to two decimals, or zero when `max` is not positive
pub fn percentage(total: Decimal, max: Decimal) -> Decimal {
    if max <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    (total / max * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// A validated marks pair together with its derived percentage and grade
///
/// The only way to build one is [`ScoredMarks::new`], so holding a value
/// means the pair passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoredMarks {
    pub marks_obtained: Decimal,
    pub max_marks: Decimal,
    pub percentage: Decimal,
    pub grade: Grade,
}

impl ScoredMarks {
    /// Validates the pair and derives percentage and grade
    pub fn new(marks_obtained: Decimal, max_marks: Decimal) -> Result<Self, Vec<MarksError>> {
        validate_marks(marks_obtained, max_marks)?;

        let percentage = percentage(marks_obtained, max_marks);

        Ok(Self {
            marks_obtained,
            max_marks,
            percentage,
            grade: Grade::from_percentage(percentage),
        })
    }
}

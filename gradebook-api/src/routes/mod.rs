/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Signup, OTP verification, login and logout
/// - `dashboard`: Signed-in user and staff summary
/// - `students`: Student records
/// - `subjects`: Subject catalog
/// - `progress`: Progress sheets and bulk marks entry
/// - `ranking`: Student ranking per exam type

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod progress;
pub mod ranking;
pub mod students;
pub mod subjects;

use validator::ValidationError;

/// Rejects strings that are empty or only whitespace
///
/// The message comes from the field's `custom(..., message = ...)` attribute.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(not_blank("Algebra").is_ok());
        assert!(not_blank(" x ").is_ok());
        assert!(not_blank("").is_err());
        assert!(not_blank("   \t").is_err());
    }
}

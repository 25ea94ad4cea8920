/// One-time signup codes
///
/// A code is six digits drawn uniformly from `100000..=999999` and is valid for
/// ten minutes after it was stored. Only a user's latest code is ever checked.
///
/// # Example
///
/// ```
/// use gradebook_shared::auth::otp::{generate_code, is_expired};
/// use chrono::{Duration, Utc};
///
/// let code = generate_code();
/// assert_eq!(code.len(), 6);
///
/// let issued = Utc::now();
/// assert!(!is_expired(issued, issued + Duration::minutes(9)));
/// assert!(is_expired(issued, issued + Duration::minutes(11)));
/// ```

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::models::otp::OtpCode;

/// How long a code stays valid
pub const OTP_VALIDITY_MINUTES: i64 = 10;

/// Outcome of checking a submitted code against the latest stored one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpCheck {
    /// The code's validity window has passed
    Expired,

    /// The code matches and was not used before
    Accepted,

    /// Wrong code, or a code that was already used
    Rejected,
}

/// Draws a new six-digit code
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999u32).to_string()
}

/// A code created at `created_at` is expired once `now` is strictly past the window
pub fn is_expired(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now > created_at + Duration::minutes(OTP_VALIDITY_MINUTES)
}

/// Checks `submitted` against the user's latest code
///
/// Expiry wins over everything else; an expired code is never accepted even
/// when it matches.
pub fn check(latest: &OtpCode, submitted: &str, now: DateTime<Utc>) -> OtpCheck {
    if is_expired(latest.created_at, now) {
        return OtpCheck::Expired;
    }

    if !latest.is_verified && latest.code == submitted.trim() {
        OtpCheck::Accepted
    } else {
        OtpCheck::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn stored(code: &str, created_at: DateTime<Utc>, is_verified: bool) -> OtpCode {
        OtpCode {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            code: code.to_string(),
            is_verified,
            created_at,
        }
    }

    #[test]
    fn test_generated_codes_are_six_digits() {
        for _ in 0..1000 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert!(!code.starts_with('0'));
        }
    }

    #[test]
    fn test_expiry_window() {
        let issued = Utc::now();

        assert!(!is_expired(issued, issued + Duration::seconds(9 * 60 + 59)));
        assert!(!is_expired(issued, issued + Duration::minutes(10)));
        assert!(is_expired(issued, issued + Duration::seconds(10 * 60 + 1)));
    }

    #[test]
    fn test_matching_code_accepted() {
        let issued = Utc::now();
        let otp = stored("482913", issued, false);

        assert_eq!(check(&otp, "482913", issued + Duration::minutes(3)), OtpCheck::Accepted);
        assert_eq!(check(&otp, " 482913 ", issued), OtpCheck::Accepted);
    }

    #[test]
    fn test_wrong_code_rejected() {
        let issued = Utc::now();
        let otp = stored("482913", issued, false);

        assert_eq!(check(&otp, "482914", issued), OtpCheck::Rejected);
        assert_eq!(check(&otp, "", issued), OtpCheck::Rejected);
    }

    #[test]
    fn test_used_code_rejected() {
        let issued = Utc::now();
        let otp = stored("482913", issued, true);

        assert_eq!(check(&otp, "482913", issued), OtpCheck::Rejected);
    }

    #[test]
    fn test_expired_code_not_accepted_even_if_matching() {
        let issued = Utc::now();
        let otp = stored("482913", issued, false);

        assert_eq!(
            check(&otp, "482913", issued + Duration::seconds(10 * 60 + 1)),
            OtpCheck::Expired
        );
    }
}

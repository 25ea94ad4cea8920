/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength checks
/// - [`jwt`]: Access token generation and validation
/// - [`otp`]: Signup verification codes
/// - [`middleware`]: Bearer token authentication for axum handlers
///
/// # Example
///
/// ```no_run
/// use gradebook_shared::auth::password::{hash_password, verify_password};
/// use gradebook_shared::auth::jwt::{create_token, Claims};
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), Uuid::new_v4(), Duration::hours(24));
/// let token = create_token(&claims, "secret-key-that-is-at-least-32-bytes")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod otp;
pub mod password;

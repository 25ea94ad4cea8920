/// Authentication endpoints
///
/// Accounts are created unverified and activated by the OTP emailed at signup.
/// Verification and login both open a session and return an access token.
///
/// # Endpoints
///
/// - `POST /v1/auth/signup` - Register and receive an OTP by email
/// - `POST /v1/auth/verify-otp/:user_id` - Confirm the OTP
/// - `POST /v1/auth/resend-otp/:user_id` - Issue a fresh OTP
/// - `POST /v1/auth/login` - Login and get a token
/// - `POST /v1/auth/logout` - End the current session

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use gradebook_shared::{
    auth::{
        jwt,
        middleware::AuthContext,
        otp::{self, OtpCheck},
        password,
    },
    mail::otp_email,
    models::{
        otp::OtpCode,
        session::Session,
        user::{is_valid_username, CreateUser, User},
    },
};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Ensure this value has at most 254 characters.")
    )]
    pub email: String,

    #[validate(
        length(
            min = 1,
            max = 150,
            message = "Username must be between 1 and 150 characters."
        ),
        custom(
            function = "username_shape",
            message = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
        )
    )]
    pub username: String,

    pub password: String,

    /// Must repeat `password`
    pub password_confirm: String,
}

fn username_shape(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || is_valid_username(value) {
        Ok(())
    } else {
        Err(ValidationError::new("username"))
    }
}

/// Signup response
#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub user_id: Uuid,
    pub email: String,
    pub message: String,
}

/// OTP verification request
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub otp: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    pub password: String,
}

/// Returned when a session is opened
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub username: String,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub message: String,
}

/// Plain acknowledgement
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Opens a session for `user` and signs its token
async fn open_session(
    executor: impl PgExecutor<'_>,
    state: &AppState,
    user: &User,
    message: String,
) -> ApiResult<SessionResponse> {
    let session = Session::create(executor, user.id, state.config.session_ttl()).await?;

    let claims = jwt::Claims::new(user.id, session.id, state.config.session_ttl());
    let access_token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(SessionResponse {
        user_id: user.id,
        username: user.username.clone(),
        access_token,
        expires_at: session.expires_at,
        message,
    })
}

/// Register a new, unverified account
///
/// Stores the user and a fresh OTP in one transaction, then emails the code.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/signup
/// Content-Type: application/json
///
/// {
///   "email": "teacher@example.com",
///   "username": "teacher",
///   "password": "ledger-maple-42",
///   "password_confirm": "ledger-maple-42"
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed or email or username already in use
///   (nothing is created and no email is sent)
/// - `502 Bad Gateway`: The email could not be sent; the account stays
///   unverified and a new code can be requested with resend-otp
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<SignupResponse>)> {
    req.validate()?;

    let mut details = Vec::new();

    if req.password != req.password_confirm {
        details.push(ValidationErrorDetail::new(
            "password_confirm",
            "The two password fields didn't match.",
        ));
    }

    if let Err(message) = password::validate_password_strength(&req.password, &req.username, &req.email) {
        details.push(ValidationErrorDetail::new("password", message));
    }

    if !details.is_empty() {
        return Err(ApiError::ValidationError(details));
    }

    if User::email_exists(&state.db, &req.email).await? {
        return Err(ApiError::invalid("email", "This email address is already in use."));
    }

    if User::username_exists(&state.db, &req.username).await? {
        return Err(ApiError::invalid(
            "username",
            "A user with that username already exists.",
        ));
    }

    let password_hash = password::hash_password(&req.password)?;
    let code = otp::generate_code();

    let mut tx = state.db.begin().await?;

    let user = User::create(
        &mut *tx,
        CreateUser {
            email: req.email.clone(),
            username: req.username.clone(),
            password_hash,
            is_verified: false,
            is_staff: false,
        },
    )
    .await?;

    OtpCode::create(&mut *tx, user.id, &code).await?;

    tx.commit().await?;

    tracing::info!(user_id = %user.id, "User signed up, sending OTP");

    state
        .mailer
        .send(&otp_email(&user.email, &user.username, &code))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user_id: user.id,
            email: user.email,
            message: format!(
                "Welcome {}! Please check your email for the verification code.",
                user.username
            ),
        }),
    ))
}

/// Confirm the OTP sent at signup
///
/// Only the latest code counts. An expired code deletes the unverified account.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/verify-otp/:user_id
/// Content-Type: application/json
///
/// { "otp": "482913" }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: Unknown user, or no OTP was ever issued
/// - `409 Conflict`: Account already verified
/// - `410 Gone`: OTP expired; the account has been deleted
/// - `422 Unprocessable Entity`: Wrong code (may be retried)
pub async fn verify_otp(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<VerifyOtpRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invalid user.".to_string()))?;

    if user.is_verified {
        return Err(ApiError::Conflict("Your account is already verified.".to_string()));
    }

    let latest = OtpCode::latest_for_user(&state.db, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No OTP found. Please register again.".to_string()))?;

    match otp::check(&latest, &req.otp, Utc::now()) {
        OtpCheck::Expired => {
            User::delete(&state.db, user.id).await?;
            tracing::info!(user_id = %user.id, "OTP expired, unverified user deleted");

            Err(ApiError::Gone("OTP has expired. Please register again.".to_string()))
        }
        OtpCheck::Rejected => {
            tracing::debug!(user_id = %user.id, "Invalid OTP submitted");
            Err(ApiError::invalid("otp", "Invalid OTP. Please try again."))
        }
        OtpCheck::Accepted => {
            let mut tx = state.db.begin().await?;

            // A concurrent request may have consumed the code first
            if !OtpCode::mark_verified(&mut *tx, latest.id).await? {
                return Err(ApiError::Conflict("Your account is already verified.".to_string()));
            }
            User::mark_verified(&mut *tx, user.id).await?;
            User::update_last_login(&mut *tx, user.id).await?;

            let response = open_session(
                &mut *tx,
                &state,
                &user,
                "Your account has been verified successfully!".to_string(),
            )
            .await?;

            tx.commit().await?;

            tracing::info!(user_id = %user.id, "User verified");

            Ok(Json(response))
        }
    }
}

/// Issue and email a fresh OTP for an unverified account
///
/// The new code supersedes earlier ones and gets its own ten-minute window.
///
/// # Errors
///
/// - `404 Not Found`: Unknown user
/// - `409 Conflict`: Account already verified
/// - `502 Bad Gateway`: The email could not be sent
pub async fn resend_otp(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invalid user.".to_string()))?;

    if user.is_verified {
        return Err(ApiError::Conflict("Your account is already verified.".to_string()));
    }

    let code = otp::generate_code();
    OtpCode::create(&state.db, user.id, &code).await?;

    state
        .mailer
        .send(&otp_email(&user.email, &user.username, &code))
        .await?;

    tracing::info!(user_id = %user.id, "OTP reissued");

    Ok(Json(MessageResponse {
        message: "A new verification code has been sent to your email.".to_string(),
    }))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// { "email": "teacher@example.com", "password": "ledger-maple-42" }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials
/// - `403 Forbidden`: Email not verified yet
/// - `422 Unprocessable Entity`: Validation failed
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password.".to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("Invalid email or password.".to_string()));
    }

    if !user.is_verified {
        return Err(ApiError::Forbidden(
            "Please verify your email address before logging in.".to_string(),
        ));
    }

    Session::purge_expired(&state.db, user.id).await?;
    User::update_last_login(&state.db, user.id).await?;

    let message = format!("Welcome back, {}!", user.username);
    let response = open_session(&state.db, &state, &user, message).await?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(response))
}

/// End the current session
///
/// The token used for this request stops working immediately.
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<MessageResponse>> {
    Session::delete(&state.db, auth.session_id).await?;

    tracing::info!(user_id = %auth.user_id, "User logged out");

    Ok(Json(MessageResponse {
        message: "You have been logged out.".to_string(),
    }))
}

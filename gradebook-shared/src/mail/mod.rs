/// Outgoing email
///
/// Mail is sent inline from request handlers through the [`Mailer`] trait. A
/// failed send is reported to the caller and never retried.
///
/// # Transports
///
/// - [`LogMailer`]: writes messages to the log (development default)
/// - [`http::HttpMailer`]: posts messages to an HTTP mail API
///
/// # Example
///
/// ```
/// use gradebook_shared::mail::{otp_email, LogMailer, Mailer};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mailer = LogMailer::new("noreply@gradebook.local");
/// mailer.send(&otp_email("teacher@example.com", "teacher", "482913")).await?;
/// # Ok(())
/// # }
/// ```

pub mod http;

use async_trait::async_trait;
use serde::Serialize;

use crate::auth::otp::OTP_VALIDITY_MINUTES;

/// Subject line of the signup verification email
pub const OTP_EMAIL_SUBJECT: &str = "Your OTP Verification Code";

/// Error type for mail delivery
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// The transport could not reach the mail service
    #[error("Mail transport failed: {0}")]
    Transport(String),

    /// The mail service refused the message
    #[error("Mail service rejected the message: {0}")]
    Rejected(String),
}

/// A message ready to send
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// Mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers one message
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Transport that only logs what it would send
#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        tracing::info!(
            from = %self.from,
            to = %email.to,
            subject = %email.subject,
            body = %email.text_body,
            "Email (log transport)"
        );

        Ok(())
    }
}

/// Escapes text for use inside an HTML element or quoted attribute
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }

    escaped
}

/// Builds the signup verification email for `code`
pub fn otp_email(to: &str, username: &str, code: &str) -> OutgoingEmail {
    let text_body = format!(
        "Hello {username},\n\n\
         Your verification code is: {code}\n\n\
         This code expires in {OTP_VALIDITY_MINUTES} minutes. \
         If you did not sign up, you can ignore this email.\n"
    );

    let html_body = format!(
        "<html><body>\
         <p>Hello {username},</p>\
         <p>Your verification code is:</p>\
         <h2 style=\"letter-spacing: 4px;\">{code}</h2>\
         <p>This code expires in {OTP_VALIDITY_MINUTES} minutes. \
         If you did not sign up, you can ignore this email.</p>\
         </body></html>",
        username = escape_html(username)
    );

    OutgoingEmail {
        to: to.to_string(),
        subject: OTP_EMAIL_SUBJECT.to_string(),
        html_body,
        text_body,
    }
}

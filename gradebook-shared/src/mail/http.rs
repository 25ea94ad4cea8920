/// HTTP mail API transport
///
/// Posts each message as JSON to a configured endpoint with a bearer API key:
///
/// ```json
/// {
///   "from": "noreply@gradebook.local",
///   "to": ["teacher@example.com"],
///   "subject": "Your OTP Verification Code",
///   "html": "<html>...</html>",
///   "text": "Hello ..."
/// }
/// ```
///
/// Any non-2xx response is a failure.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use super::{MailError, Mailer, OutgoingEmail};

const REQUEST_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Serialize)]
struct MailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

/// Mail transport backed by an HTTP API
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    /// Creates a transport posting to `endpoint`
    ///
    /// # Errors
    ///
    /// Returns `MailError::Transport` if the HTTP client can't be built.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
    ) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .build()
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            from: from.into(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let request = MailRequest {
            from: &self.from,
            to: [email.to.as_str()],
            subject: &email.subject,
            html: &email.html_body,
            text: &email.text_body,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Mail API rejected message");
            return Err(MailError::Rejected(format!("status {}", status)));
        }

        tracing::debug!(to = %email.to, "Email sent");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let email = super::super::otp_email("teacher@example.com", "teacher", "482913");
        let request = MailRequest {
            from: "noreply@gradebook.local",
            to: [email.to.as_str()],
            subject: &email.subject,
            html: &email.html_body,
            text: &email.text_body,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["to"][0], "teacher@example.com");
        assert_eq!(json["from"], "noreply@gradebook.local");
        assert_eq!(json["subject"], "Your OTP Verification Code");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let mailer = HttpMailer::new("http://127.0.0.1:9/send", "key", "noreply@gradebook.local")
            .unwrap();
        let email = super::super::otp_email("teacher@example.com", "teacher", "482913");

        let result = mailer.send(&email).await;
        assert!(matches!(result, Err(MailError::Transport(_))));
    }
}

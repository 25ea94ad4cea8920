/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, or `*` (default: *)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for token signing (required, at least 32 characters)
/// - `SESSION_TTL_HOURS`: Login session lifetime (default: 24)
/// - `MAIL_TRANSPORT`: `log` or `http` (default: log)
/// - `MAIL_API_URL`, `MAIL_API_KEY`: HTTP mail API endpoint and key (required for `http`)
/// - `MAIL_FROM`: Sender address (default: noreply@gradebook.local)
/// - `ADMIN_EMAIL`, `ADMIN_USERNAME`, `ADMIN_PASSWORD`: Optional staff account created at startup
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use gradebook_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT and session configuration
    pub jwt: JwtConfig,

    /// Outgoing mail configuration
    pub mail: MailConfig,

    /// Staff account to create at startup, if any
    pub admin: Option<AdminConfig>,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins (`*` allows any)
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Lifetime of a login session and its token, in hours
    pub session_ttl_hours: i64,
}

/// How outgoing mail is delivered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailTransport {
    /// Write messages to the log
    Log,

    /// Post messages to an HTTP mail API
    Http { api_url: String, api_key: String },
}

/// Mail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub transport: MailTransport,

    /// Sender address
    pub from: String,
}

/// Staff account bootstrap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;
        let cors_origins = parse_origins(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse::<i64>()?;

        if session_ttl_hours <= 0 {
            anyhow::bail!("SESSION_TTL_HOURS must be positive");
        }

        let transport = match env::var("MAIL_TRANSPORT").as_deref() {
            Err(_) | Ok("log") => MailTransport::Log,
            Ok("http") => MailTransport::Http {
                api_url: env::var("MAIL_API_URL").map_err(|_| {
                    anyhow::anyhow!("MAIL_API_URL is required when MAIL_TRANSPORT=http")
                })?,
                api_key: env::var("MAIL_API_KEY").map_err(|_| {
                    anyhow::anyhow!("MAIL_API_KEY is required when MAIL_TRANSPORT=http")
                })?,
            },
            Ok(other) => anyhow::bail!("Unknown MAIL_TRANSPORT: {}", other),
        };

        let mail_from =
            env::var("MAIL_FROM").unwrap_or_else(|_| "noreply@gradebook.local".to_string());

        let admin = match (
            env::var("ADMIN_EMAIL"),
            env::var("ADMIN_USERNAME"),
            env::var("ADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(username), Ok(password)) => Some(AdminConfig {
                email,
                username,
                password,
            }),
            (Err(_), Err(_), Err(_)) => None,
            _ => anyhow::bail!(
                "ADMIN_EMAIL, ADMIN_USERNAME and ADMIN_PASSWORD must be set together"
            ),
        };

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                session_ttl_hours,
            },
            mail: MailConfig {
                transport,
                from: mail_from,
            },
            admin,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Session lifetime as a duration
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.jwt.session_ttl_hours)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                session_ttl_hours: 24,
            },
            mail: MailConfig {
                transport: MailTransport::Log,
                from: "noreply@gradebook.local".to_string(),
            },
            admin: None,
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_session_ttl() {
        assert_eq!(config().session_ttl(), chrono::Duration::hours(24));
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("https://a.example, https://b.example,,"),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert_eq!(parse_origins("*"), vec!["*".to_string()]);
    }
}

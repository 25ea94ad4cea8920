/// Middleware modules for the API server
///
/// - `auth`: Login and staff checks for protected route groups

pub mod auth;

/// Database models for Gradebook
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: Staff accounts
/// - `otp`: Signup verification codes
/// - `session`: Login sessions backing access tokens
/// - `student`: Student records
/// - `subject`: Subjects marks are recorded in
/// - `progress_sheet`: Per-subject exam marks with derived percentage and grade
/// - `exam_result`: Per-exam totals written by bulk entry

pub mod exam_result;
pub mod otp;
pub mod progress_sheet;
pub mod session;
pub mod student;
pub mod subject;
pub mod user;

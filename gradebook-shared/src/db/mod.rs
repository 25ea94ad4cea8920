/// Database layer for Gradebook
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: Embedded schema migrations
///
/// Models and their queries live in the `models` module at crate root level.

pub mod migrations;
pub mod pool;

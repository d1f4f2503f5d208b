/// Document-store access layer
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with startup health check
/// - `migrations`: embedded migration runner
///
/// The models in the crate-level `models` module perform all reads and
/// writes through the pool created here.
pub mod migrations;
pub mod pool;

//! Database utilities

pub mod pool;

pub use pool::{create_pool, DatabaseConfig};

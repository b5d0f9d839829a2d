pub mod backend;
pub mod queries;
pub mod schema;
pub mod source_impl;

pub use backend::DuckDbBackend;

/// Re-export the `duckdb` crate so consumers (especially tests) can use
/// `impactlytics_duckdb::duckdb::params!` without an extra dependency.
pub use duckdb;

//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the AccountStore port
//! - An in-memory AccountStore for tests and embedding

pub mod duckdb;
pub mod memory;

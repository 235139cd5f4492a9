//! Repositories for the data access layer.

pub mod rate_limit;

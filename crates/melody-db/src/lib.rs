//! Melody persistence layer
//!
//! Rate limit counters live behind the [`RateLimitStore`] trait so the limiter does
//! not care whether they are kept in PostgreSQL or in process memory.

pub mod db;

pub use db::rate_limit::{
    create_rate_limit_store, InMemoryRateLimitStore, PgRateLimitStore, RateLimitStore,
};

//! Melody API Library
//!
//! HTTP entry point of the download service: handlers, request extractors and
//! application setup.

pub mod api_doc;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod utils;

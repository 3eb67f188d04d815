//! # mast-core
//!
//! Core types for the Mast test automation engine.
//!
//! Mast runs suites of independent scenarios. Each scenario fetches one
//! resource (an HTML page, a JSON document, media, a stylesheet, a live
//! browser page) and asserts against it through one uniform chainable
//! API. This crate holds the types every layer shares:
//!
//! - The unified error type for usage and configuration mistakes
//! - The timestamped pass/fail/comment log records scenarios accumulate
//! - The response-kind table that tells each layer what a given resource
//!   supports
//! - Suite-level configuration defaults

mod config;
mod error;
mod types;

pub use config::SuiteConfig;
pub use error::{MastError, Result};
pub use types::{LogLine, LogType, ResponseKind};

//! Utilities - error type and logging
//!
//! - [`AppError`] / [`AppResult`] - application errors
//! - [`logger`] - tracing setup

pub mod error;
pub mod logger;

pub use error::{AppError, AppResult, ErrorBody};

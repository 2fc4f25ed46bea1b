//! Progress estimation
//!
//! Turns successive task snapshots into transfer speed and time remaining.

#![warn(missing_docs)]

pub mod estimator;
pub mod format;

pub use estimator::{ProgressEstimator, ProgressView, SpeedSample, Estimate};
pub use format::{format_speed, format_eta, format_bytes, format_transferred, UNKNOWN};

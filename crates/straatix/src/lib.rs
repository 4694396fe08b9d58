//! Candidate-facing application workflows for the Straatix Partners careers site.

pub mod applications;
pub mod candidates;
pub mod config;
pub mod error;
pub mod jobs;
pub mod telemetry;

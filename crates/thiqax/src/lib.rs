//! Document verification and KYC reconciliation core for the ThiQaX recruitment platform.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;

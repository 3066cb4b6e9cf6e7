//! Risk scoring and fraud screening for Maiyya Samman Yojna benefit applications.

pub mod applications;
pub mod config;
pub mod error;
pub mod telemetry;

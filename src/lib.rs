//! hireflow — applicant status workflow engine and its HTTP shell.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;

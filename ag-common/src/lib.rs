//! Shared configuration, logging, and pseudonymous-identity helpers.
//!
//! Plays the role the teacher's `common` crate plays for the API crate,
//! but shaped for this workspace's env surface (spec.md §6).

pub mod config;
pub mod hash;
pub mod logger;

pub use config::{Config, GradingMode};

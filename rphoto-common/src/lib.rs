//! # rphoto Common Library
//!
//! Shared code for the race photo manifest tools:
//! - Error and result types
//! - TOML bootstrap configuration
//! - Vendor timestamp normalization (fixed UTC+8 epoch rendering)
//! - Scoped atomic JSON persistence

pub mod config;
pub mod error;
pub mod fs;
pub mod time;

pub use error::{Error, Result};

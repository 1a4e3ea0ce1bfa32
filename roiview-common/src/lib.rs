//! # roiview common library
//!
//! Shared code for the roiview export backend:
//! - Error type
//! - Configuration resolution
//! - Read-only database access (models and queries)
//! - ROI geometry (parsing, translation, bounding boxes)

pub mod config;
pub mod db;
pub mod error;
pub mod roi;

pub use error::{Error, Result};

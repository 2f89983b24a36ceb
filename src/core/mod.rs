//! Core module - Shared building blocks
//!
//! This module provides:
//! - Error types
//! - The clock used for expiration
//! - Store configuration
//! - Directory normalization and validation
//! - Result model and rendering for CLI output

pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod paths;
pub mod render;

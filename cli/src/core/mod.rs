//! # pubstream Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! ## Overview
//!
//! This module aggregates the infrastructure shared by every command:
//! - `config`: Configuration loading, merging, and validation
//! - `error`: Error types, the `Result` alias, and exit status mapping
//!
//! ```rust
//! use crate::core::config;
//! use crate::core::error::{Result, StreamError};
//! ```
//!
pub mod config;
pub mod error;

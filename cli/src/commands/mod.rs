//! # pubstream Command Modules
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! One module per subcommand. Each defines its `clap` arguments struct and a
//! `handle_*` function that `main.rs` routes to.
//!
//! - `apply`: Parse a publication stream and write its files under a root.
//! - `pack`: Archive an existing root.
//!

/// `pubstream apply`: materialize a stream.
pub mod apply;
/// `pubstream pack`: archive a root directory.
pub mod pack;

//! # Wave Tools
//!
//! Command-line support for the wave simulation:
//! - Config validation (`validate`)
//! - Headless runs with straight-line movement (`runner`)

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod runner;
pub mod validate;

pub use validate::{load_config, ToolError};

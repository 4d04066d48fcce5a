//! Error handling utilities
//!
//! `warden-cli`'s `scenario_file` loader uses [`ErrorContext`] to describe
//! which step of loading an operator-supplied scenario file failed (reading
//! the file vs. parsing it as JSON), then renders the result with
//! [`format_error_chain`] before converting it to the CLI's `anyhow::Error`.
//!
//! # Example
//!
//! ```rust,ignore
//! use warden_tooling::error::{ErrorContext, format_error_chain};
//!
//! fn load_scenario_file(path: &str) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
//!     std::fs::read_to_string(path)
//!         .with_context(|| format!("reading scenario file '{path}'"))
//! }
//!
//! match load_scenario_file("scenario.json") {
//!     Err(e) => eprintln!("{}", format_error_chain(&*e)),
//!     Ok(_) => println!("loaded"),
//! }
//! ```

mod context;

pub use context::{error_chain_length, format_error_chain, root_cause, ErrorContext};

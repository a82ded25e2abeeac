//! Core infrastructure: runtime settings and status output.

pub mod config;
pub mod output;

pub use config::FetchSettings;

/// domainlens - certificate-transparency history and domain suggestions
///
/// This library provides the lookup logic behind the `domainlens` binary:
/// merging exact and wildcard certificate searches into one timeline,
/// popularity-ranked autocomplete with label-stripping fallback, and
/// fire-and-forget lookup recording.
pub mod analytics;
pub mod certs;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod formatting;
pub mod internal_metrics;
pub mod recorder;
pub mod server;
pub mod services;
pub mod suggest;

// Re-export core types for convenience
pub use core::*;

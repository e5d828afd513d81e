//! CLI argument model for the A2P 10DLC dashboard binary.
//!
//! Exposes the clap-backed flag surface plus the value parsers that bound
//! pagination, sampling, and retry settings.

pub mod cli_args;

pub use cli_args::Cli;

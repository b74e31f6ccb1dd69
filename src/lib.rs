//! Core library for the `pacer` CLI.
//!
//! `pacer` issues HTTP GET requests against a single URL at a fixed rate for
//! a fixed duration, bounded by a concurrency limit, and reports how many
//! succeeded and failed. The library holds the building blocks the binary
//! wires together: argument and config types, the transport seam and the
//! dispatcher, counters, and progress/summary output.
pub mod args;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod shutdown;
pub mod ui;

//! Benchmark utilities for the broadcaster.
//!
//! - **Fan-out scenarios**: register, trigger and join N listeners
//! - **Latency**: trigger-to-join timing of a single session
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench -p rusty_bench
//!
//! # Run a single group
//! cargo bench -p rusty_bench -- owned
//! ```
//!
//! Results are written to `target/criterion/` with HTML reports.

pub mod latency;
pub mod scenarios;

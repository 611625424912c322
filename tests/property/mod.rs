//! Property-based tests for the offline-resilience components.
//!
//! Run with: cargo test --test property_tests

pub mod cache;
pub mod mutation_queue;
pub mod report_queue;

//! # fragmesh Parallel
//!
//! Processing modes for per-region work.
//!
//! This crate provides:
//! - `ProcessingMode`: sequential, all cores, or a fixed thread count
//! - `ParallelStrategy`: index-range map over the chosen mode
//!
//! Without the `parallel` feature every mode runs sequentially.

pub mod strategy;

pub use strategy::{num_cpus, ParallelStrategy, ProcessingMode};

//! Resource allocation graph generator and benchmark utilities.
//!
//! This crate provides deterministic generation of large RAGs with a known
//! number of deadlock cycles, for benchmarking and invariant testing of
//! `ragsim-core`.

pub mod correctness;
pub mod generator;

pub use generator::{GeneratedRag, GeneratorConfig, SizeTier, generate_rag};

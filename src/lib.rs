//! Sequential batch driver for the NORA3 time-series extractor.

pub mod batch;
pub mod config;
pub mod task;
pub mod tool;
pub mod variables;

//! Core library: metadata date extraction, placement, walking, pipeline.

pub mod config;
pub mod extractor;
pub mod models;
pub mod pipeline;
pub mod placement;
pub mod scanner;

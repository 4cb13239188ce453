//! Data models shared across the pipeline.

pub mod company;
pub mod config;
pub mod geometry;
pub mod record;

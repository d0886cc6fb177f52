//! Core domain types and logic.

pub mod analysis;
pub mod bar;
pub mod error;
pub mod indicator;
pub mod pattern;
pub mod pipeline;
pub mod position;
pub mod session;
pub mod signal;
pub mod stats;
pub mod sweep;

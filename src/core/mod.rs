//! Core business logic modules.

pub mod executor;
pub mod source;
pub mod splitter;

//! Output generators.

pub mod table;

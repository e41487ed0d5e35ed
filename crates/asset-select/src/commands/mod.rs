//! CLI command implementations.

pub mod check;
pub mod fmt;
pub mod resolve;
pub mod tree;

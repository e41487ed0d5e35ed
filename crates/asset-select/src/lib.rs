//! Asset Select - command-line front end for asset selection strings.
//!
//! The binary parses, formats and resolves selection strings against graph
//! snapshots on disk. This library holds the pieces the binary and its tests
//! share: configuration, snapshot loading and output rendering.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod render;
pub mod snapshot;

pub use error::{Error, Result};

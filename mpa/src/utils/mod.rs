//! Utility functions and supporting infrastructure.
//!
//! Provides bit-level reading, error types and the byte storage abstraction
//! the stream model is built on.

pub mod bitstream_io;
pub mod errors;
pub mod store;

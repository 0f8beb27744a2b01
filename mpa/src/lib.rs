//! Frame-accurate model of MPEG audio (MP1/MP2/MP3) elementary streams.
//!
//! ## Technical Overview
//!
//! An elementary stream is a run of self-contained frames, each introduced by
//! a 32-bit header carrying an 11-bit sync word. Files usually wrap the frames
//! in metadata: ID3v2 or APE tags in front, ID3v1 or APE tags behind. This
//! crate locates the frames without interpreting the tags.
//!
//! ### Synchronization
//!
//! A candidate sync position is only accepted when its header decodes and a
//! second header decodes immediately after the candidate frame. Corrupted
//! frames inside the stream cost one resynchronization hop instead of
//! aborting the scan.
//!
//! ### Editing
//!
//! [`Stream`](process::stream::Stream) removes, appends and trims whole frames
//! and strips the non-frame regions around them. The frame offset and timing
//! index is rebuilt from the bytes after every structural edit.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mpa::process::stream::Stream;
//!
//! let data = std::fs::read("input.mp3")?;
//! let mut stream = Stream::from_bytes(data);
//!
//! println!("{} frames, {:.3} s", stream.frame_count(), stream.total_duration());
//!
//! // Keep the last 30 seconds without any tags
//! stream.strip_tags();
//! stream.trim(-30.0, 0.0);
//!
//! std::fs::write("output.mp3", stream.close())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Frame synchronization, indexing and stream editing.
///
/// 1. **Sync search** ([`process::sync`]): verified frame start detection.
/// 2. **Index** ([`process::index`]): frame offsets and cumulative timings.
/// 3. **Stream** ([`process::stream`]): frame-level reads and edits.
pub mod process;

/// Data structures representing stream components.
///
/// - **Frame Header** ([`structs::header`]): decoded 32-bit frame header
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level reading
/// - **Error Handling** ([`utils::errors`]): Error types
/// - **Storage** ([`utils::store`]): Byte storage backends
pub mod utils;

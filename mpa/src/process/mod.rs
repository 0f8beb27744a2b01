use crate::structs::header::{FrameHeader, HEADER_LEN};
use crate::utils::errors::HeaderError;

/// Frame synchronization and header lookup over a byte store.
///
/// Provides [`find_frame_start`](sync::find_frame_start), the verified sync
/// search used to skip tags and recover from corruption.
pub mod sync;

/// Frame offset and timing index.
///
/// Provides [`FrameIndex`](index::FrameIndex), the lazily built table of frame
/// offsets and cumulative durations.
pub mod index;

/// Editable MPEG audio stream.
///
/// Provides [`Stream`](stream::Stream) with frame-level read, remove, append,
/// trim and tag stripping operations.
pub mod stream;

/// MPEG-1 Layer III, 128 kbps, 44.1 kHz, stereo, no padding. 417-byte frames.
pub const EXAMPLE_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x00];

/// Builds one complete frame for `header`.
///
/// The payload is a deterministic byte pattern that never contains the sync
/// byte, seeded with `seed` so consecutive frames differ.
///
/// # Example
///
/// ```rust
/// use mpa::process::{EXAMPLE_HEADER, synth_frame};
///
/// let frame = synth_frame(EXAMPLE_HEADER, 0)?;
/// assert_eq!(frame.len(), 417);
/// assert_eq!(&frame[..4], &EXAMPLE_HEADER);
/// # Ok::<(), mpa::utils::errors::HeaderError>(())
/// ```
pub fn synth_frame(header: [u8; 4], seed: usize) -> Result<Vec<u8>, HeaderError> {
    let length = FrameHeader::try_parse(&header, 0)?.length;

    let mut frame = Vec::with_capacity(length);
    frame.extend_from_slice(&header);
    frame.extend((HEADER_LEN..length).map(|i| ((i * 37 + seed * 11 + 123) % 251) as u8));

    Ok(frame)
}

/// Concatenates `count` frames built by [`synth_frame`], seeded by position.
pub fn synth_stream(header: [u8; 4], count: usize) -> Result<Vec<u8>, HeaderError> {
    let mut data = Vec::new();
    for seed in 0..count {
        data.extend(synth_frame(header, seed)?);
    }

    Ok(data)
}

#[test]
fn synth_payload_has_no_sync_byte() -> Result<(), HeaderError> {
    let data = synth_stream(EXAMPLE_HEADER, 8)?;

    assert_eq!(data.len(), 8 * 417);
    let sync_positions: Vec<usize> = data
        .iter()
        .enumerate()
        .filter(|&(_, &byte)| byte == 0xFF)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(sync_positions, (0..8).map(|i| i * 417).collect::<Vec<_>>());
    Ok(())
}

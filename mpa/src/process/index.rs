use std::borrow::Cow;

use log::{debug, trace, warn};

use crate::process::sync::{find_frame_start, read_header};
use crate::utils::store::ByteStore;

/// Frame offsets and cumulative timings found by one full scan.
///
/// `offsets[i]` is the absolute position of frame `i`, strictly increasing.
/// `timings[i]` is the playback time in seconds through the end of frame `i`,
/// non-decreasing. Both always have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameTables {
    offsets: Vec<usize>,
    timings: Vec<f64>,
    resyncs: usize,
    skipped_bytes: usize,
}

impl FrameTables {
    /// Scans the whole store.
    ///
    /// Starts at the first verified frame and walks frame by frame. A header
    /// that fails to decode costs one resynchronization hop; the scan ends when
    /// no verified frame remains.
    pub fn build<S: ByteStore + ?Sized>(store: &S) -> Self {
        let mut tables = Self::default();

        let Some(mut offset) = find_frame_start(store, 0) else {
            debug!("No MPEG audio frames in {} bytes", store.len());
            return tables;
        };

        if offset > 0 {
            debug!("First frame at byte {offset}");
        }

        let mut elapsed = 0.0;
        loop {
            match read_header(store, offset) {
                Ok(header) => {
                    elapsed += header.duration;
                    tables.push(header.offset, elapsed);
                    offset = header.end();
                }
                Err(err) => {
                    trace!("No frame at byte {offset}: {err}");

                    let Some(next) = find_frame_start(store, offset) else {
                        debug!(
                            "End of frames at byte {offset}, {} trailing bytes",
                            store.len().saturating_sub(offset)
                        );
                        break;
                    };

                    warn!(
                        "Lost sync at byte {offset}, resynchronized at byte {next} ({} bytes skipped)",
                        next - offset
                    );
                    tables.resyncs += 1;
                    tables.skipped_bytes += next - offset;
                    offset = next;
                }
            }
        }

        debug!(
            "Indexed {} frames, {:.3} s, {} resyncs",
            tables.len(),
            elapsed,
            tables.resyncs
        );

        tables
    }

    fn push(&mut self, offset: usize, timing: f64) {
        debug_assert!(
            self.offsets.last().is_none_or(|&last| last < offset),
            "frame offsets must be strictly increasing"
        );
        debug_assert!(
            self.timings.last().is_none_or(|&last| last <= timing),
            "frame timings must be non-decreasing"
        );

        self.offsets.push(offset);
        self.timings.push(timing);
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn timings(&self) -> &[f64] {
        &self.timings
    }

    /// Seconds through the end of the last frame.
    pub fn total_duration(&self) -> f64 {
        self.timings.last().copied().unwrap_or(0.0)
    }

    /// Interior resynchronization hops taken during the scan.
    pub fn resyncs(&self) -> usize {
        self.resyncs
    }

    /// Bytes jumped over by interior resynchronization hops.
    pub fn skipped_bytes(&self) -> usize {
        self.skipped_bytes
    }
}

/// Cached frame index of a stream.
///
/// Any structural edit of the underlying bytes must reset it to
/// [`FrameIndex::Stale`]; the next lookup rebuilds it.
#[derive(Debug, Clone, Default)]
pub enum FrameIndex {
    #[default]
    Stale,
    Built(FrameTables),
}

impl FrameIndex {
    pub fn invalidate(&mut self) {
        *self = FrameIndex::Stale;
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, FrameIndex::Stale)
    }

    /// Rebuilds unconditionally.
    pub fn rebuild<S: ByteStore + ?Sized>(&mut self, store: &S) -> &FrameTables {
        *self = FrameIndex::Built(FrameTables::build(store));
        self.get_or_build(store)
    }

    /// Returns the cached tables, scanning `store` first if stale.
    pub fn get_or_build<S: ByteStore + ?Sized>(&mut self, store: &S) -> &FrameTables {
        if self.is_stale() {
            *self = FrameIndex::Built(FrameTables::build(store));
        }

        match self {
            FrameIndex::Built(tables) => tables,
            FrameIndex::Stale => unreachable!("frame index was just built"),
        }
    }

    /// Returns the cached tables, or a scan of `store` that is not cached.
    pub fn snapshot<S: ByteStore + ?Sized>(&self, store: &S) -> Cow<'_, FrameTables> {
        match self {
            FrameIndex::Built(tables) => Cow::Borrowed(tables),
            FrameIndex::Stale => Cow::Owned(FrameTables::build(store)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{EXAMPLE_HEADER, synth_frame, synth_stream};
    use crate::utils::errors::HeaderError;
    use crate::utils::store::MemoryStore;

    #[test]
    fn index_clean_stream() -> Result<(), HeaderError> {
        let store = MemoryStore::from(synth_stream(EXAMPLE_HEADER, 5)?);
        let tables = FrameTables::build(&store);

        assert_eq!(tables.len(), 5);
        assert_eq!(tables.offsets(), &[0, 417, 834, 1251, 1668]);
        assert_eq!(tables.resyncs(), 0);

        let duration = 417.0 * 8.0 / 128_000.0;
        for (i, timing) in tables.timings().iter().enumerate() {
            assert!((timing - duration * (i + 1) as f64).abs() < 1e-9);
        }
        assert_eq!(tables.total_duration(), tables.timings()[4]);
        Ok(())
    }

    #[test]
    fn index_is_monotonic_with_mixed_frames() -> Result<(), HeaderError> {
        let mut data = b"ID3\x03\x00\x00\x00\x00\x00\x05hello".to_vec();
        for seed in 0..6 {
            // Alternate unpadded and padded frames
            let header = if seed % 2 == 0 {
                EXAMPLE_HEADER
            } else {
                [0xFF, 0xFB, 0x92, 0x00]
            };
            data.extend(synth_frame(header, seed)?);
        }
        let store = MemoryStore::from(data);
        let tables = FrameTables::build(&store);

        assert_eq!(tables.len(), 6);
        assert_eq!(tables.offsets()[0], 15);
        assert!(tables.offsets().windows(2).all(|w| w[0] < w[1]));
        assert!(tables.timings().windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(tables.offsets()[2] - tables.offsets()[1], 418);
        Ok(())
    }

    #[test]
    fn resync_over_interior_corruption() -> Result<(), HeaderError> {
        let mut data = synth_stream(EXAMPLE_HEADER, 6)?;
        // Break the sync of frame 2
        data[2 * 417] = 0x00;
        let store = MemoryStore::from(data);
        let tables = FrameTables::build(&store);

        assert_eq!(tables.len(), 5);
        assert_eq!(tables.offsets(), &[0, 417, 1251, 1668, 2085]);
        assert_eq!(tables.resyncs(), 1);
        assert_eq!(tables.skipped_bytes(), 417);
        Ok(())
    }

    #[test]
    fn trailing_tag_is_not_a_resync() -> Result<(), HeaderError> {
        let mut data = synth_stream(EXAMPLE_HEADER, 3)?;
        data.extend_from_slice(b"TAG");
        data.extend_from_slice(&[0x20; 125]);
        let store = MemoryStore::from(data);
        let tables = FrameTables::build(&store);

        assert_eq!(tables.len(), 3);
        assert_eq!(tables.resyncs(), 0);
        Ok(())
    }

    #[test]
    fn no_frames() {
        let tables = FrameTables::build(&MemoryStore::from(vec![0xFF; 3]));
        assert!(tables.is_empty());
        assert_eq!(tables.total_duration(), 0.0);

        let tables = FrameTables::build(&MemoryStore::default());
        assert!(tables.is_empty());
    }

    #[test]
    fn stale_until_built() -> Result<(), HeaderError> {
        let store = MemoryStore::from(synth_stream(EXAMPLE_HEADER, 2)?);
        let mut index = FrameIndex::default();

        assert!(index.is_stale());
        assert_eq!(index.snapshot(&store).len(), 2);
        assert!(index.is_stale());

        assert_eq!(index.get_or_build(&store).len(), 2);
        assert!(!index.is_stale());
        assert!(matches!(index.snapshot(&store), Cow::Borrowed(_)));

        index.invalidate();
        assert!(index.is_stale());
        assert_eq!(index.rebuild(&store).len(), 2);
        Ok(())
    }
}

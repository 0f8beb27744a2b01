use std::borrow::Cow;

use log::debug;

use crate::process::index::{FrameIndex, FrameTables};
use crate::process::sync::{find_frame_start, read_header};
use crate::structs::header::FrameHeader;
use crate::utils::store::{ByteStore, MemoryStore};

/// Editable MPEG audio elementary stream.
///
/// Owns the complete byte content (leading tags, frames, trailing tags) and a
/// lazily built [`FrameIndex`]. Every structural edit invalidates the index;
/// the next frame lookup rescans the bytes.
///
/// # Example
///
/// ```rust
/// use mpa::process::{EXAMPLE_HEADER, synth_stream, stream::Stream};
///
/// let mut data = b"ID3 tag bytes".to_vec();
/// data.extend(synth_stream(EXAMPLE_HEADER, 10)?);
///
/// let mut stream = Stream::from_bytes(data);
/// assert_eq!(stream.frame_count(), 10);
///
/// stream.strip_tags();
/// stream.remove_frames(0, 2);
/// assert_eq!(stream.frame_count(), 8);
///
/// let bytes = stream.close();
/// assert_eq!(bytes.len(), 8 * 417);
/// # Ok::<(), mpa::utils::errors::HeaderError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Stream<S: ByteStore = MemoryStore> {
    store: S,
    cursor: usize,
    index: FrameIndex,
}

impl Stream<MemoryStore> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self::with_store(MemoryStore::from(data))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.store.as_slice()
    }
}

impl From<Vec<u8>> for Stream<MemoryStore> {
    fn from(data: Vec<u8>) -> Self {
        Self::from_bytes(data)
    }
}

impl<S: ByteStore> Stream<S> {
    pub fn with_store(store: S) -> Self {
        Self {
            store,
            cursor: 0,
            index: FrameIndex::Stale,
        }
    }

    /// Size of the whole stream in bytes, tags included.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Position following the last read or edit.
    pub fn position(&self) -> usize {
        self.cursor
    }

    // Buffer primitives. Callers invalidate the index after mutating.

    fn read(&mut self, length: usize, index: usize) -> Option<Vec<u8>> {
        let data = self.peek(length, index)?;
        self.cursor = index.saturating_add(length).min(self.store.len());
        Some(data)
    }

    fn peek(&self, length: usize, index: usize) -> Option<Vec<u8>> {
        if index >= self.store.len() {
            return None;
        }

        let mut data = vec![0u8; length.min(self.store.len() - index)];
        let n = self.store.read_into(index, &mut data);
        data.truncate(n);
        Some(data)
    }

    fn insert(&mut self, data: &[u8], index: usize) {
        let index = index.min(self.store.len());
        self.store.insert_at(index, data);
        self.cursor = index + data.len();
    }

    fn remove(&mut self, length: usize, index: usize) -> usize {
        let removed = self.store.remove_at(index, length);
        self.cursor = index.min(self.store.len());
        removed
    }

    fn invalidate(&mut self) {
        self.index.invalidate();
    }

    fn tables(&mut self) -> &FrameTables {
        self.index.get_or_build(&self.store)
    }

    /// Frame tables without caching them, for read-only access.
    pub fn snapshot(&self) -> Cow<'_, FrameTables> {
        self.index.snapshot(&self.store)
    }

    /// Offset of the first verified frame at or after `from`.
    pub fn find_frame_start(&self, from: usize) -> Option<usize> {
        find_frame_start(&self.store, from)
    }

    pub fn frame_count(&mut self) -> usize {
        self.tables().len()
    }

    /// Seconds, zero when there are no frames.
    pub fn total_duration(&mut self) -> f64 {
        self.tables().total_duration()
    }

    pub fn frame_offsets(&mut self) -> &[usize] {
        self.tables().offsets()
    }

    /// Cumulative seconds through the end of each frame.
    pub fn frame_timings(&mut self) -> &[f64] {
        self.tables().timings()
    }

    /// Interior resynchronization hops in the current content.
    pub fn resync_count(&mut self) -> usize {
        self.tables().resyncs()
    }

    /// Bytes skipped by interior resynchronization in the current content.
    pub fn skipped_bytes(&mut self) -> usize {
        self.tables().skipped_bytes()
    }

    /// Header of frame `index`, decoded afresh from the bytes.
    pub fn frame_header(&mut self, index: usize) -> Option<FrameHeader> {
        let offset = *self.tables().offsets().get(index)?;
        read_header(&self.store, offset).ok()
    }

    /// Raw bytes of frame `index`: header, payload and padding.
    pub fn frame_data(&mut self, index: usize) -> Option<Vec<u8>> {
        let header = self.frame_header(index)?;
        self.read(header.length, header.offset)
    }

    /// Index of the frame playing at `time` seconds.
    pub fn frame_at_time(&mut self, time: f64) -> Option<usize> {
        if time < 0.0 {
            return None;
        }

        let timings = self.tables().timings();
        let index = timings.partition_point(|&timing| timing <= time);
        (index < timings.len()).then_some(index)
    }

    /// Removes `count` frames starting at frame `index`.
    ///
    /// A negative `count` removes the frames ending just before `index`, so
    /// `remove_frames(5, -3)` equals `remove_frames(2, 3)`. An `index` outside
    /// the stream is a no-op and `count` is clamped to the frames available.
    /// Returns the number of frames removed.
    pub fn remove_frames(&mut self, index: isize, count: isize) -> usize {
        let (index, count) = if count < 0 {
            (index.saturating_add(count), count.unsigned_abs())
        } else {
            (index, count.unsigned_abs())
        };

        match usize::try_from(index) {
            Ok(index) => self.remove_frame_range(index, count),
            Err(_) => 0,
        }
    }

    fn remove_frame_range(&mut self, index: usize, count: usize) -> usize {
        let frames = self.frame_count();
        if index >= frames {
            return 0;
        }

        let count = count.min(frames - index);
        if count == 0 {
            return 0;
        }

        let (Some(first), Some(last)) = (
            self.frame_header(index),
            self.frame_header(index + count - 1),
        ) else {
            return 0;
        };

        let removed = self.remove(last.end() - first.offset, first.offset);
        self.invalidate();

        debug!(
            "Removed frames {index}..{} ({removed} bytes at {})",
            index + count,
            first.offset
        );

        count
    }

    /// Copies frames of `source` to the end of this stream's frames.
    ///
    /// Takes `length` frames starting at frame `index` of `source`, all of
    /// them from `index` on when `length` is `None`. The bytes are inserted
    /// right after this stream's last frame, ahead of any trailing tags, or at
    /// the start when there are no frames. The index is rebuilt immediately.
    /// Returns the number of frames copied.
    pub fn append_from<T: ByteStore>(
        &mut self,
        source: &Stream<T>,
        index: usize,
        length: Option<usize>,
    ) -> usize {
        let source_tables = source.snapshot();
        let frames = source_tables.len();
        if index >= frames {
            return 0;
        }

        let length = length.unwrap_or(frames - index).min(frames - index);
        if length == 0 {
            return 0;
        }

        let first = source_tables.offsets()[index];
        let Ok(last) = read_header(&source.store, source_tables.offsets()[index + length - 1])
        else {
            return 0;
        };

        let Some(data) = source.peek(last.end() - first, first) else {
            return 0;
        };

        let end_of_frames = match self.frame_count() {
            0 => 0,
            frames => self.frame_header(frames - 1).map_or(0, |header| header.end()),
        };

        self.insert(&data, end_of_frames);
        self.index.rebuild(&self.store);

        debug!(
            "Appended {length} frames ({} bytes) at byte {end_of_frames}",
            data.len()
        );

        length
    }

    /// Keeps the frames between `start_time` and `start_time + duration`.
    ///
    /// A negative `start_time` counts back from the end, a non-positive
    /// `duration` extends to the end. Cuts happen on frame boundaries taken
    /// from the cumulative timings: the kept range starts at the last frame
    /// whose timing is at most `start_time` and stops before the first frame
    /// whose timing reaches the end time.
    pub fn trim(&mut self, start_time: f64, duration: f64) {
        let total = self.total_duration();
        let start_time = if start_time < 0.0 {
            total + start_time
        } else {
            start_time
        };
        let duration = if duration <= 0.0 {
            total - start_time
        } else {
            duration
        };
        let end_time = (start_time + duration).min(total);

        let mut start_index = 0;
        let mut end_index = 0;
        for (i, &timing) in self.tables().timings().iter().enumerate() {
            if timing <= start_time {
                start_index = i;
            } else if timing >= end_time {
                end_index = i;
                break;
            }
        }

        debug!(
            "Trimming to {start_time:.3}..{end_time:.3} s, frames {start_index}..{end_index}"
        );

        let frames = self.frame_count();
        self.remove_frame_range(end_index, frames - end_index);
        self.remove_frame_range(0, start_index);
    }

    /// Bytes before the first verified frame, `None` without frames.
    pub fn leading_tag_bytes(&mut self) -> Option<Vec<u8>> {
        let start = self.find_frame_start(0)?;
        if start == 0 {
            return Some(Vec::new());
        }

        self.read(start, 0)
    }

    /// Bytes after the last frame, `None` without frames.
    pub fn trailing_tag_bytes(&mut self) -> Option<Vec<u8>> {
        let end = self.end_of_frames()?;
        if end >= self.store.len() {
            return Some(Vec::new());
        }

        self.read(self.store.len() - end, end)
    }

    fn end_of_frames(&mut self) -> Option<usize> {
        let frames = self.frame_count();
        let last = self.frame_header(frames.checked_sub(1)?)?;
        Some(last.end())
    }

    /// Removes everything after the last frame, then everything before the
    /// first verified frame.
    pub fn strip_tags(&mut self) {
        if let Some(end) = self.end_of_frames() {
            let removed = self.remove(self.store.len().saturating_sub(end), end);
            if removed > 0 {
                debug!("Stripped {removed} trailing bytes");
            }
        }

        if let Some(start) = self.find_frame_start(0) {
            let removed = self.remove(start, 0);
            if removed > 0 {
                debug!("Stripped {removed} leading bytes");
            }
        }

        self.invalidate();
    }

    /// Hands back the byte content, leaving the stream empty.
    pub fn close(&mut self) -> Vec<u8> {
        self.cursor = 0;
        self.invalidate();
        self.store.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{EXAMPLE_HEADER, synth_frame, synth_stream};
    use crate::utils::errors::HeaderError;

    // MPEG-2.5 Layer III, 8 kbps, 12 kHz, mono: 96-byte frames of 0.096 s
    const SHORT_HEADER: [u8; 4] = [0xFF, 0xE3, 0x14, 0xC4];

    fn example_stream(frames: usize) -> Result<Stream, HeaderError> {
        Ok(Stream::from_bytes(synth_stream(EXAMPLE_HEADER, frames)?))
    }

    #[test]
    fn scenario_a_frame_header() -> Result<(), HeaderError> {
        let mut stream = example_stream(3)?;
        let header = stream.frame_header(1).ok_or(HeaderError::Truncated)?;

        assert_eq!(header.offset, 417);
        assert_eq!(header.length, 417);
        assert!((header.duration - 0.026_062_5).abs() < 1e-9);
        assert!(stream.frame_header(3).is_none());
        Ok(())
    }

    #[test]
    fn frame_count_is_idempotent() -> Result<(), HeaderError> {
        let mut stream = example_stream(7)?;

        assert_eq!(stream.frame_count(), 7);
        let offsets = stream.frame_offsets().to_vec();
        assert_eq!(stream.frame_count(), 7);
        assert_eq!(stream.frame_offsets(), offsets.as_slice());
        Ok(())
    }

    #[test]
    fn frame_data_matches_source() -> Result<(), HeaderError> {
        let mut stream = example_stream(4)?;

        assert_eq!(stream.frame_data(2), Some(synth_frame(EXAMPLE_HEADER, 2)?));
        assert_eq!(stream.position(), 3 * 417);
        assert!(stream.frame_data(4).is_none());
        Ok(())
    }

    #[test]
    fn empty_stream() {
        let mut stream = Stream::new();

        assert_eq!(stream.frame_count(), 0);
        assert_eq!(stream.total_duration(), 0.0);
        assert!(stream.frame_header(0).is_none());
        assert!(stream.leading_tag_bytes().is_none());
        assert!(stream.trailing_tag_bytes().is_none());
        assert_eq!(stream.remove_frames(0, 1), 0);
        stream.trim(1.0, 1.0);
        stream.strip_tags();
        assert!(stream.is_empty());
    }

    #[test]
    fn remove_frames_forward() -> Result<(), HeaderError> {
        let mut stream = example_stream(6)?;

        assert_eq!(stream.remove_frames(1, 2), 2);
        assert_eq!(stream.frame_count(), 4);
        assert_eq!(stream.len(), 4 * 417);
        assert_eq!(stream.frame_data(1), Some(synth_frame(EXAMPLE_HEADER, 3)?));
        Ok(())
    }

    #[test]
    fn scenario_c_negative_count() -> Result<(), HeaderError> {
        let mut backward = example_stream(8)?;
        let mut forward = example_stream(8)?;

        assert_eq!(backward.remove_frames(5, -3), 3);
        assert_eq!(forward.remove_frames(2, 3), 3);
        assert_eq!(backward.as_bytes(), forward.as_bytes());
        Ok(())
    }

    #[test]
    fn remove_frames_clamps_and_ignores_out_of_range() -> Result<(), HeaderError> {
        let mut stream = example_stream(5)?;

        assert_eq!(stream.remove_frames(5, 1), 0);
        assert_eq!(stream.remove_frames(-1, 1), 0);
        assert_eq!(stream.remove_frames(1, -2), 0);
        assert_eq!(stream.remove_frames(2, 0), 0);
        assert_eq!(stream.remove_frames(isize::MIN, isize::MIN), 0);
        assert_eq!(stream.frame_count(), 5);

        assert_eq!(stream.remove_frames(3, 100), 2);
        assert_eq!(stream.frame_count(), 3);
        Ok(())
    }

    #[test]
    fn remove_keeps_tags_in_place() -> Result<(), HeaderError> {
        let mut data = b"ID3 leading".to_vec();
        data.extend(synth_stream(EXAMPLE_HEADER, 4)?);
        data.extend_from_slice(b"TAG trailing");
        let mut stream = Stream::from_bytes(data);

        assert_eq!(stream.remove_frames(3, 1), 1);
        assert_eq!(stream.frame_count(), 3);
        assert_eq!(stream.leading_tag_bytes(), Some(b"ID3 leading".to_vec()));
        assert_eq!(stream.trailing_tag_bytes(), Some(b"TAG trailing".to_vec()));
        Ok(())
    }

    #[test]
    fn scenario_e_append_all_into_empty() -> Result<(), HeaderError> {
        let mut data = b"ID3".to_vec();
        data.extend(synth_stream(EXAMPLE_HEADER, 5)?);
        let mut other = Stream::from_bytes(data);
        let mut stream = Stream::new();

        assert_eq!(stream.append_from(&other, 0, None), 5);
        assert_eq!(stream.frame_count(), other.frame_count());
        for i in 0..5 {
            assert_eq!(stream.frame_data(i), other.frame_data(i));
        }
        Ok(())
    }

    #[test]
    fn append_inserts_before_trailing_tag() -> Result<(), HeaderError> {
        let mut data = synth_stream(EXAMPLE_HEADER, 3)?;
        data.extend_from_slice(b"TAG");
        let mut stream = Stream::from_bytes(data);
        let source = Stream::from_bytes(synth_stream(SHORT_HEADER, 4)?);

        assert_eq!(stream.append_from(&source, 1, Some(2)), 2);
        assert_eq!(stream.frame_count(), 5);
        assert_eq!(stream.frame_data(3), Some(synth_frame(SHORT_HEADER, 1)?));
        assert_eq!(stream.frame_data(4), Some(synth_frame(SHORT_HEADER, 2)?));
        assert_eq!(stream.trailing_tag_bytes(), Some(b"TAG".to_vec()));

        assert_eq!(stream.append_from(&source, 4, None), 0);
        assert_eq!(stream.append_from(&source, 0, Some(0)), 0);
        assert_eq!(stream.frame_count(), 5);
        Ok(())
    }

    #[test]
    fn append_does_not_touch_source() -> Result<(), HeaderError> {
        let source = example_stream(3)?;
        let mut stream = Stream::new();

        stream.append_from(&source, 0, Some(100));
        assert!(source.index.is_stale());
        assert_eq!(source.position(), 0);
        assert_eq!(source.as_bytes(), stream.as_bytes());
        Ok(())
    }

    #[test]
    fn remove_then_append_restores_bytes() -> Result<(), HeaderError> {
        let original = Stream::from_bytes(synth_stream(EXAMPLE_HEADER, 9)?);
        let mut stream = original.clone();

        assert_eq!(stream.remove_frames(6, 3), 3);
        assert_eq!(stream.append_from(&original, 6, Some(3)), 3);
        assert_eq!(stream.as_bytes(), original.as_bytes());
        Ok(())
    }

    #[test]
    fn scenario_b_trim_last_seconds() -> Result<(), HeaderError> {
        // 625 frames of 0.096 s make 60 s
        let mut stream = Stream::from_bytes(synth_stream(SHORT_HEADER, 625)?);
        assert!((stream.total_duration() - 60.0).abs() < 1e-6);

        stream.trim(-10.0, 0.0);

        // Frame 519 ends at 49.92 s, the last frame reaches the end time
        assert_eq!(stream.frame_count(), 105);
        assert!((stream.total_duration() - 10.08).abs() < 1e-6);
        assert_eq!(stream.frame_data(0), Some(synth_frame(SHORT_HEADER, 519)?));
        Ok(())
    }

    #[test]
    fn trim_window() -> Result<(), HeaderError> {
        // 0.096 s frames, window 1.0..2.0 s
        let mut stream = Stream::from_bytes(synth_stream(SHORT_HEADER, 50)?);
        stream.trim(1.0, 1.0);

        // Frame 9 ends at 0.96 s, frame 20 is the first to reach 2.0 s
        assert_eq!(stream.frame_count(), 11);
        assert_eq!(stream.frame_data(0), Some(synth_frame(SHORT_HEADER, 9)?));
        assert_eq!(stream.frame_data(10), Some(synth_frame(SHORT_HEADER, 19)?));
        Ok(())
    }

    #[test]
    fn scenario_d_strip_tags() -> Result<(), HeaderError> {
        let frames = synth_stream(EXAMPLE_HEADER, 4)?;
        let mut data = vec![0x00; 10];
        data.extend_from_slice(&frames);
        data.extend_from_slice(&[0x20; 20]);
        let mut stream = Stream::from_bytes(data);
        let before = stream.len();

        assert_eq!(stream.leading_tag_bytes(), Some(vec![0x00; 10]));
        assert_eq!(stream.trailing_tag_bytes(), Some(vec![0x20; 20]));

        stream.strip_tags();

        assert_eq!(stream.len(), before - 30);
        assert_eq!(stream.as_bytes(), frames.as_slice());
        assert_eq!(stream.frame_count(), 4);
        assert_eq!(stream.leading_tag_bytes(), Some(Vec::new()));
        assert_eq!(stream.trailing_tag_bytes(), Some(Vec::new()));
        Ok(())
    }

    #[test]
    fn frame_at_time() -> Result<(), HeaderError> {
        let mut stream = Stream::from_bytes(synth_stream(SHORT_HEADER, 10)?);

        assert_eq!(stream.frame_at_time(0.0), Some(0));
        assert_eq!(stream.frame_at_time(0.1), Some(1));
        assert_eq!(stream.frame_at_time(0.95), Some(9));
        assert_eq!(stream.frame_at_time(1.0), None);
        assert_eq!(stream.frame_at_time(-1.0), None);
        Ok(())
    }

    #[test]
    fn corrupted_interior_frame_costs_one_resync() -> Result<(), HeaderError> {
        let mut data = synth_stream(EXAMPLE_HEADER, 6)?;
        data[3 * 417 + 1] = 0x00;
        let mut stream = Stream::from_bytes(data);

        assert_eq!(stream.frame_count(), 5);
        assert_eq!(stream.frame_offsets(), &[0, 417, 834, 4 * 417, 5 * 417]);
        assert_eq!(stream.resync_count(), 1);
        assert_eq!(stream.skipped_bytes(), 417);
        Ok(())
    }

    #[test]
    fn unverified_first_frame_is_discarded() -> Result<(), HeaderError> {
        // Frame 0 decodes, but nothing valid follows it
        let mut data = synth_stream(EXAMPLE_HEADER, 6)?;
        data[417 + 1] = 0x00;
        let mut stream = Stream::from_bytes(data);

        assert_eq!(stream.frame_count(), 4);
        assert_eq!(stream.frame_offsets()[0], 834);
        assert_eq!(stream.resync_count(), 0);
        assert_eq!(stream.skipped_bytes(), 0);
        assert_eq!(stream.leading_tag_bytes().map(|tag| tag.len()), Some(834));
        Ok(())
    }

    #[test]
    fn close_empties_stream() -> Result<(), HeaderError> {
        let data = synth_stream(EXAMPLE_HEADER, 3)?;
        let mut stream = Stream::from_bytes(data.clone());

        assert_eq!(stream.frame_count(), 3);
        assert_eq!(stream.close(), data);
        assert!(stream.is_empty());
        assert_eq!(stream.frame_count(), 0);
        Ok(())
    }
}

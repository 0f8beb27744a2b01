//! Byte storage behind a [`Stream`](crate::process::stream::Stream).
//!
//! The stream model only needs positional reads plus splice-style insertion
//! and removal, so storage backends implement [`ByteStore`] and nothing else.
//! Cursor bookkeeping stays in the stream.

/// Positional byte storage with splice semantics.
pub trait ByteStore {
    /// Current size in bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies bytes starting at `index` into `buf`.
    ///
    /// Returns the number of bytes copied, which is less than `buf.len()` when
    /// the store ends first and zero when `index` is at or past the end.
    fn read_into(&self, index: usize, buf: &mut [u8]) -> usize;

    /// Splices `data` in at `index`, clamped to the end of the store.
    fn insert_at(&mut self, index: usize, data: &[u8]);

    /// Removes up to `length` bytes starting at `index`.
    ///
    /// Returns the number of bytes actually removed.
    fn remove_at(&mut self, index: usize, length: usize) -> usize;

    /// Moves the whole content out, leaving the store empty.
    fn take(&mut self) -> Vec<u8>;
}

/// In-memory [`ByteStore`] backed by a growable buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    data: Vec<u8>,
}

impl MemoryStore {
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for MemoryStore {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl ByteStore for MemoryStore {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn read_into(&self, index: usize, buf: &mut [u8]) -> usize {
        let Some(available) = self.data.get(index..) else {
            return 0;
        };

        let n = buf.len().min(available.len());
        buf[..n].copy_from_slice(&available[..n]);
        n
    }

    fn insert_at(&mut self, index: usize, data: &[u8]) {
        let index = index.min(self.data.len());
        self.data.splice(index..index, data.iter().copied());
    }

    fn remove_at(&mut self, index: usize, length: usize) -> usize {
        if index >= self.data.len() {
            return 0;
        }

        let end = index.saturating_add(length).min(self.data.len());
        self.data.drain(index..end);
        end - index
    }

    fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_clamps_to_end() {
        let store = MemoryStore::from(vec![1, 2, 3, 4, 5]);
        let mut buf = [0u8; 4];

        assert_eq!(store.read_into(3, &mut buf), 2);
        assert_eq!(&buf[..2], &[4, 5]);
        assert_eq!(store.read_into(5, &mut buf), 0);
        assert_eq!(store.read_into(usize::MAX, &mut buf), 0);
    }

    #[test]
    fn splice_and_remove() {
        let mut store = MemoryStore::from(vec![1, 2, 3]);

        store.insert_at(1, &[9, 9]);
        assert_eq!(store.as_slice(), &[1, 9, 9, 2, 3]);

        store.insert_at(100, &[7]);
        assert_eq!(store.as_slice(), &[1, 9, 9, 2, 3, 7]);

        assert_eq!(store.remove_at(1, 2), 2);
        assert_eq!(store.as_slice(), &[1, 2, 3, 7]);

        assert_eq!(store.remove_at(2, usize::MAX), 2);
        assert_eq!(store.as_slice(), &[1, 2]);

        assert_eq!(store.remove_at(2, 1), 0);
        assert_eq!(store.take(), vec![1, 2]);
        assert!(store.is_empty());
    }
}

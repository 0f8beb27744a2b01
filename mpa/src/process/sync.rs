//! Frame synchronization.
//!
//! A `0xFF` byte alone says little: tag payloads and compressed audio contain
//! plenty of them. A candidate offset is only accepted when the header there
//! decodes *and* a second header decodes right where the first frame ends.

use log::trace;

use crate::structs::header::{FrameHeader, HEADER_LEN, SYNC_BYTE};
use crate::utils::errors::HeaderError;
use crate::utils::store::ByteStore;

/// Decodes the frame header stored at `offset`.
pub fn read_header<S: ByteStore + ?Sized>(
    store: &S,
    offset: usize,
) -> Result<FrameHeader, HeaderError> {
    let mut window = [0u8; HEADER_LEN];
    if store.read_into(offset, &mut window) < HEADER_LEN {
        return Err(HeaderError::Truncated);
    }

    FrameHeader::try_parse(&window, offset)
}

/// Returns the offset of the first verified frame at or after `from`.
///
/// Scans one byte at a time. Returns `None` when the end of the store is
/// reached without finding two consecutive decodable headers.
pub fn find_frame_start<S: ByteStore + ?Sized>(store: &S, from: usize) -> Option<usize> {
    let mut byte = [0u8; 1];

    (from..store.len()).find(|&offset| {
        if store.read_into(offset, &mut byte) == 0 || byte[0] != SYNC_BYTE {
            return false;
        }

        let first = match read_header(store, offset) {
            Ok(header) => header,
            Err(_) => return false,
        };

        match read_header(store, first.end()) {
            Ok(_) => true,
            Err(err) => {
                trace!(
                    "Rejected sync candidate at {offset}: no frame follows at {} ({err})",
                    first.end()
                );
                false
            }
        }
    })
}

use std::io;

/// Reasons a 4-byte window is not an MPEG audio frame header.
///
/// These are expected while scanning: the stream model recovers from every
/// one of them locally by resynchronizing.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderError {
    #[error("Header window is shorter than 4 bytes")]
    Truncated,

    #[error("Invalid frame sync, Read {0:#05X}")]
    InvalidSync(u16),

    #[error("MPEG audio version ID 0b01 is reserved")]
    ReservedVersion,

    #[error("Layer description 0b00 is reserved")]
    ReservedLayer,

    #[error("Free format bit rate is not supported")]
    FreeFormatBitRate,

    #[error("Invalid bit rate index. Read {0:#06b}")]
    InvalidBitRate(u8),

    #[error("Invalid sampling frequency index. Read {0:#04b}")]
    InvalidSampleRate(u8),

    #[error("Frame length must be positive. Calculated {0}")]
    InvalidLength(usize),
}

impl From<io::Error> for HeaderError {
    fn from(_: io::Error) -> Self {
        HeaderError::Truncated
    }
}

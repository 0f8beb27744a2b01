//! Data structures representing MPEG audio stream components.
//!
//! Only the frame header is modelled: payloads are carried as opaque bytes and
//! non-frame regions (ID3v2, APE, ID3v1 tags) are located but never decoded.

pub mod header;

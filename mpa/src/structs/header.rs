//! MPEG audio frame header.
//!
//! ## Layout
//!
//! Every frame starts with a 32-bit header, read MSB first:
//!
//! | Bits | Field                                    |
//! |------|------------------------------------------|
//! | 11   | Frame sync, all ones                     |
//! | 2    | Version ID (`00` 2.5, `10` 2, `11` 1)    |
//! | 2    | Layer (`01` III, `10` II, `11` I)        |
//! | 1    | Protection absent                        |
//! | 4    | Bit rate index                           |
//! | 2    | Sampling frequency index                 |
//! | 1    | Padding                                  |
//! | 1    | Private                                  |
//! | 2    | Channel mode                             |
//! | 2    | Mode extension                           |
//! | 1    | Copyright                                |
//! | 1    | Original                                 |
//! | 2    | Emphasis                                 |
//!
//! ## Frame Length
//!
//! Layer I frames are made of 4-byte slots:
//! `floor((12 * bit_rate / sample_rate + padding) * 4)`.
//! Layers II and III use 1-byte slots:
//! `floor(144 * bit_rate / sample_rate + padding)`.

use std::fmt::Display;

use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::HeaderError;

/// First byte of every frame header.
pub const SYNC_BYTE: u8 = 0xFF;

/// 11-bit frame sync pattern.
pub const FRAME_SYNC: u16 = 0x7FF;

/// Size of a frame header in bytes.
pub const HEADER_LEN: usize = 4;

/// Bit rates in kbps, indexed by the 4-bit bit rate index.
///
/// Columns: V1 L1, V1 L2, V1 L3, V2/2.5 L1, V2/2.5 L2 & L3.
/// Index 0 (free format) and 15 (forbidden) are rejected before lookup.
const BIT_RATES_KBPS: [[u32; 5]; 16] = [
    [0, 0, 0, 0, 0],
    [32, 32, 32, 32, 8],
    [64, 48, 40, 48, 16],
    [96, 56, 48, 56, 24],
    [128, 64, 56, 64, 32],
    [160, 80, 64, 80, 40],
    [192, 96, 80, 96, 48],
    [224, 112, 96, 112, 56],
    [256, 128, 112, 128, 64],
    [288, 160, 128, 144, 80],
    [320, 192, 160, 160, 96],
    [352, 224, 192, 176, 112],
    [384, 256, 224, 192, 128],
    [416, 320, 256, 224, 144],
    [448, 384, 320, 256, 160],
    [0, 0, 0, 0, 0],
];

/// Sampling frequencies in Hz for MPEG-1. MPEG-2 halves them, MPEG-2.5 halves
/// them again.
const BASE_SAMPLE_RATES: [u32; 3] = [44100, 48000, 32000];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Mpeg1,
    Mpeg2,
    Mpeg25,
}

impl Version {
    const fn sample_rate_shift(&self) -> u32 {
        match self {
            Version::Mpeg1 => 0,
            Version::Mpeg2 => 1,
            Version::Mpeg25 => 2,
        }
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Version::Mpeg1 => write!(f, "MPEG-1"),
            Version::Mpeg2 => write!(f, "MPEG-2"),
            Version::Mpeg25 => write!(f, "MPEG-2.5"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Layer1,
    Layer2,
    Layer3,
}

impl Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layer::Layer1 => write!(f, "Layer I"),
            Layer::Layer2 => write!(f, "Layer II"),
            Layer::Layer3 => write!(f, "Layer III"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    Stereo,
    JointStereo,
    DualChannel,
    SingleChannel,
}

impl ChannelMode {
    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => ChannelMode::Stereo,
            0b01 => ChannelMode::JointStereo,
            0b10 => ChannelMode::DualChannel,
            _ => ChannelMode::SingleChannel,
        }
    }
}

impl Display for ChannelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelMode::Stereo => write!(f, "Stereo"),
            ChannelMode::JointStereo => write!(f, "Joint stereo"),
            ChannelMode::DualChannel => write!(f, "Dual channel"),
            ChannelMode::SingleChannel => write!(f, "Single channel"),
        }
    }
}

/// Joint stereo parameters. Only meaningful when the channel mode is
/// [`ChannelMode::JointStereo`], but always decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeExtension {
    /// Layers I and II: intensity stereo applies to subbands `lower_band..=31`.
    Bands { lower_band: u8 },
    /// Layer III: intensity stereo is either off or automatic, middle/side
    /// joining is a separate switch.
    Layer3 {
        intensity_stereo: bool,
        middle_side: bool,
    },
}

impl ModeExtension {
    fn from_bits(layer: Layer, bits: u8) -> Self {
        match layer {
            Layer::Layer1 | Layer::Layer2 => ModeExtension::Bands {
                lower_band: ((bits & 0b11) + 1) * 4,
            },
            Layer::Layer3 => ModeExtension::Layer3 {
                intensity_stereo: bits & 0b01 != 0,
                middle_side: bits & 0b10 != 0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    None,
    Ms50_15,
    Reserved,
    CcittJ17,
}

impl Emphasis {
    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Emphasis::None,
            0b01 => Emphasis::Ms50_15,
            0b10 => Emphasis::Reserved,
            _ => Emphasis::CcittJ17,
        }
    }
}

impl Display for Emphasis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Emphasis::None => write!(f, "None"),
            Emphasis::Ms50_15 => write!(f, "50/15 ms"),
            Emphasis::Reserved => write!(f, "Reserved"),
            Emphasis::CcittJ17 => write!(f, "CCITT J.17"),
        }
    }
}

/// Decoded MPEG audio frame header.
///
/// Only produced by a successful [`FrameHeader::try_parse`], so `length`,
/// `bit_rate`, `sample_rate` and `duration` are always positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameHeader {
    /// Absolute position of the sync byte in the source buffer.
    pub offset: usize,
    /// Header, payload and padding, in bytes.
    pub length: usize,
    pub version: Version,
    pub layer: Layer,
    /// A 16-bit CRC follows the header.
    pub protected: bool,
    /// Bits per second.
    pub bit_rate: u32,
    /// Hz.
    pub sample_rate: u32,
    pub padding: u8,
    pub private: bool,
    pub channel_mode: ChannelMode,
    pub mode_extension: ModeExtension,
    pub copyright: bool,
    pub original: bool,
    pub emphasis: Emphasis,
    /// Seconds.
    pub duration: f64,
}

impl FrameHeader {
    /// Decodes the header in the first 4 bytes of `bytes`.
    ///
    /// `offset` is reported back verbatim as [`FrameHeader::offset`]; it is
    /// not used for decoding.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mpa::structs::header::{FrameHeader, Layer, Version};
    ///
    /// let header = FrameHeader::try_parse(&[0xFF, 0xFB, 0x90, 0x00], 0).unwrap();
    /// assert_eq!(header.version, Version::Mpeg1);
    /// assert_eq!(header.layer, Layer::Layer3);
    /// assert_eq!(header.bit_rate, 128_000);
    /// assert_eq!(header.length, 417);
    /// ```
    pub fn try_parse(bytes: &[u8], offset: usize) -> Result<Self, HeaderError> {
        let Some(window) = bytes.get(..HEADER_LEN) else {
            return Err(HeaderError::Truncated);
        };

        Self::read(&mut BsIoSliceReader::from_slice(window), offset)
    }

    fn read(reader: &mut BsIoSliceReader, offset: usize) -> Result<Self, HeaderError> {
        if reader.available()? < (HEADER_LEN as u64) << 3 {
            return Err(HeaderError::Truncated);
        }

        let sync: u16 = reader.get_n(11)?;
        if sync != FRAME_SYNC {
            return Err(HeaderError::InvalidSync(sync));
        }

        let version = match reader.get_n::<u8>(2)? {
            0b00 => Version::Mpeg25,
            0b10 => Version::Mpeg2,
            0b11 => Version::Mpeg1,
            _ => return Err(HeaderError::ReservedVersion),
        };

        let layer = match reader.get_n::<u8>(2)? {
            0b01 => Layer::Layer3,
            0b10 => Layer::Layer2,
            0b11 => Layer::Layer1,
            _ => return Err(HeaderError::ReservedLayer),
        };

        let protected = !reader.get()?;
        let bit_rate_index: u8 = reader.get_n(4)?;
        let sample_rate_index: u8 = reader.get_n(2)?;
        let padding = reader.get()? as u8;
        let private = reader.get()?;
        let channel_mode = ChannelMode::from_bits(reader.get_n(2)?);
        let mode_extension = ModeExtension::from_bits(layer, reader.get_n(2)?);
        let copyright = reader.get()?;
        let original = reader.get()?;
        let emphasis = Emphasis::from_bits(reader.get_n(2)?);

        let bit_rate = Self::map_bit_rate(version, layer, bit_rate_index)?;
        let sample_rate = Self::map_sample_rate(version, sample_rate_index)?;

        let length = match layer {
            Layer::Layer1 => (48 * bit_rate / sample_rate + 4 * padding as u32) as usize,
            Layer::Layer2 | Layer::Layer3 => {
                (144 * bit_rate / sample_rate + padding as u32) as usize
            }
        };
        if length == 0 {
            return Err(HeaderError::InvalidLength(length));
        }

        let duration = length as f64 * 8.0 / bit_rate as f64;

        Ok(Self {
            offset,
            length,
            version,
            layer,
            protected,
            bit_rate,
            sample_rate,
            padding,
            private,
            channel_mode,
            mode_extension,
            copyright,
            original,
            emphasis,
            duration,
        })
    }

    fn map_bit_rate(version: Version, layer: Layer, index: u8) -> Result<u32, HeaderError> {
        match index {
            0 => return Err(HeaderError::FreeFormatBitRate),
            15 => return Err(HeaderError::InvalidBitRate(index)),
            _ => {}
        }

        let column = match (version, layer) {
            (Version::Mpeg1, Layer::Layer1) => 0,
            (Version::Mpeg1, Layer::Layer2) => 1,
            (Version::Mpeg1, Layer::Layer3) => 2,
            (_, Layer::Layer1) => 3,
            (_, Layer::Layer2 | Layer::Layer3) => 4,
        };

        match BIT_RATES_KBPS[index as usize][column] {
            0 => Err(HeaderError::InvalidBitRate(index)),
            kbps => Ok(kbps * 1000),
        }
    }

    fn map_sample_rate(version: Version, index: u8) -> Result<u32, HeaderError> {
        match BASE_SAMPLE_RATES.get(index as usize) {
            Some(&rate) => Ok(rate >> version.sample_rate_shift()),
            None => Err(HeaderError::InvalidSampleRate(index)),
        }
    }

    /// Offset of the first byte after this frame.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// PCM samples per channel carried by one frame.
    pub fn samples_per_frame(&self) -> usize {
        match (self.layer, self.version) {
            (Layer::Layer1, _) => 384,
            (Layer::Layer2, _) => 1152,
            (Layer::Layer3, Version::Mpeg1) => 1152,
            (Layer::Layer3, _) => 576,
        }
    }

    pub fn channels(&self) -> usize {
        match self.channel_mode {
            ChannelMode::SingleChannel => 1,
            _ => 2,
        }
    }
}

#[test]
fn parse_mpeg1_layer3_128k() -> Result<(), HeaderError> {
    let header = FrameHeader::try_parse(&[0xFF, 0xFB, 0x90, 0x00], 1234)?;

    assert_eq!(header.offset, 1234);
    assert_eq!(header.version, Version::Mpeg1);
    assert_eq!(header.layer, Layer::Layer3);
    assert!(!header.protected);
    assert_eq!(header.bit_rate, 128_000);
    assert_eq!(header.sample_rate, 44_100);
    assert_eq!(header.padding, 0);
    assert_eq!(header.channel_mode, ChannelMode::Stereo);
    assert_eq!(header.length, 417);
    assert_eq!(header.end(), 1234 + 417);
    assert!((header.duration - 0.026_062_5).abs() < 1e-9);
    assert_eq!(header.samples_per_frame(), 1152);
    assert_eq!(header.channels(), 2);
    Ok(())
}

#[test]
fn parse_padding_and_extended_attributes() -> Result<(), HeaderError> {
    // MPEG-1 Layer III, 128 kbps, 44.1 kHz, padded, private,
    // joint stereo with M/S, copyright, original, 50/15 emphasis
    let header = FrameHeader::try_parse(&[0xFF, 0xFA, 0x93, 0x6D], 0)?;

    assert!(header.protected);
    assert_eq!(header.padding, 1);
    assert!(header.private);
    assert_eq!(header.length, 418);
    assert_eq!(header.channel_mode, ChannelMode::JointStereo);
    assert_eq!(
        header.mode_extension,
        ModeExtension::Layer3 {
            intensity_stereo: false,
            middle_side: true,
        }
    );
    assert!(header.copyright);
    assert!(header.original);
    assert_eq!(header.emphasis, Emphasis::Ms50_15);
    Ok(())
}

#[test]
fn parse_layer1_and_layer2() -> Result<(), HeaderError> {
    // MPEG-1 Layer I, 384 kbps, 48 kHz, padded, joint stereo bands 12..=31
    let header = FrameHeader::try_parse(&[0xFF, 0xFF, 0xC6, 0x68], 0)?;
    assert_eq!(header.layer, Layer::Layer1);
    assert_eq!(header.bit_rate, 384_000);
    assert_eq!(header.sample_rate, 48_000);
    assert_eq!(header.length, (12 * 384_000 / 48_000 + 1) * 4);
    assert_eq!(
        header.mode_extension,
        ModeExtension::Bands { lower_band: 12 }
    );
    assert_eq!(header.samples_per_frame(), 384);

    // MPEG-2 Layer II, 160 kbps, 24 kHz, mono
    let header = FrameHeader::try_parse(&[0xFF, 0xF5, 0xE4, 0xC0], 0)?;
    assert_eq!(header.version, Version::Mpeg2);
    assert_eq!(header.layer, Layer::Layer2);
    assert_eq!(header.bit_rate, 160_000);
    assert_eq!(header.sample_rate, 24_000);
    assert_eq!(header.length, 960);
    assert_eq!(header.channels(), 1);
    Ok(())
}

#[test]
fn parse_mpeg25_sample_rates() -> Result<(), HeaderError> {
    let header = FrameHeader::try_parse(&[0xFF, 0xE3, 0x14, 0xC4], 0)?;
    assert_eq!(header.version, Version::Mpeg25);
    assert_eq!(header.bit_rate, 8_000);
    assert_eq!(header.sample_rate, 12_000);
    assert_eq!(header.length, 96);
    assert!((header.duration - 0.096).abs() < 1e-12);
    assert_eq!(header.samples_per_frame(), 576);
    Ok(())
}

#[test]
fn reject_invalid_headers() {
    let cases: [(&[u8], HeaderError); 8] = [
        (&[0xFF, 0xFB, 0x90], HeaderError::Truncated),
        (&[0xFE, 0xFB, 0x90, 0x00], HeaderError::InvalidSync(0x7F7)),
        (&[0xFF, 0x1B, 0x90, 0x00], HeaderError::InvalidSync(0x7F8)),
        (&[0xFF, 0xEB, 0x90, 0x00], HeaderError::ReservedVersion),
        (&[0xFF, 0xF9, 0x90, 0x00], HeaderError::ReservedLayer),
        (&[0xFF, 0xFB, 0x00, 0x00], HeaderError::FreeFormatBitRate),
        (&[0xFF, 0xFB, 0xF0, 0x00], HeaderError::InvalidBitRate(15)),
        (&[0xFF, 0xFB, 0x9C, 0x00], HeaderError::InvalidSampleRate(3)),
    ];

    for (bytes, expected) in cases {
        assert_eq!(FrameHeader::try_parse(bytes, 0), Err(expected), "{bytes:02X?}");
    }
}

#[test]
fn every_valid_header_has_positive_length_and_duration() {
    let mut valid = 0;
    for byte1 in 0xE0..=0xFFu8 {
        for byte2 in 0..=0xFFu8 {
            if let Ok(header) = FrameHeader::try_parse(&[0xFF, byte1, byte2, 0x00], 0) {
                assert!(header.length > 0);
                assert!(header.duration > 0.0);
                valid += 1;
            }
        }
    }

    // version, layer, protection, bit rate, sample rate, padding, private
    assert_eq!(valid, 3 * 3 * 2 * 14 * 3 * 2 * 2);
}

//! Bit-level reading over byte slices.
//!
//! Thin wrapper around [`bitstream_io::BitReader`] that reports how many bits
//! are left and turns short reads into descriptive `UnexpectedEof` errors.

use std::io;

use bitstream_io::{BigEndian, BitRead, BitReader, UnsignedInteger};

#[derive(Debug)]
pub struct BitstreamIoReader<R: io::Read + io::Seek> {
    bs: BitReader<R, BigEndian>,
    len: u64,
}

pub type BsIoSliceReader<'a> = BitstreamIoReader<io::Cursor<&'a [u8]>>;

impl<R> BitstreamIoReader<R>
where
    R: io::Read + io::Seek,
{
    pub fn new(read: R, len_bytes: u64) -> Self {
        Self {
            bs: BitReader::new(read),
            len: len_bytes << 3,
        }
    }

    #[inline(always)]
    pub fn get(&mut self) -> io::Result<bool> {
        self.bs.read_bit()
    }

    #[inline(always)]
    pub fn get_n<I: UnsignedInteger>(&mut self, n: u32) -> io::Result<I> {
        match self.bs.read_unsigned_var(n) {
            Ok(val) => Ok(val),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "get_n({}): out of bounds bits at {}",
                    n,
                    self.bs.position_in_bits().unwrap_or(0)
                ),
            )),
            Err(e) => Err(e),
        }
    }

    #[inline(always)]
    pub fn available(&mut self) -> io::Result<u64> {
        self.bs.position_in_bits().map(|pos| self.len - pos)
    }
}

impl<'a> BsIoSliceReader<'a> {
    pub fn from_slice(buf: &'a [u8]) -> Self {
        let len = buf.len() as u64;
        let read = io::Cursor::new(buf);

        Self::new(read, len)
    }
}

#[test]
fn read_fields_msb_first() -> anyhow::Result<()> {
    let mut reader = BsIoSliceReader::from_slice(&[0xFF, 0xFB]);
    assert_eq!(reader.available()?, 16);

    let sync: u16 = reader.get_n(11)?;
    assert_eq!(sync, 0x7FF);
    assert_eq!(reader.get_n::<u8>(2)?, 0b11);
    assert!(!reader.get()?);
    assert!(reader.get()?);
    assert_eq!(reader.available()?, 1);

    assert!(reader.get_n::<u8>(4).is_err());
    Ok(())
}

//! Bit-granular reading from a message buffer.

use alloc::string::String;
use alloc::vec::Vec;

use thiserror::Error;

/// The data ended before a read completed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Data ends after {len} octets, but reading reached bit {at}.")]
pub struct Truncated {
    /// Octets available in the buffer.
    pub len: usize,
    /// Bit offset the failed read advanced to.
    pub at: usize,
}

/// A cursor over message data, advancing in bits.
///
/// Reads may end inside an octet; the next read continues at the following
/// bit. The cursor only ever moves backwards through [`reset_to`], which
/// re-synchronizes on a declared section length.
///
/// [`reset_to`]: BitReader::reset_to
#[derive(Debug)]
pub struct BitReader<'d> {
    data: &'d [u8],
    offset: usize, // Cursor, in bits from the start of the data.
}

impl<'d> BitReader<'d> {
    /// Returns a reader positioned at the first bit of `data`.
    pub fn new(data: &'d [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Returns the cursor position, in bits.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Reads a big-endian unsigned value of up to 64 bits.
    pub fn read(&mut self, width: u32) -> Result<u64, Truncated> {
        debug_assert!(width <= 64);

        let first = self.offset / 8;
        let last = (self.offset + width as usize).div_ceil(8);

        // At most 71 bits spanning nine octets. Octets past the end read as
        // zero until the cursor leaves the final octet.
        let mut word: u128 = 0;
        for i in first..last {
            word = word << 8 | u128::from(self.data.get(i).copied().unwrap_or(0));
        }
        word >>= last * 8 - (self.offset + width as usize);

        self.skip(width as usize)?;

        Ok(word as u64 & ones(width))
    }

    /// Advances the cursor without decoding, checking bounds as a read does.
    pub fn skip(&mut self, bits: usize) -> Result<(), Truncated> {
        self.offset += bits;
        if self.offset / 8 > self.data.len() {
            Err(Truncated {
                len: self.data.len(),
                at: self.offset,
            })?;
        }
        Ok(())
    }

    /// Reads a run of octets as characters, one per octet.
    ///
    /// The cursor may sit inside an octet; each character then spans parts of
    /// two octets.
    pub fn read_text(&mut self, octets: usize) -> Result<String, Truncated> {
        let mut text = String::with_capacity(octets);
        for _ in 0..octets {
            text.push(char::from(self.read(8)? as u8));
        }
        Ok(text)
    }

    /// Takes an exact number of octets from the cursor position.
    pub fn take<const N: usize>(&mut self) -> Result<[u8; N], Truncated> {
        let mut buf = [0; N];
        for b in &mut buf {
            *b = self.read(8)? as u8;
        }
        Ok(buf)
    }

    /// Takes a counted number of octets from the cursor position.
    pub fn bytes(&mut self, octets: usize) -> Result<Vec<u8>, Truncated> {
        let mut buf = Vec::with_capacity(octets);
        for _ in 0..octets {
            buf.push(self.read(8)? as u8);
        }
        Ok(buf)
    }

    /// Advances to the next octet boundary, if between octets.
    pub fn align(&mut self) -> Result<(), Truncated> {
        self.skip(self.offset.next_multiple_of(8) - self.offset)
    }

    /// Advances to the next even-octet boundary.
    pub fn align_even(&mut self) -> Result<(), Truncated> {
        self.align()?;
        if self.offset / 8 % 2 == 1 {
            self.skip(8)?;
        }
        Ok(())
    }

    /// Moves the cursor to an octet boundary, forwards or backwards.
    pub fn reset_to(&mut self, octet: usize) -> Result<(), Truncated> {
        self.offset = octet * 8;
        if octet > self.data.len() {
            Err(Truncated {
                len: self.data.len(),
                at: self.offset,
            })?;
        }
        Ok(())
    }

    /// Whether the cursor sits at or past the end of the data.
    pub fn is_at_end(&self) -> bool {
        self.offset / 8 >= self.data.len()
    }
}

/// The all-ones pattern of the given width.
pub(crate) fn ones(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1 << width) - 1
    }
}

//! Bounds-checked cursor over a shared APDU buffer
//!
//! The same storage holds the received AARQ and, once decoding is done, the
//! AARE written in place. The cursor therefore tracks two independent
//! positions:
//! - the write position, which is also the end of readable data,
//! - the read position, which advances as fields are decoded.
//!
//! Variable-length BER structures whose size is only known once their content
//! has been written use reserved length slots: [`ByteCursor::open_length`]
//! writes a placeholder byte and [`ByteCursor::close_length`] patches it with
//! the number of bytes written after it, switching to the long form when the
//! content outgrows one byte. Slots nest (innermost closes first).

use heapless::Vec as HeaplessVec;

use crate::error::AcseError;

/// Maximum nesting depth of reserved length slots.
pub const MAX_LENGTH_SLOTS: usize = 4;

/// Largest value a reserved one-byte (short form) BER length can hold.
pub const MAX_SHORT_LENGTH: usize = 127;

/// Read/write cursor over a borrowed buffer.
#[derive(Debug)]
pub struct ByteCursor<'a> {
    buffer: &'a mut [u8],
    read_position: usize,
    write_position: usize,
    slots: HeaplessVec<usize, MAX_LENGTH_SLOTS>,
}

impl<'a> ByteCursor<'a> {
    /// Create an empty cursor (nothing to read, writes start at offset 0).
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, read_position: 0, write_position: 0, slots: HeaplessVec::new() }
    }

    /// Create a cursor over `len` bytes of received data already in `buffer`.
    ///
    /// `len` is clamped to the buffer size.
    pub fn with_data(buffer: &'a mut [u8], len: usize) -> Self {
        let write_position = len.min(buffer.len());
        Self { buffer, read_position: 0, write_position, slots: HeaplessVec::new() }
    }

    /// Total size of the underlying buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Current read offset.
    pub fn read_position(&self) -> usize {
        self.read_position
    }

    /// Move the read offset, which must not pass the end of written data.
    pub fn set_read_position(&mut self, position: usize) -> Result<(), AcseError> {
        if position > self.write_position {
            return Err(AcseError::UnexpectedEnd);
        }
        self.read_position = position;
        Ok(())
    }

    /// Current write offset (number of valid bytes in the buffer).
    pub fn write_position(&self) -> usize {
        self.write_position
    }

    /// Number of bytes left to read.
    pub fn unread(&self) -> usize {
        self.write_position - self.read_position
    }

    /// Bytes left to read, without consuming them.
    pub fn unread_slice(&self) -> &[u8] {
        &self.buffer[self.read_position..self.write_position]
    }

    /// Bytes written so far.
    pub fn written(&self) -> &[u8] {
        &self.buffer[..self.write_position]
    }

    // ------------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------------

    /// Look at the next byte without consuming it.
    pub fn peek_u8(&self) -> Result<u8, AcseError> {
        self.unread_slice().first().copied().ok_or(AcseError::UnexpectedEnd)
    }

    pub fn read_u8(&mut self) -> Result<u8, AcseError> {
        let byte = self.peek_u8()?;
        self.read_position += 1;
        Ok(byte)
    }

    /// Read a big-endian 16-bit value.
    pub fn read_u16(&mut self) -> Result<u16, AcseError> {
        let mut bytes = [0u8; 2];
        self.read_into(&mut bytes)?;
        Ok(u16::from_be_bytes(bytes))
    }

    /// Fill `out` entirely from the unread data.
    pub fn read_into(&mut self, out: &mut [u8]) -> Result<(), AcseError> {
        if out.len() > self.unread() {
            return Err(AcseError::UnexpectedEnd);
        }
        let start = self.read_position;
        out.copy_from_slice(&self.buffer[start..start + out.len()]);
        self.read_position += out.len();
        Ok(())
    }

    /// Advance the read position without looking at the bytes.
    pub fn skip(&mut self, count: usize) -> Result<(), AcseError> {
        if count > self.unread() {
            return Err(AcseError::UnexpectedEnd);
        }
        self.read_position += count;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Writing
    // ------------------------------------------------------------------------

    /// Restart writing (and reading) from offset 0, dropping any open slot.
    pub fn rewind(&mut self) {
        self.read_position = 0;
        self.write_position = 0;
        self.slots.clear();
    }

    pub fn write_u8(&mut self, byte: u8) -> Result<(), AcseError> {
        let slot = self.buffer.get_mut(self.write_position).ok_or(AcseError::BufferFull)?;
        *slot = byte;
        self.write_position += 1;
        Ok(())
    }

    /// Write a big-endian 16-bit value.
    pub fn write_u16(&mut self, value: u16) -> Result<(), AcseError> {
        self.write_slice(&value.to_be_bytes())
    }

    pub fn write_slice(&mut self, bytes: &[u8]) -> Result<(), AcseError> {
        let end = self.write_position + bytes.len();
        if end > self.buffer.len() {
            return Err(AcseError::BufferFull);
        }
        self.buffer[self.write_position..end].copy_from_slice(bytes);
        self.write_position = end;
        Ok(())
    }

    /// Overwrite an already written byte.
    pub fn set(&mut self, offset: usize, byte: u8) -> Result<(), AcseError> {
        if offset >= self.write_position {
            return Err(AcseError::BufferFull);
        }
        self.buffer[offset] = byte;
        Ok(())
    }

    /// Reserve a one-byte length at the write position.
    pub fn open_length(&mut self) -> Result<(), AcseError> {
        let offset = self.write_position;
        if self.slots.is_full() {
            return Err(AcseError::LengthSlot);
        }
        self.write_u8(0)?;
        self.slots.push(offset).map_err(|_| AcseError::LengthSlot)
    }

    /// Patch the innermost reserved length with the bytes written after it.
    ///
    /// Lengths above 127 take the long form: the content is moved up by the
    /// extra length octets. Returns the content length.
    pub fn close_length(&mut self) -> Result<usize, AcseError> {
        let offset = self.slots.pop().ok_or(AcseError::LengthSlot)?;
        let start = offset + 1;
        let length = self.write_position - start;
        if length <= MAX_SHORT_LENGTH {
            self.set(offset, length as u8)?;
            return Ok(length);
        }

        let extra = match length {
            0..=0xFF => 1,
            0x100..=0xFFFF => 2,
            _ => return Err(AcseError::LengthOverflow),
        };
        let end = self.write_position + extra;
        if end > self.buffer.len() {
            return Err(AcseError::BufferFull);
        }
        self.buffer.copy_within(start..self.write_position, start + extra);
        self.buffer[offset] = 0x80 | extra as u8;
        let octets = (length as u16).to_be_bytes();
        self.buffer[start..start + extra].copy_from_slice(&octets[octets.len() - extra..]);
        self.write_position = end;
        Ok(length)
    }
}

//! Cursor over a Draco bitstream.
//!
//! All multi-byte values are little-endian. Bit-packed sections are read
//! least-significant bit first and always end on a byte boundary.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{DracoError, Result};

/// Packs a bitstream version the way the header stores it: major in the high byte.
pub const fn bitstream_version(major: u8, minor: u8) -> u16 {
    ((major as u16) << 8) | minor as u16
}

#[derive(Debug, Clone)]
pub struct DecoderBuffer<'a> {
    data: &'a [u8],
    pos: usize,
    version: u16,
    bit_mode: bool,
    bit_start: usize,
    bit_offset: usize,
}

impl<'a> DecoderBuffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            version: bitstream_version(2, 2),
            bit_mode: false,
            bit_start: 0,
            bit_offset: 0,
        }
    }

    pub fn set_version(&mut self, major: u8, minor: u8) {
        self.version = bitstream_version(major, minor);
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining_size(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Bytes from the cursor to the end of the stream.
    pub fn remaining_data(&self) -> &'a [u8] {
        &self.data[self.pos.min(self.data.len())..]
    }

    pub fn advance(&mut self, bytes: usize) -> Result<()> {
        if bytes > self.remaining_size() {
            return Err(DracoError::UnexpectedEnd("skipped section"));
        }
        self.pos += bytes;
        Ok(())
    }

    pub fn read_bytes(&mut self, len: usize, what: &'static str) -> Result<&'a [u8]> {
        if len > self.remaining_size() {
            return Err(DracoError::UnexpectedEnd(what));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1, "u8")?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.read_bytes(2, "u16")?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4, "u32")?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.read_bytes(4, "i32")?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.read_bytes(8, "u64")?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.read_bytes(4, "f32")?))
    }

    /// LEB128-style unsigned varint, at most ten bytes.
    pub fn read_varint_u64(&mut self) -> Result<u64> {
        let mut value = 0u64;
        for i in 0..10 {
            let byte = self.read_u8()?;
            value |= u64::from(byte & 0x7F) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(DracoError::Corrupt("varint longer than ten bytes".to_string()))
    }

    pub fn read_varint_u32(&mut self) -> Result<u32> {
        let value = self.read_varint_u64()?;
        u32::try_from(value)
            .map_err(|_| DracoError::Corrupt(format!("varint {value} exceeds 32 bits")))
    }

    /// Counts before 2.0 are fixed u32 fields; later versions use varints.
    pub fn read_count(&mut self) -> Result<u32> {
        if self.version < bitstream_version(2, 0) {
            self.read_u32()
        } else {
            self.read_varint_u32()
        }
    }

    // ========================================================================
    // Bit-packed sections
    // ========================================================================

    /// Enters bit mode. With `decode_size` the section length is read first
    /// and returned.
    pub fn start_bit_decoding(&mut self, decode_size: bool) -> Result<u64> {
        let size = if decode_size {
            if self.version < bitstream_version(2, 2) {
                self.read_u64()?
            } else {
                self.read_varint_u64()?
            }
        } else {
            0
        };
        self.bit_mode = true;
        self.bit_start = self.pos;
        self.bit_offset = 0;
        Ok(size)
    }

    pub fn bit_decoder_active(&self) -> bool {
        self.bit_mode
    }

    /// Reads `nbits` bits, the first one read landing in bit 0. Bits past the
    /// end of the stream read as zero.
    pub fn decode_lsb_bits(&mut self, nbits: u32) -> u32 {
        let mut value = 0u32;
        for bit in 0..nbits {
            let offset = self.bit_start + (self.bit_offset >> 3);
            let shift = self.bit_offset & 7;
            let b = self.data.get(offset).map_or(0, |byte| (byte >> shift) & 1);
            self.bit_offset += 1;
            value |= u32::from(b) << bit;
        }
        value
    }

    pub fn end_bit_decoding(&mut self) {
        self.bit_mode = false;
        let bytes = (self.bit_offset + 7) / 8;
        self.pos = (self.bit_start + bytes).min(self.data.len());
    }
}

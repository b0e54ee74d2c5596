use alloc::string::String;
use byteorder::{ByteOrder, LittleEndian};

use crate::errors::Malformed;

/// Bounds-checked little-endian cursor over a byte slice.
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8], offset: usize) -> Self {
        Reader { data, offset }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8], Malformed> {
        let eof = Malformed::UnexpectedEof {
            offset: self.offset,
            needed: len,
        };
        let end = self.offset.checked_add(len).ok_or_else(|| eof.clone())?;
        let bytes = self.data.get(self.offset..end).ok_or(eof)?;
        self.offset = end;

        Ok(bytes)
    }

    pub(crate) fn skip(&mut self, len: usize) -> Result<(), Malformed> {
        self.take(len).map(|_| ())
    }

    pub(crate) fn u8(&mut self) -> Result<u8, Malformed> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16, Malformed> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub(crate) fn u32(&mut self) -> Result<u32, Malformed> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub(crate) fn f32(&mut self) -> Result<f32, Malformed> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    /// Read a fixed-width, null-terminated field. Every byte is one character.
    pub(crate) fn string(&mut self, len: usize) -> Result<String, Malformed> {
        let field = self.take(len)?;
        let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());

        Ok(field[..end].iter().map(|&b| char::from(b)).collect())
    }

    /// Read a record count and make sure `count` records of `record_len` bytes
    /// are still available.
    pub(crate) fn count(
        &mut self,
        field: &'static str,
        record_len: usize,
    ) -> Result<u16, Malformed> {
        let count = self.u16()?;
        if usize::from(count) * record_len > self.remaining() {
            return Err(Malformed::CountOutOfRange { field, count });
        }

        Ok(count)
    }
}

use crate::error::{Error, Result};
use crate::protocol::cursor::ByteCursor;

/// Header byte of a binary protocol row packet.
pub const BINARY_ROW_HEADER: u8 = 0x00;

/// NULL bitmap of a binary protocol row.
///
/// Result-set rows reserve the first two bits, so column `i` lives at bit
/// `i + 2`.
#[derive(Debug, Clone, Copy)]
pub struct NullBitmap<'a> {
    bitmap: &'a [u8],
    offset: usize,
}

impl<'a> NullBitmap<'a> {
    /// Create a NULL bitmap for result sets (offset = 2)
    pub fn for_result_set(bitmap: &'a [u8]) -> Self {
        Self { bitmap, offset: 2 }
    }

    /// Number of bitmap bytes for `num_columns` result-set columns.
    pub fn result_set_len(num_columns: usize) -> usize {
        (num_columns + 7 + 2) >> 3
    }

    /// Check if the column at the given index is NULL
    pub fn is_null(&self, idx: usize) -> bool {
        let bit_pos = idx + self.offset;
        let byte_pos = bit_pos >> 3;
        let bit_offset = bit_pos & 7;

        match self.bitmap.get(byte_pos) {
            Some(byte) => (byte & (1 << bit_offset)) != 0,
            None => false,
        }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bitmap
    }
}

/// The payload part of a binary row packet, split into bitmap and values.
#[derive(Debug, Clone, Copy)]
pub struct BinaryRowPayload<'a> {
    null_bitmap: NullBitmap<'a>,
    values: &'a [u8],
    num_columns: usize,
}

impl<'a> BinaryRowPayload<'a> {
    pub fn null_bitmap(&self) -> NullBitmap<'a> {
        self.null_bitmap
    }

    pub fn values(&self) -> &'a [u8] {
        self.values
    }

    pub fn num_columns(&self) -> usize {
        self.num_columns
    }
}

/// Split a binary row packet into its NULL bitmap and value bytes.
pub fn read_binary_row(payload: &[u8], num_columns: usize) -> Result<BinaryRowPayload<'_>> {
    let mut cursor = ByteCursor::new(payload);
    let header = cursor.read_u8()?;
    if header != BINARY_ROW_HEADER {
        return Err(Error::InvalidRowHeader(header));
    }
    let bitmap = cursor.read_bytes(NullBitmap::result_set_len(num_columns))?;
    Ok(BinaryRowPayload {
        null_bitmap: NullBitmap::for_result_set(bitmap),
        values: cursor.rest(),
        num_columns,
    })
}

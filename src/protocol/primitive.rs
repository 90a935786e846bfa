//! Length-encoded integers and strings.
//!
//! | first byte | meaning                          | consumed |
//! |------------|----------------------------------|----------|
//! | `< 0xFB`   | the value itself                 | 1        |
//! | `0xFB`     | NULL                             | 1        |
//! | `0xFC`     | 2-byte little-endian integer     | 3        |
//! | `0xFD`     | 3-byte little-endian integer     | 4        |
//! | `0xFE`     | 8-byte little-endian integer     | 9        |
//! | `0xFF`     | invalid                          | -        |

use crate::error::{Error, Result};
use crate::protocol::cursor::ByteCursor;

pub const LENENC_NULL: u8 = 0xFB;
const LENENC_U16: u8 = 0xFC;
const LENENC_U24: u8 = 0xFD;
const LENENC_U64: u8 = 0xFE;

/// A decoded length-encoded integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthEncoded {
    Null,
    Value(u64),
}

/// Read a length-encoded integer, advancing the cursor only on success.
pub fn read_int_lenenc(cursor: &mut ByteCursor<'_>) -> Result<LengthEncoded> {
    let mut probe = *cursor;
    let value = match probe.read_u8()? {
        LENENC_NULL => LengthEncoded::Null,
        LENENC_U16 => LengthEncoded::Value(u64::from(probe.read_u16_le()?)),
        LENENC_U24 => LengthEncoded::Value(u64::from(probe.read_u24_le()?)),
        LENENC_U64 => LengthEncoded::Value(probe.read_u64_le()?),
        0xFF => return Err(Error::InvalidLengthEncodedInteger(0xFF)),
        val => LengthEncoded::Value(u64::from(val)),
    };
    *cursor = probe;
    Ok(value)
}

/// Read a length-encoded byte string, advancing the cursor only on success.
///
/// Returns `None` for the NULL marker.
pub fn read_bytes_lenenc<'a>(cursor: &mut ByteCursor<'a>) -> Result<Option<&'a [u8]>> {
    let mut probe = *cursor;
    let len = match read_int_lenenc(&mut probe)? {
        LengthEncoded::Null => {
            *cursor = probe;
            return Ok(None);
        }
        LengthEncoded::Value(len) => len,
    };
    let Ok(len) = usize::try_from(len) else {
        return Err(Error::TruncatedData {
            needed: usize::MAX,
            available: probe.remaining(),
        });
    };
    let bytes = probe.read_bytes(len)?;
    *cursor = probe;
    Ok(Some(bytes))
}

/// Decode a length-encoded integer at `pos`, returning the value and the number
/// of bytes consumed.
pub fn read_int_lenenc_at(data: &[u8], pos: usize) -> Result<(LengthEncoded, usize)> {
    let mut cursor = ByteCursor::at(data, pos);
    let value = read_int_lenenc(&mut cursor)?;
    Ok((value, cursor.position() - pos))
}

/// Decode a length-encoded string at `pos`, returning the bytes (or `None` for
/// NULL) and the number of bytes consumed.
pub fn read_bytes_lenenc_at(data: &[u8], pos: usize) -> Result<(Option<&[u8]>, usize)> {
    let mut cursor = ByteCursor::at(data, pos);
    let bytes = read_bytes_lenenc(&mut cursor)?;
    Ok((bytes, cursor.position() - pos))
}

/// Write 2-byte little-endian integer
pub fn write_int_2(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Write 3-byte little-endian integer
pub fn write_int_3(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes()[..3]);
}

/// Write 4-byte little-endian integer
pub fn write_int_4(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Write 8-byte little-endian integer
pub fn write_int_8(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Write length-encoded integer using the shortest form
pub fn write_int_lenenc(out: &mut Vec<u8>, value: u64) {
    if value < 251 {
        out.push(value as u8);
    } else if value < (1 << 16) {
        out.push(LENENC_U16);
        write_int_2(out, value as u16);
    } else if value < (1 << 24) {
        out.push(LENENC_U24);
        write_int_3(out, value as u32);
    } else {
        out.push(LENENC_U64);
        write_int_8(out, value);
    }
}

/// Write length-encoded bytes
pub fn write_bytes_lenenc(out: &mut Vec<u8>, data: &[u8]) {
    write_int_lenenc(out, data.len() as u64);
    out.extend_from_slice(data);
}

/// Write the length-encoded NULL marker
pub fn write_null_lenenc(out: &mut Vec<u8>) {
    out.push(LENENC_NULL);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenenc_int_length_classes() {
        let cases: [(u64, usize); 8] = [
            (0, 1),
            (250, 1),
            (251, 3),
            (0xFFFF, 3),
            (0x1_0000, 4),
            (0xFF_FFFF, 4),
            (0x100_0000, 9),
            (u64::MAX, 9),
        ];
        for (value, consumed) in cases {
            let mut buf = Vec::new();
            write_int_lenenc(&mut buf, value);
            assert_eq!(buf.len(), consumed, "encoded width of {value}");
            assert_eq!(
                read_int_lenenc_at(&buf, 0).unwrap(),
                (LengthEncoded::Value(value), consumed)
            );
        }
    }

    #[test]
    fn lenenc_int_reads_little_endian_payloads() {
        let data = [0xFC, 0x34, 0x12];
        assert_eq!(
            read_int_lenenc_at(&data, 0).unwrap(),
            (LengthEncoded::Value(0x1234), 3)
        );

        let data = [0x00, 0xFD, 0x56, 0x34, 0x12];
        assert_eq!(
            read_int_lenenc_at(&data, 1).unwrap(),
            (LengthEncoded::Value(0x12_3456), 4)
        );

        let data = [0xFE, 1, 2, 3, 4, 5, 6, 7, 8];
        assert_eq!(
            read_int_lenenc_at(&data, 0).unwrap(),
            (LengthEncoded::Value(0x0807_0605_0403_0201), 9)
        );
    }

    #[test]
    fn lenenc_int_null_and_invalid() {
        assert_eq!(
            read_int_lenenc_at(&[0xFB, 0x99], 0).unwrap(),
            (LengthEncoded::Null, 1)
        );
        assert!(matches!(
            read_int_lenenc_at(&[0xFF], 0),
            Err(Error::InvalidLengthEncodedInteger(0xFF))
        ));
    }

    #[test]
    fn lenenc_int_truncated() {
        assert!(matches!(
            read_int_lenenc_at(&[], 0),
            Err(Error::TruncatedData { needed: 1, .. })
        ));
        assert!(matches!(
            read_int_lenenc_at(&[0xFE, 1, 2, 3], 0),
            Err(Error::TruncatedData {
                needed: 8,
                available: 3
            })
        ));
    }

    #[test]
    fn lenenc_string_null() {
        assert_eq!(read_bytes_lenenc_at(&[0xFB], 0).unwrap(), (None, 1));
    }

    #[test]
    fn lenenc_string_payload() {
        let data = [0x03, b'a', b'b', b'c', 0xEE];
        assert_eq!(
            read_bytes_lenenc_at(&data, 0).unwrap(),
            (Some(&b"abc"[..]), 4)
        );

        let payload = vec![b'x'; 300];
        let mut buf = Vec::new();
        write_bytes_lenenc(&mut buf, &payload);
        let (bytes, consumed) = read_bytes_lenenc_at(&buf, 0).unwrap();
        assert_eq!(bytes.unwrap().len(), 300);
        assert_eq!(consumed, 303);
    }

    #[test]
    fn lenenc_string_truncated_does_not_advance() {
        let data = [0x05, b'a', b'b'];
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            read_bytes_lenenc(&mut cursor),
            Err(Error::TruncatedData {
                needed: 5,
                available: 2
            })
        ));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn write_null_marker() {
        let mut buf = Vec::new();
        write_null_lenenc(&mut buf);
        assert_eq!(buf, [LENENC_NULL]);
    }
}

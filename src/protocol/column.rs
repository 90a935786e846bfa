use zerocopy::byteorder::little_endian::{U16 as U16LE, U32 as U32LE};
use zerocopy::{FromBytes, Immutable, KnownLayout};

use crate::constant::{ColumnFlags, ColumnType};
use crate::error::{Error, Result, eyre};
use crate::protocol::cursor::ByteCursor;
use crate::protocol::primitive::{LengthEncoded, read_bytes_lenenc, read_int_lenenc};

/// What the row decoder needs to know about one result-set column.
///
/// The type tag is kept as the raw byte so that tags this crate does not know
/// survive until the decode plan is built and can be reported there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub column_type: u8,
    pub unsigned: bool,
    pub ordinal: usize,
}

impl ColumnDescriptor {
    pub fn new(column_type: ColumnType, unsigned: bool, ordinal: usize) -> Self {
        Self {
            column_type: column_type as u8,
            unsigned,
            ordinal,
        }
    }

    /// Descriptor for an arbitrary tag, known or not.
    pub fn from_raw(column_type: u8, unsigned: bool, ordinal: usize) -> Self {
        Self {
            column_type,
            unsigned,
            ordinal,
        }
    }

    /// Build a descriptor from a column definition packet payload.
    pub fn from_definition(payload: &[u8], ordinal: usize) -> Result<Self> {
        let definition = ColumnDefinition::parse(payload)?;
        Ok(definition.descriptor(ordinal))
    }

    pub fn known_type(&self) -> Option<ColumnType> {
        ColumnType::from_u8(self.column_type)
    }
}

/// Column definition packet (Protocol::ColumnDefinition41), names borrowed from
/// the packet payload.
#[derive(Debug, Clone)]
pub struct ColumnDefinition<'a> {
    pub schema: &'a [u8],
    pub table_alias: &'a [u8],
    pub table_original: &'a [u8],
    pub name_alias: &'a [u8],
    pub name_original: &'a [u8],
    pub tail: &'a ColumnDefinitionTail,
}

impl<'a> ColumnDefinition<'a> {
    pub fn parse(payload: &'a [u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(payload);
        let mut name = || -> Result<&'a [u8]> {
            Ok(read_bytes_lenenc(&mut cursor)?.unwrap_or_default())
        };
        let _catalog = name()?;
        let schema = name()?;
        let table_alias = name()?;
        let table_original = name()?;
        let name_alias = name()?;
        let name_original = name()?;

        // length of the fixed-size tail, always 0x0c
        match read_int_lenenc(&mut cursor)? {
            LengthEncoded::Value(12) => {}
            other => {
                return Err(Error::LibraryBug(eyre!(
                    "unexpected column definition tail length: {other:?}"
                )));
            }
        }
        let tail = ColumnDefinitionTail::ref_from_bytes(cursor.read_bytes(12)?)
            .map_err(Error::from_debug)?;

        Ok(Self {
            schema,
            table_alias,
            table_original,
            name_alias,
            name_original,
            tail,
        })
    }

    pub fn descriptor(&self, ordinal: usize) -> ColumnDescriptor {
        ColumnDescriptor::from_raw(
            self.tail.column_type(),
            self.tail.flags().contains(ColumnFlags::UNSIGNED_FLAG),
            ordinal,
        )
    }
}

/// Fixed-size tail of Column Definition packet (12 bytes)
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
pub struct ColumnDefinitionTail {
    charset: U16LE,
    column_length: U32LE,
    column_type: u8,
    flags: U16LE,
    decimals: u8,
    reserved: U16LE,
}

impl ColumnDefinitionTail {
    pub fn charset(&self) -> u16 {
        self.charset.get()
    }

    pub fn column_length(&self) -> u32 {
        self.column_length.get()
    }

    /// Raw type tag; see [`ColumnType::from_u8`].
    pub fn column_type(&self) -> u8 {
        self.column_type
    }

    /// Known flags; unknown bits are dropped.
    pub fn flags(&self) -> ColumnFlags {
        ColumnFlags::from_bits_truncate(self.flags.get())
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::BINARY_CHARSET;
    use crate::protocol::primitive::{write_bytes_lenenc, write_int_lenenc};

    fn definition_packet(name: &str, tail: [u8; 12]) -> Vec<u8> {
        let mut out = Vec::new();
        for field in ["def", "shop", "t", "orders", name, name] {
            write_bytes_lenenc(&mut out, field.as_bytes());
        }
        write_int_lenenc(&mut out, 12);
        out.extend_from_slice(&tail);
        out
    }

    #[test]
    fn tail_is_twelve_bytes() {
        assert_eq!(size_of::<ColumnDefinitionTail>(), 12);
    }

    #[test]
    fn unsigned_tiny_from_definition() {
        let tail = [
            0x3f, 0x00, // charset = 63 (binary)
            0x03, 0x00, 0x00, 0x00, // column_length = 3
            0x01, // column_type = TINY
            0x21, 0x00, // flags = NOT_NULL | UNSIGNED
            0x00, // decimals
            0x00, 0x00, // reserved
        ];
        let packet = definition_packet("qty", tail);
        let definition = ColumnDefinition::parse(&packet).unwrap();
        assert_eq!(definition.name_alias, b"qty");
        assert_eq!(definition.table_original, b"orders");
        assert_eq!(definition.tail.charset(), BINARY_CHARSET);
        assert_eq!(definition.tail.column_length(), 3);

        let descriptor = ColumnDescriptor::from_definition(&packet, 4).unwrap();
        assert_eq!(
            descriptor,
            ColumnDescriptor::new(ColumnType::MYSQL_TYPE_TINY, true, 4)
        );
    }

    #[test]
    fn unknown_type_tag_is_preserved() {
        let tail = [
            0x21, 0x00, 0xFF, 0x00, 0x00, 0x00, 0xEE, 0x03, 0xC2, 0x00, 0x00, 0x00,
        ];
        let descriptor =
            ColumnDescriptor::from_definition(&definition_packet("x", tail), 0).unwrap();
        assert_eq!(descriptor.column_type, 0xEE);
        assert_eq!(descriptor.known_type(), None);
        assert!(!descriptor.unsigned);
    }

    #[test]
    fn truncated_definition_fails() {
        let mut packet = definition_packet("x", [0; 12]);
        packet.truncate(packet.len() - 3);
        assert!(matches!(
            ColumnDefinition::parse(&packet),
            Err(Error::TruncatedData {
                needed: 12,
                available: 9
            })
        ));
    }
}

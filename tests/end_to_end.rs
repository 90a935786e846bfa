//! Column definitions in, decoded rows out.
//!
//! Rows are decoded once directly through a plan and once through a
//! `Connection`/`ResultSet` reading from an in-memory row source.

use std::collections::VecDeque;

use chrono::{FixedOffset, TimeZone as _};
use mysql_binrow::constant::BINARY_CHARSET;
use mysql_binrow::protocol::primitive::{write_bytes_lenenc, write_int_lenenc};
use mysql_binrow::{
    ColumnDescriptor, Connection, Error, Opts, TemporalConfig, TimeZone, Value, build_decode_plan,
    decode_row,
};
use pretty_assertions::assert_eq;

const TINY: u8 = 0x01;
const VAR_STRING: u8 = 0xfd;
const DATETIME: u8 = 0x0c;
const UNSIGNED_FLAG: u16 = 0x0020;

fn definition(name: &str, column_type: u8, flags: u16) -> Vec<u8> {
    let mut out = Vec::new();
    for field in ["def", "shop", "o", "orders", name, name] {
        write_bytes_lenenc(&mut out, field.as_bytes());
    }
    write_int_lenenc(&mut out, 12);
    out.extend_from_slice(&BINARY_CHARSET.to_le_bytes());
    out.extend_from_slice(&26u32.to_le_bytes());
    out.push(column_type);
    out.extend_from_slice(&flags.to_le_bytes());
    out.push(0);
    out.extend_from_slice(&[0, 0]);
    out
}

fn columns() -> Vec<ColumnDescriptor> {
    [
        definition("qty", TINY, UNSIGNED_FLAG),
        definition("name", VAR_STRING, 0),
        definition("created_at", DATETIME, 0),
    ]
    .iter()
    .enumerate()
    .map(|(ordinal, packet)| ColumnDescriptor::from_definition(packet, ordinal).unwrap())
    .collect()
}

fn row() -> Vec<u8> {
    vec![
        0xFF, // TINYINT UNSIGNED 255
        3, b'a', b'b', b'c', // VARCHAR "abc"
        11, 0xE8, 0x07, 1, 1, 0, 0, 0, 0, 0, 0, 0, // DATETIME(11) 2024-01-01
    ]
}

#[test]
fn raw_mode_row() {
    let plan = build_decode_plan(&columns(), &TemporalConfig::raw()).unwrap();
    assert_eq!(
        decode_row(&plan, &row()).unwrap(),
        vec![
            Value::UnsignedInt(255),
            Value::Bytes(b"abc".to_vec()),
            Value::Text("2024-01-01 00:00:00.000000".to_owned()),
        ]
    );
}

#[test]
fn zoned_mode_row() {
    let zone = FixedOffset::east_opt(2 * 3600).unwrap();
    let plan =
        build_decode_plan(&columns(), &TemporalConfig::zoned(TimeZone::Fixed(zone))).unwrap();
    let values = decode_row(&plan, &row()).unwrap();
    assert_eq!(
        values[2],
        Value::DateTime(zone.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(values[2].to_string(), "2024-01-01 00:00:00 +02:00");
}

#[test]
fn truncated_row_names_failing_column() {
    let plan = build_decode_plan(&columns(), &TemporalConfig::raw()).unwrap();
    let mut row = row();
    row.truncate(3);

    let err = decode_row(&plan, &row).unwrap_err();
    assert_eq!(err.column(), Some(1));
    assert!(matches!(err.root(), Error::TruncatedData { .. }));
}

#[test]
fn rows_through_connection() {
    let opts = Opts::try_from("mysql://localhost/shop?parseTime=false").unwrap();
    let rows: VecDeque<Vec<u8>> = vec![row(), row()].into();
    let mut conn = Connection::new(rows, &opts);

    let decoded = conn
        .result_set(&columns())
        .unwrap()
        .map(|row| row.unwrap())
        .collect::<Vec<_>>();
    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded[0], decoded[1]);
    assert_eq!(decoded[0][1], Value::Bytes(b"abc".to_vec()));

    conn.close().unwrap();
}

#[test]
fn typed_rows_through_connection() {
    let opts = Opts::try_from("mysql://localhost/shop?parseTime=true&loc=UTC").unwrap();
    let rows: VecDeque<Vec<u8>> = vec![row()].into();
    let mut conn = Connection::new(rows, &opts);
    let mut rs = conn.result_set(&columns()).unwrap();

    let (qty, name, created_at): (u8, String, chrono::NaiveDateTime) =
        rs.next_as().unwrap().unwrap();
    assert_eq!(qty, 255);
    assert_eq!(name, "abc");
    assert_eq!(created_at.to_string(), "2024-01-01 00:00:00");
    assert_eq!(rs.next_as::<(u8, String, chrono::NaiveDateTime)>().unwrap(), None);
}

use chrono::{FixedOffset, TimeZone as _};

use crate::value::Value;

#[test]
fn test_display() {
    assert_eq!(Value::Null.to_string(), "NULL");
    assert_eq!(Value::SignedInt(-42).to_string(), "-42");
    assert_eq!(Value::UnsignedInt(u64::MAX).to_string(), "18446744073709551615");
    assert_eq!(Value::Double(1.5).to_string(), "1.5");
    assert_eq!(Value::Bytes(b"abc".to_vec()).to_string(), "abc");
    assert_eq!(Value::Text("838:59:59".to_owned()).to_string(), "838:59:59");

    let zone = FixedOffset::east_opt(9 * 3600).unwrap();
    let instant = zone.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(
        Value::DateTime(instant).to_string(),
        "2024-01-01 00:00:00 +09:00"
    );
}

#[test]
fn test_as_bytes() {
    assert_eq!(Value::Bytes(vec![0, 1]).as_bytes(), Some(&[0u8, 1][..]));
    assert_eq!(
        Value::Text("2024-01-01".to_owned()).as_bytes(),
        Some(&b"2024-01-01"[..])
    );
    assert_eq!(Value::SignedInt(1).as_bytes(), None);
    assert_eq!(Value::Null.as_bytes(), None);
}

#[test]
fn test_from_conversions() {
    assert_eq!(Value::from(-1i64), Value::SignedInt(-1));
    assert_eq!(Value::from(1u64), Value::UnsignedInt(1));
    assert_eq!(Value::from("abc"), Value::Bytes(b"abc".to_vec()));
    assert_eq!(Value::from(None::<i64>), Value::Null);
    assert_eq!(Value::from(Some(2.5f64)), Value::Double(2.5));
    assert!(Value::default().is_null());
}

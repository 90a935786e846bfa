//! Row decoding against a [`DecodePlan`].

use crate::error::{Error, Result};
use crate::plan::DecodePlan;
use crate::protocol::row::read_binary_row;
use crate::value::Value;

/// Decode one row of values laid out back to back, one per plan column.
///
/// Errors carry the failing column index (see [`Error::column`]). Bytes left
/// after the last column are ignored.
pub fn decode_row(plan: &DecodePlan, row: &[u8]) -> Result<Vec<Value>> {
    let mut values = vec![Value::Null; plan.len()];
    decode_row_into(plan, row, &mut values)?;
    Ok(values)
}

/// Like [`decode_row`], reusing `dest` (which must have one slot per column).
///
/// Returns the number of bytes consumed. If an error is returned, `dest` may
/// hold values of the columns before the failing one and must not be used as
/// a row.
pub fn decode_row_into(plan: &DecodePlan, row: &[u8], dest: &mut [Value]) -> Result<usize> {
    check_width(plan, dest)?;
    let mut pos = 0;
    for (column, (decoder, slot)) in plan.decoders().iter().zip(dest.iter_mut()).enumerate() {
        pos += decoder
            .decode(slot, row, pos)
            .map_err(|err| err.in_column(column))?;
    }
    Ok(pos)
}

/// Decode a complete binary row packet: header byte, NULL bitmap, then the
/// values of the non-NULL columns.
pub fn decode_binary_row(plan: &DecodePlan, packet: &[u8]) -> Result<Vec<Value>> {
    let mut values = vec![Value::Null; plan.len()];
    decode_binary_row_into(plan, packet, &mut values)?;
    Ok(values)
}

/// Like [`decode_binary_row`], reusing `dest`.
pub fn decode_binary_row_into(plan: &DecodePlan, packet: &[u8], dest: &mut [Value]) -> Result<()> {
    check_width(plan, dest)?;
    let row = read_binary_row(packet, plan.len())?;
    let null_bitmap = row.null_bitmap();
    let data = row.values();
    let mut pos = 0;
    for (column, (decoder, slot)) in plan.decoders().iter().zip(dest.iter_mut()).enumerate() {
        if null_bitmap.is_null(column) {
            *slot = Value::Null;
            continue;
        }
        pos += decoder
            .decode(slot, data, pos)
            .map_err(|err| err.in_column(column))?;
    }
    Ok(())
}

fn check_width(plan: &DecodePlan, dest: &[Value]) -> Result<()> {
    if dest.len() != plan.len() {
        return Err(Error::BadUsageError(format!(
            "row has {} columns, destination has {} slots",
            plan.len(),
            dest.len()
        )));
    }
    Ok(())
}

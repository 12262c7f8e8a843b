use thiserror::Error;

use crate::parser::Cell;
use crate::schema::{FieldType, RecordSchema};

/// A flattened row that does not fit its record layout
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("{table}: expected {expected} fields, found {found}")]
    FieldCount {
        table: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{field}: cannot store a {found} in a {expected} field")]
    TypeMismatch {
        field: &'static str,
        expected: FieldType,
        found: &'static str,
    },
    #[error("{field}: expected {expected} elements, found {found}")]
    ArrayLength {
        field: &'static str,
        expected: usize,
        found: usize,
    },
}

/// Append one packed record to `out`
///
/// Integers wrap to the field width, strings are cut at the field capacity.
/// Neither is an error.
pub fn encode_row(schema: &RecordSchema, row: &[Cell], out: &mut Vec<u8>) -> Result<(), EncodeError> {
    if row.len() != schema.fields.len() {
        return Err(EncodeError::FieldCount {
            table: schema.name,
            expected: schema.fields.len(),
            found: row.len(),
        });
    }

    for (field, cell) in schema.fields.iter().zip(row) {
        encode_cell(field.name, &field.field_type, cell, out)?;
    }
    Ok(())
}

fn encode_cell(
    name: &'static str,
    field_type: &FieldType,
    cell: &Cell,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    let mismatch = || EncodeError::TypeMismatch {
        field: name,
        expected: *field_type,
        found: cell.kind(),
    };

    match field_type {
        FieldType::Int8
        | FieldType::UInt8
        | FieldType::Int16
        | FieldType::UInt16
        | FieldType::Int32
        | FieldType::UInt32 => {
            let value = match cell {
                Cell::Int(i) => *i,
                Cell::Float(f) => *f as i64,
                Cell::Bool(b) => *b as i64,
                Cell::Null => 0,
                Cell::Text(_) | Cell::List(_) => return Err(mismatch()),
            };
            match field_type {
                FieldType::Int8 => out.push(value as i8 as u8),
                FieldType::UInt8 => out.push(value as u8),
                FieldType::Int16 => out.extend_from_slice(&(value as i16).to_le_bytes()),
                FieldType::UInt16 => out.extend_from_slice(&(value as u16).to_le_bytes()),
                FieldType::Int32 => out.extend_from_slice(&(value as i32).to_le_bytes()),
                _ => out.extend_from_slice(&(value as u32).to_le_bytes()),
            }
        }
        FieldType::Float16 | FieldType::Float32 => {
            let value = match cell {
                Cell::Int(i) => *i as f64,
                Cell::Float(f) => *f,
                Cell::Bool(b) => *b as i64 as f64,
                Cell::Null => f64::NAN,
                Cell::Text(_) | Cell::List(_) => return Err(mismatch()),
            };
            if *field_type == FieldType::Float16 {
                out.extend_from_slice(&f32_to_f16(value as f32).to_le_bytes());
            } else {
                out.extend_from_slice(&(value as f32).to_le_bytes());
            }
        }
        FieldType::Bool => {
            let value = match cell {
                Cell::Bool(b) => *b,
                Cell::Int(i) => *i != 0,
                Cell::Float(f) => *f != 0.0,
                Cell::Null => false,
                Cell::Text(_) | Cell::List(_) => return Err(mismatch()),
            };
            out.push(value as u8);
        }
        FieldType::Bytes(capacity) => {
            let text = match cell {
                Cell::Text(bytes) => bytes.clone(),
                Cell::Int(_) | Cell::Float(_) | Cell::Bool(_) => cell.to_string().into_bytes(),
                Cell::Null => Vec::new(),
                Cell::List(_) => return Err(mismatch()),
            };
            let kept = text.len().min(*capacity);
            out.extend_from_slice(&text[..kept]);
            out.resize(out.len() + *capacity - kept, 0);
        }
        FieldType::Array(elem, len) => {
            let items = match cell {
                Cell::List(items) => items,
                _ => return Err(mismatch()),
            };
            if items.len() != *len {
                return Err(EncodeError::ArrayLength {
                    field: name,
                    expected: *len,
                    found: items.len(),
                });
            }
            for item in items {
                encode_cell(name, elem, item, out)?;
            }
        }
    }
    Ok(())
}

/// Unpack one record into cells
///
/// `bytes` must be exactly `schema.record_size()` long.
pub fn decode_row(schema: &RecordSchema, bytes: &[u8]) -> Vec<Cell> {
    let mut offset = 0;
    schema
        .fields
        .iter()
        .map(|field| {
            let width = field.field_type.width();
            let cell = decode_cell(&field.field_type, &bytes[offset..offset + width]);
            offset += width;
            cell
        })
        .collect()
}

fn decode_cell(field_type: &FieldType, bytes: &[u8]) -> Cell {
    match field_type {
        FieldType::Int8 => Cell::Int(bytes[0] as i8 as i64),
        FieldType::UInt8 => Cell::Int(bytes[0] as i64),
        FieldType::Int16 => Cell::Int(i16::from_le_bytes([bytes[0], bytes[1]]) as i64),
        FieldType::UInt16 => Cell::Int(u16::from_le_bytes([bytes[0], bytes[1]]) as i64),
        FieldType::Int32 => Cell::Int(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64),
        FieldType::UInt32 => Cell::Int(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64),
        FieldType::Float16 => Cell::Float(f16_to_f32(u16::from_le_bytes([bytes[0], bytes[1]])) as f64),
        FieldType::Float32 => {
            Cell::Float(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64)
        }
        FieldType::Bool => Cell::Bool(bytes[0] != 0),
        FieldType::Bytes(_) => {
            let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
            Cell::Text(bytes[..end].to_vec())
        }
        FieldType::Array(elem, _) => Cell::List(
            bytes
                .chunks_exact(elem.width())
                .map(|chunk| decode_cell(elem, chunk))
                .collect(),
        ),
    }
}

/// Convert to IEEE 754 binary16 bits, rounding to nearest even
pub fn f32_to_f16(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exponent = ((bits >> 23) & 0xff) as i32;
    let mantissa = bits & 0x007f_ffff;

    if exponent == 0xff {
        let nan = if mantissa != 0 { 0x0200 } else { 0 };
        return sign | 0x7c00 | nan;
    }

    let half_exponent = exponent - 127 + 15;
    if half_exponent >= 0x1f {
        return sign | 0x7c00;
    }

    if half_exponent <= 0 {
        // subnormal or zero
        if half_exponent < -10 {
            return sign;
        }
        let mantissa = mantissa | 0x0080_0000;
        let shift = (14 - half_exponent) as u32;
        let halfway = 1u32 << (shift - 1);
        let remainder = mantissa & ((1u32 << shift) - 1);
        let mut half = mantissa >> shift;
        if remainder > halfway || (remainder == halfway && half & 1 == 1) {
            half += 1;
        }
        return sign | half as u16;
    }

    let mut half = ((half_exponent as u32) << 10) | (mantissa >> 13);
    let remainder = mantissa & 0x1fff;
    if remainder > 0x1000 || (remainder == 0x1000 && half & 1 == 1) {
        // a carry into the exponent is the correct result, up to infinity
        half += 1;
    }
    sign | half as u16
}

/// Convert IEEE 754 binary16 bits to f32
pub fn f16_to_f32(half: u16) -> f32 {
    let sign = ((half & 0x8000) as u32) << 16;
    let exponent = ((half >> 10) & 0x1f) as u32;
    let mantissa = (half & 0x03ff) as u32;

    match exponent {
        0 => {
            let magnitude = mantissa as f32 / 16_777_216.0;
            if sign != 0 {
                -magnitude
            } else {
                magnitude
            }
        }
        0x1f => f32::from_bits(sign | 0x7f80_0000 | (mantissa << 13)),
        _ => f32::from_bits(sign | ((exponent + 112) << 23) | (mantissa << 13)),
    }
}

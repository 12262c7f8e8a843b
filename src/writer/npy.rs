//! NumPy `.npy` (format 1.0) structured arrays
//!
//! Layout: magic, version, u16 header length, an ASCII dict describing the
//! dtype and shape padded to a 64-byte boundary, then the packed records.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::schema::RecordSchema;

use super::table::Table;

const MAGIC: &[u8] = b"\x93NUMPY";
const VERSION: (u8, u8) = (1, 0);
const PREAMBLE_LEN: usize = MAGIC.len() + 2 + 2;
const ALIGNMENT: usize = 64;

#[derive(Debug, Error)]
pub enum NpyError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("not an .npy file")]
    BadMagic,
    #[error("unsupported .npy version {0}.{1}")]
    UnsupportedVersion(u8, u8),
    #[error("malformed header: {0}")]
    Header(String),
    #[error("dtype {found} does not match table {table}")]
    DescrMismatch { table: &'static str, found: String },
    #[error("expected {expected} data bytes, found {found}")]
    DataLength { expected: usize, found: usize },
}

/// Header dict for `len` records of `schema`, padded and newline terminated
pub fn header(schema: &RecordSchema, len: usize) -> Result<Vec<u8>, NpyError> {
    let dict = format!(
        "{{'descr': {}, 'fortran_order': False, 'shape': ({},), }}",
        schema.descr(),
        len
    );
    let unpadded = PREAMBLE_LEN + dict.len() + 1;
    let padding = (ALIGNMENT - unpadded % ALIGNMENT) % ALIGNMENT;
    let header_len = u16::try_from(dict.len() + padding + 1)
        .map_err(|_| NpyError::Header(format!("{} header too long", schema.name)))?;

    let mut out = Vec::with_capacity(PREAMBLE_LEN + header_len as usize);
    out.extend_from_slice(MAGIC);
    out.push(VERSION.0);
    out.push(VERSION.1);
    out.extend_from_slice(&header_len.to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    out.resize(out.len() + padding, b' ');
    out.push(b'\n');
    Ok(out)
}

/// Serialize a table as a complete `.npy` file
pub fn encode(table: &Table) -> Result<Vec<u8>, NpyError> {
    let mut out = header(table.schema(), table.len())?;
    out.extend_from_slice(table.as_bytes());
    Ok(out)
}

/// Parse a `.npy` file holding records of `schema`
pub fn decode(schema: &'static RecordSchema, bytes: &[u8]) -> Result<Table, NpyError> {
    if bytes.len() < PREAMBLE_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return Err(NpyError::BadMagic);
    }
    let version = (bytes[6], bytes[7]);
    if version != VERSION {
        return Err(NpyError::UnsupportedVersion(version.0, version.1));
    }

    let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    let data_start = PREAMBLE_LEN + header_len;
    if bytes.len() < data_start {
        return Err(NpyError::Header("truncated header".to_string()));
    }
    let header = std::str::from_utf8(&bytes[PREAMBLE_LEN..data_start])
        .map_err(|_| NpyError::Header("header is not ASCII".to_string()))?;

    let descr = between(header, "'descr': ", ", 'fortran_order'")
        .ok_or_else(|| NpyError::Header("missing descr".to_string()))?;
    if descr != schema.descr() {
        return Err(NpyError::DescrMismatch {
            table: schema.name,
            found: descr.to_string(),
        });
    }
    if !header.contains("'fortran_order': False") {
        return Err(NpyError::Header("fortran order is not supported".to_string()));
    }

    let len = parse_shape(header)?;
    let data = &bytes[data_start..];
    let expected = len
        .checked_mul(schema.record_size())
        .ok_or_else(|| NpyError::Header("shape overflows".to_string()))?;
    if data.len() != expected {
        return Err(NpyError::DataLength {
            expected,
            found: data.len(),
        });
    }

    Ok(Table::from_packed(schema, len, data.to_vec()))
}

/// Write a table, replacing any existing file
///
/// The file is written beside its destination and renamed into place.
pub fn write_npy(path: &Path, table: &Table) -> Result<(), NpyError> {
    let bytes = encode(table)?;
    let tmp = path.with_extension("npy.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn read_npy(path: &Path, schema: &'static RecordSchema) -> Result<Table, NpyError> {
    let bytes = fs::read(path)?;
    decode(schema, &bytes)
}

fn between<'a>(text: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = text.find(start)? + start.len();
    let to = from + text[from..].find(end)?;
    Some(&text[from..to])
}

/// Record count from a one-dimensional `'shape': (N,)`
fn parse_shape(header: &str) -> Result<usize, NpyError> {
    let shape = between(header, "'shape': (", ")")
        .ok_or_else(|| NpyError::Header("missing shape".to_string()))?;
    let count = shape.trim_end_matches(',').trim();
    count
        .parse()
        .map_err(|_| NpyError::Header(format!("unsupported shape ({})", shape)))
}

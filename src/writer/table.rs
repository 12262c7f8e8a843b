use crate::parser::{Cell, FlattenedDataset};
use crate::schema::{DatasetKind, RecordSchema};

use super::record::{decode_row, encode_row, EncodeError};

/// Packed fixed-layout records of one table
#[derive(Debug, Clone)]
pub struct Table {
    schema: &'static RecordSchema,
    len: usize,
    data: Vec<u8>,
}

impl Table {
    /// Validate and pack flattened rows
    pub fn from_rows(schema: &'static RecordSchema, rows: &[Vec<Cell>]) -> Result<Self, EncodeError> {
        let mut data = Vec::with_capacity(rows.len() * schema.record_size());
        for row in rows {
            encode_row(schema, row, &mut data)?;
        }
        Ok(Self {
            schema,
            len: rows.len(),
            data,
        })
    }

    /// Wrap already packed records; `data` must hold exactly `len` records
    pub(crate) fn from_packed(schema: &'static RecordSchema, len: usize, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), len * schema.record_size());
        Self { schema, len, data }
    }

    pub fn schema(&self) -> &'static RecordSchema {
        self.schema
    }

    pub fn name(&self) -> &'static str {
        self.schema.name
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Packed bytes of one record
    pub fn record(&self, index: usize) -> Option<&[u8]> {
        if index >= self.len {
            return None;
        }
        let size = self.schema.record_size();
        Some(&self.data[index * size..(index + 1) * size])
    }

    pub fn decode_row(&self, index: usize) -> Option<Vec<Cell>> {
        self.record(index).map(|bytes| decode_row(self.schema, bytes))
    }

    /// Decode a single field of one record
    pub fn get(&self, index: usize, field: &str) -> Option<Cell> {
        let position = self.schema.position(field)?;
        self.decode_row(index).map(|mut row| row.swap_remove(position))
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<Cell>> + '_ {
        (0..self.len).filter_map(move |i| self.decode_row(i))
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name == other.schema.name && self.len == other.len && self.data == other.data
    }
}

/// Packed primary and sublist tables of one dataset
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetTables {
    pub kind: DatasetKind,
    pub primary: Table,
    pub sublist: Option<Table>,
}

impl DatasetTables {
    pub fn encode(dataset: &FlattenedDataset) -> Result<Self, EncodeError> {
        let primary = Table::from_rows(dataset.kind.schema(), &dataset.primary)?;
        let sublist = match dataset.kind.sublist_schema() {
            Some(schema) => Some(Table::from_rows(schema, &dataset.sublist)?),
            None => None,
        };
        Ok(Self {
            kind: dataset.kind,
            primary,
            sublist,
        })
    }
}

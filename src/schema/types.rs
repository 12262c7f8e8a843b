use std::fmt;

/// Field data type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float16,
    Float32,
    Bool,
    /// Fixed-capacity byte string, zero padded, no length prefix
    Bytes(usize),
    /// Fixed-length sub-array of a scalar type
    Array(&'static FieldType, usize),
}

impl FieldType {
    /// Width in bytes of one value of this type
    pub const fn width(&self) -> usize {
        match self {
            FieldType::Int8 | FieldType::UInt8 | FieldType::Bool => 1,
            FieldType::Int16 | FieldType::UInt16 | FieldType::Float16 => 2,
            FieldType::Int32 | FieldType::UInt32 | FieldType::Float32 => 4,
            FieldType::Bytes(capacity) => *capacity,
            FieldType::Array(elem, len) => elem.width() * *len,
        }
    }

    /// NumPy type string for a scalar type (`<u2`, `|S40`, ...)
    ///
    /// For arrays this is the element's type string; the shape is carried
    /// separately in the field description.
    pub fn type_str(&self) -> String {
        match self {
            FieldType::Int8 => "|i1".to_string(),
            FieldType::UInt8 => "|u1".to_string(),
            FieldType::Int16 => "<i2".to_string(),
            FieldType::UInt16 => "<u2".to_string(),
            FieldType::Int32 => "<i4".to_string(),
            FieldType::UInt32 => "<u4".to_string(),
            FieldType::Float16 => "<f2".to_string(),
            FieldType::Float32 => "<f4".to_string(),
            FieldType::Bool => "|b1".to_string(),
            FieldType::Bytes(capacity) => format!("|S{}", capacity),
            FieldType::Array(elem, _) => elem.type_str(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Int8 => write!(f, "i8"),
            FieldType::UInt8 => write!(f, "u8"),
            FieldType::Int16 => write!(f, "i16"),
            FieldType::UInt16 => write!(f, "u16"),
            FieldType::Int32 => write!(f, "i32"),
            FieldType::UInt32 => write!(f, "u32"),
            FieldType::Float16 => write!(f, "f16"),
            FieldType::Float32 => write!(f, "f32"),
            FieldType::Bool => write!(f, "bool"),
            FieldType::Bytes(capacity) => write!(f, "bytes[{}]", capacity),
            FieldType::Array(elem, len) => write!(f, "[{}; {}]", elem, len),
        }
    }
}

/// Field definition
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub field_type: FieldType,
}

impl Field {
    pub const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self { name, field_type }
    }

    /// NumPy field description, e.g. `('har', '|i1', (3,))`
    pub fn descr(&self) -> String {
        match self.field_type {
            FieldType::Array(_, len) => format!(
                "('{}', '{}', ({},))",
                self.name,
                self.field_type.type_str(),
                len
            ),
            _ => format!("('{}', '{}')", self.name, self.field_type.type_str()),
        }
    }
}

/// Fixed layout of one record in a table
#[derive(Debug, Clone)]
pub struct RecordSchema {
    pub name: &'static str,
    pub fields: &'static [Field],
}

impl RecordSchema {
    /// Size in bytes of one packed record
    pub fn record_size(&self) -> usize {
        self.fields.iter().map(|f| f.field_type.width()).sum()
    }

    /// Position of a field in the record
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Byte offset of a field within a packed record
    pub fn offset_of(&self, name: &str) -> Option<usize> {
        let position = self.position(name)?;
        Some(
            self.fields[..position]
                .iter()
                .map(|f| f.field_type.width())
                .sum(),
        )
    }

    /// NumPy dtype description for the whole record
    pub fn descr(&self) -> String {
        let fields: Vec<String> = self.fields.iter().map(|f| f.descr()).collect();
        format!("[{}]", fields.join(", "))
    }
}

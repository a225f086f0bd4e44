//! Field model: one declared member of a structure.

use crate::structure::Structure;
use std::rc::Rc;

/// Fixed-width scalar vocabulary of the definition language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float,
    Bool,
}

impl ScalarType {
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "int8_t" => Some(ScalarType::Int8),
            "uint8_t" => Some(ScalarType::UInt8),
            "int16_t" => Some(ScalarType::Int16),
            "uint16_t" => Some(ScalarType::UInt16),
            "int32_t" | "int" => Some(ScalarType::Int32),
            "uint32_t" => Some(ScalarType::UInt32),
            "float" => Some(ScalarType::Float),
            "bool" => Some(ScalarType::Bool),
            _ => None,
        }
    }

    pub fn c_name(self) -> &'static str {
        match self {
            ScalarType::Int8 => "int8_t",
            ScalarType::UInt8 => "uint8_t",
            ScalarType::Int16 => "int16_t",
            ScalarType::UInt16 => "uint16_t",
            ScalarType::Int32 => "int32_t",
            ScalarType::UInt32 => "uint32_t",
            ScalarType::Float => "float",
            ScalarType::Bool => "bool",
        }
    }

    pub fn size(self) -> usize {
        match self {
            ScalarType::Int8 | ScalarType::UInt8 | ScalarType::Bool => 1,
            ScalarType::Int16 | ScalarType::UInt16 => 2,
            ScalarType::Int32 | ScalarType::UInt32 | ScalarType::Float => 4,
        }
    }

    /// TunerStudio storage type.
    pub fn ts_type(self) -> &'static str {
        match self {
            ScalarType::Int8 => "S08",
            ScalarType::UInt8 | ScalarType::Bool => "U08",
            ScalarType::Int16 => "S16",
            ScalarType::UInt16 => "U16",
            ScalarType::Int32 => "S32",
            ScalarType::UInt32 => "U32",
            ScalarType::Float => "F32",
        }
    }
}

/// A type declared by a `custom <name> <size> <descriptor>` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomType {
    pub name: String,
    pub size: usize,
    /// Tuning descriptor text with macros applied; `@OFFSET@` marks where the offset goes.
    pub descriptor: String,
}

#[derive(Debug, Clone)]
pub enum FieldType {
    Scalar(ScalarType),
    Custom(Rc<CustomType>),
    Structure(Rc<Structure>),
    Bit,
}

impl FieldType {
    /// Type name as it appears in the definition file and the C header.
    pub fn type_name(&self) -> &str {
        match self {
            FieldType::Scalar(s) => s.c_name(),
            FieldType::Custom(c) => &c.name,
            FieldType::Structure(s) => &s.name,
            FieldType::Bit => "bit",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub comment: String,
    pub ty: FieldType,
    /// 0 for scalars.
    pub array_size: usize,
    pub is_iterate: bool,
    /// Verbatim descriptor passthrough for the tuning backend (`"units", 1, 0, ...`).
    pub ts_info: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, comment: impl Into<String>, ty: FieldType) -> Self {
        Field {
            name: name.into(),
            comment: comment.into(),
            ty,
            array_size: 0,
            is_iterate: false,
            ts_info: None,
        }
    }

    pub fn bit(name: impl Into<String>, comment: impl Into<String>) -> Self {
        Field::new(name, comment, FieldType::Bit)
    }

    pub fn with_array(mut self, array_size: usize, is_iterate: bool) -> Self {
        self.array_size = array_size;
        self.is_iterate = is_iterate;
        self
    }

    pub fn with_ts_info(mut self, ts_info: Option<String>) -> Self {
        self.ts_info = ts_info;
        self
    }

    pub fn is_bit(&self) -> bool {
        matches!(self.ty, FieldType::Bit)
    }

    pub fn is_array(&self) -> bool {
        self.array_size > 0
    }

    /// Size in bytes of one element. Bits report 0: they live in a shared word.
    pub fn element_size(&self) -> usize {
        match &self.ty {
            FieldType::Scalar(s) => s.size(),
            FieldType::Custom(c) => c.size,
            FieldType::Structure(s) => s.total_size,
            FieldType::Bit => 0,
        }
    }

    pub fn size(&self) -> usize {
        self.checked_size().unwrap_or(usize::MAX)
    }

    /// Size in bytes, `None` when it does not fit in `usize`.
    pub fn checked_size(&self) -> Option<usize> {
        self.element_size().checked_mul(self.array_size.max(1))
    }

    /// Number of leaves this field contributes once iterate arrays and structure-typed
    /// fields are expanded; `None` on overflow.
    pub fn flat_len(&self) -> Option<usize> {
        match &self.ty {
            // An empty structure still costs one step per element when expanded.
            FieldType::Structure(s) => s.flat_len.max(1).checked_mul(self.array_size.max(1)),
            _ if self.is_iterate => Some(self.array_size),
            _ => Some(1),
        }
    }

    /// Required alignment for a platform word of `word_size` bytes.
    pub fn alignment(&self, word_size: usize) -> usize {
        match &self.ty {
            FieldType::Structure(_) | FieldType::Bit => word_size,
            _ => match self.element_size() {
                n @ (1 | 2 | 4 | 8) => n.min(word_size),
                _ => 1,
            },
        }
    }

    /// Checks the invariants shared by every field: bits are plain flags and
    /// iterate arrays have at least one element.
    pub fn validate(&self) -> Result<(), String> {
        if self.is_bit() && (self.array_size > 0 || self.is_iterate) {
            return Err(format!("bit {} cannot be an array", self.name));
        }
        if self.is_iterate && self.array_size == 0 {
            return Err(format!(
                "iterate field {} needs an array size of at least 1",
                self.name
            ));
        }
        if self.checked_size().is_none() {
            return Err(format!("{} is too large", self.name));
        }
        Ok(())
    }

    /// The `index`-th (1-based) element of an iterate array, as a scalar field.
    pub fn iterate_element(&self, index: usize) -> Field {
        Field {
            name: format!("{}{}", self.name, index),
            comment: self.comment.clone(),
            ty: self.ty.clone(),
            array_size: 0,
            is_iterate: false,
            ts_info: self.ts_info.clone(),
        }
    }

    /// Comment lines: the source escapes line breaks as a literal `\n`.
    pub fn comment_lines(&self) -> Vec<&str> {
        if self.comment.trim().is_empty() {
            return Vec::new();
        }
        self.comment.split("\\n").collect()
    }
}

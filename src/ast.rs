//! Syntax of one definition line, before any name or size is resolved.

/// One recognized directive line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    StructStart {
        name: String,
        comment: Option<String>,
        uses_prefix: bool,
    },
    EndStruct,
    Bit {
        name: String,
        comment: String,
    },
    Custom {
        name: String,
        size: String,
        descriptor: String,
    },
    Define {
        name: String,
        value: String,
    },
    Field(FieldDecl),
}

/// A field line with its size still as written (literal or macro name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub type_name: String,
    pub name: String,
    pub array_size: Option<String>,
    pub is_iterate: bool,
    pub comment: String,
    pub ts_info: Option<String>,
}

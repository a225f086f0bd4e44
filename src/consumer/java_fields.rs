//! Java field mirror: `Field.create(...)` constants for every leaf of the secondary view.

use super::{flatten, ConfigurationConsumer, FlatField, RootStructures};
use crate::error::CompileError;
use crate::field::{FieldType, ScalarType};
use crate::structure::Structure;
use std::fmt::Write;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct JavaFieldsOptions {
    pub package: String,
    pub class_name: String,
    /// Offset of the first emitted structure.
    pub base_offset: usize,
}

impl Default for JavaFieldsOptions {
    fn default() -> Self {
        JavaFieldsOptions {
            package: "com.rusefi.config.generated".to_string(),
            class_name: "Fields".to_string(),
            base_offset: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct JavaFieldsConsumer {
    options: JavaFieldsOptions,
    offset: usize,
    roots: RootStructures,
    fields: String,
}

impl JavaFieldsConsumer {
    pub fn new(options: JavaFieldsOptions) -> Self {
        JavaFieldsConsumer {
            offset: options.base_offset,
            options,
            roots: RootStructures::default(),
            fields: String::new(),
        }
    }

    /// Offset where the next emitted structure will start.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The complete Java source.
    pub fn content(&self) -> String {
        format!(
            "// this file was generated automatically by configdef\npackage {};\n\npublic class {} {{\n{}}}\n",
            self.options.package, self.options.class_name, self.fields
        )
    }

    fn write_structure(&mut self, structure: &Structure) -> Result<(), CompileError> {
        let end = self
            .offset
            .checked_add(structure.total_size)
            .ok_or_else(|| CompileError::PositionOverflow {
                structure: structure.name.clone(),
                position: self.offset,
            })?;
        let mut leaves = Vec::new();
        flatten(structure, "", self.offset, &mut leaves);
        for leaf in &leaves {
            writeln!(self.fields, "\t{}", field_constant(leaf))?;
        }
        self.offset = end;
        Ok(())
    }
}

fn java_type(ty: &FieldType) -> &'static str {
    match ty {
        FieldType::Bit => "BIT",
        FieldType::Scalar(s) => match s {
            ScalarType::Int8 => "INT8",
            ScalarType::UInt8 | ScalarType::Bool => "UINT8",
            ScalarType::Int16 => "INT16",
            ScalarType::UInt16 => "UINT16",
            ScalarType::Int32 => "INT",
            ScalarType::UInt32 => "UINT32",
            ScalarType::Float => "FLOAT",
        },
        FieldType::Custom(c) => match c.size {
            1 => "INT8",
            2 => "INT16",
            4 => "INT",
            _ => "BYTES",
        },
        FieldType::Structure(_) => "BYTES",
    }
}

fn field_constant(leaf: &FlatField<'_>) -> String {
    let name = leaf.name.to_uppercase();
    let field = leaf.field;
    let ty = java_type(&field.ty);
    match leaf.bit {
        Some(bit) => format!(
            "public static final Field {} = Field.create(\"{}\", {}, FieldType.{}, {});",
            name, name, leaf.offset, ty, bit
        ),
        None if field.is_array() => format!(
            "public static final Field {} = Field.create(\"{}\", {}, FieldType.{}).setArraySize({});",
            name, name, leaf.offset, ty, field.array_size
        ),
        None => format!(
            "public static final Field {} = Field.create(\"{}\", {}, FieldType.{});",
            name, name, leaf.offset, ty
        ),
    }
}

impl ConfigurationConsumer for JavaFieldsConsumer {
    fn handle_end_struct(&mut self, structure: &Rc<Structure>) -> Result<(), CompileError> {
        self.roots.record(structure);
        Ok(())
    }

    fn end_file(&mut self) -> Result<(), CompileError> {
        for root in self.roots.take() {
            self.write_structure(&root)?;
        }
        Ok(())
    }
}

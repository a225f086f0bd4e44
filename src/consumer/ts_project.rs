//! TunerStudio project descriptor lines built from the secondary view.

use super::{flatten, ConfigurationConsumer, FlatField, RootStructures};
use crate::error::CompileError;
use crate::field::FieldType;
use crate::structure::Structure;
use std::fmt::Write;
use std::rc::Rc;

const DEFAULT_TS_INFO: &str = "\"\", 1, 0, 0, 0, 0";
const OFFSET_PLACEHOLDER: &str = "@OFFSET@";

/// Writes one descriptor line per leaf field. The running `ts_position` spans runs:
/// a consumer reused for several definition files lays them out back to back.
#[derive(Debug, Default)]
pub struct TsProjectConsumer {
    ts_position: usize,
    roots: RootStructures,
    content: String,
}

impl TsProjectConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_position(ts_position: usize) -> Self {
        TsProjectConsumer {
            ts_position,
            ..Self::default()
        }
    }

    pub fn ts_position(&self) -> usize {
        self.ts_position
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    fn write_structure(&mut self, structure: &Structure) -> Result<(), CompileError> {
        let end = self
            .ts_position
            .checked_add(structure.total_size)
            .ok_or_else(|| CompileError::PositionOverflow {
                structure: structure.name.clone(),
                position: self.ts_position,
            })?;
        let mut leaves = Vec::new();
        flatten(structure, "", self.ts_position, &mut leaves);
        writeln!(
            self.content,
            "; start of {} at {}",
            structure.name, self.ts_position
        )?;
        for leaf in &leaves {
            let line = descriptor_line(leaf);
            writeln!(self.content, "{}", line)?;
        }
        self.ts_position = end;
        writeln!(self.content, "; total TS size = {}", self.ts_position)?;
        Ok(())
    }
}

fn descriptor_line(leaf: &FlatField<'_>) -> String {
    let field = leaf.field;
    let ts_info = field.ts_info.as_deref().unwrap_or(DEFAULT_TS_INFO);
    match (&field.ty, leaf.bit) {
        (FieldType::Bit, bit) => {
            let bit = bit.unwrap_or(0);
            format!(
                "{} = bits, U32, {}, [{}:{}], \"false\", \"true\"",
                leaf.name, leaf.offset, bit, bit
            )
        }
        (FieldType::Custom(custom), _) => format!(
            "{} = {}",
            leaf.name,
            custom
                .descriptor
                .replace(OFFSET_PLACEHOLDER, &leaf.offset.to_string())
        ),
        (FieldType::Scalar(scalar), _) if field.is_array() => format!(
            "{} = array, {}, {}, [{}], {}",
            leaf.name,
            scalar.ts_type(),
            leaf.offset,
            field.array_size,
            ts_info
        ),
        (FieldType::Scalar(scalar), _) => format!(
            "{} = scalar, {}, {}, {}",
            leaf.name,
            scalar.ts_type(),
            leaf.offset,
            ts_info
        ),
        // Flattening never yields structure leaves.
        (FieldType::Structure(s), _) => format!("; {} = {} at {}", leaf.name, s.name, leaf.offset),
    }
}

impl ConfigurationConsumer for TsProjectConsumer {
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

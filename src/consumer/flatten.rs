//! Flattening of the secondary view for descriptor-style backends.

use crate::field::{Field, FieldType};
use crate::structure::Structure;
use std::collections::HashSet;
use std::rc::Rc;

/// A leaf field of a flattened structure with its absolute offset.
#[derive(Debug, Clone)]
pub struct FlatField<'a> {
    pub name: String,
    pub field: &'a Field,
    pub offset: usize,
    pub bit: Option<u32>,
}

/// Append the leaves of `structure`'s secondary view to `out`.
///
/// Structure-typed members are expanded in place. Members of a referenced structure
/// declared with `struct` get the referencing field's name as prefix (`inj_flow`);
/// `struct_no_prefix` members keep their own names. Array elements of a structure type
/// are always prefixed with the field name and a 1-based index.
pub fn flatten<'a>(structure: &'a Structure, prefix: &str, base: usize, out: &mut Vec<FlatField<'a>>) {
    for placed in &structure.secondary {
        let field = placed.field.as_ref();
        match &field.ty {
            FieldType::Structure(inner) if field.is_array() => {
                for index in 1..=field.array_size {
                    let element_prefix = format!("{}{}{}_", prefix, field.name, index);
                    let element_base = base + placed.offset + (index - 1) * inner.total_size;
                    flatten(inner, &element_prefix, element_base, out);
                }
            }
            FieldType::Structure(inner) => {
                let inner_prefix = if inner.uses_prefix {
                    format!("{}{}_", prefix, field.name)
                } else {
                    prefix.to_string()
                };
                flatten(inner, &inner_prefix, base + placed.offset, out);
            }
            _ => out.push(FlatField {
                name: format!("{}{}", prefix, field.name),
                field,
                offset: base + placed.offset,
                bit: placed.bit,
            }),
        }
    }
}

/// Tracks the structures a descriptor backend should emit at end of file: top-level
/// structures that no later structure embedded by type.
#[derive(Debug, Default)]
pub struct RootStructures {
    pending: Vec<Rc<Structure>>,
    embedded: HashSet<String>,
}

impl RootStructures {
    pub fn record(&mut self, structure: &Rc<Structure>) {
        self.embedded
            .extend(structure.embedded_structures().map(str::to_string));
        if structure.depth == 0 {
            self.pending.push(Rc::clone(structure));
        }
    }

    /// Roots in completion order; resets the tracker for the next run.
    pub fn take(&mut self) -> Vec<Rc<Structure>> {
        let embedded = std::mem::take(&mut self.embedded);
        std::mem::take(&mut self.pending)
            .into_iter()
            .filter(|s| !embedded.contains(&s.name))
            .collect()
    }
}

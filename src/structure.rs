//! Structure model: the primary (native layout) and secondary (expanded) views of a
//! structure, and the builder that computes offsets while the structure is open.

use crate::field::{Field, FieldType, ScalarType};
use std::rc::Rc;

/// Bits pack into a 32-bit word.
pub const BITS_PER_WORD: u32 = 32;
const BIT_WORD_SIZE: usize = 4;

/// Upper bound on the number of leaf fields a structure flattens to (iterate elements,
/// elements of structure arrays, bits including unused ones).
pub const MAX_FLAT_FIELDS: usize = 1 << 20;

/// A field at its byte offset within the owning structure.
#[derive(Debug, Clone)]
pub struct PlacedField {
    pub field: Rc<Field>,
    pub offset: usize,
    /// Bit index inside the 32-bit word at `offset`, for bit fields.
    pub bit: Option<u32>,
}

/// A closed structure. Immutable; shared by reference with every consumer.
#[derive(Debug)]
pub struct Structure {
    pub name: String,
    pub comment: Option<String>,
    pub uses_prefix: bool,
    /// Number of structures that were open when this one started; 0 for top-level.
    pub depth: usize,
    pub primary: Vec<PlacedField>,
    pub secondary: Vec<PlacedField>,
    /// Size in bytes including trailing alignment fill.
    pub total_size: usize,
    /// Number of leaves the secondary view flattens to, nested structures expanded.
    pub flat_len: usize,
}

impl Structure {
    pub fn primary_field(&self, name: &str) -> Option<&PlacedField> {
        self.primary.iter().find(|p| p.field.name == name)
    }

    pub fn secondary_field(&self, name: &str) -> Option<&PlacedField> {
        self.secondary.iter().find(|p| p.field.name == name)
    }

    /// Names of the structures this one embeds by type.
    pub fn embedded_structures(&self) -> impl Iterator<Item = &str> {
        self.primary.iter().filter_map(|p| match &p.field.ty {
            FieldType::Structure(s) => Some(s.name.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct BitWord {
    offset: usize,
    next_bit: u32,
}

/// An open structure on the reader's stack. Both views are appended in lockstep.
///
/// Every `add_*` method and `finish` fail with a reason when the layout would no longer
/// fit in `usize` or would flatten to more than [`MAX_FLAT_FIELDS`] leaves.
#[derive(Debug)]
pub struct StructureBuilder {
    name: String,
    comment: Option<String>,
    uses_prefix: bool,
    depth: usize,
    word_size: usize,
    primary: Vec<PlacedField>,
    secondary: Vec<PlacedField>,
    offset: usize,
    flat_len: usize,
    bits: Option<BitWord>,
}

impl StructureBuilder {
    pub fn new(
        name: impl Into<String>,
        comment: Option<String>,
        uses_prefix: bool,
        depth: usize,
        word_size: usize,
    ) -> Self {
        StructureBuilder {
            name: name.into(),
            comment,
            uses_prefix,
            depth,
            word_size: word_size.max(1),
            primary: Vec::new(),
            secondary: Vec::new(),
            offset: 0,
            flat_len: 0,
            bits: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current end of the layout, not counting an open bit word.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether the primary view already holds a field named `name`.
    pub fn has_field(&self, name: &str) -> bool {
        self.primary.iter().any(|p| p.field.name == name)
    }

    /// Append a bit flag to both views, opening a new 32-bit word when needed.
    pub fn add_bit(&mut self, field: Field) -> Result<(), String> {
        let word = match self.bits {
            Some(w) if w.next_bit < BITS_PER_WORD => w,
            _ => {
                self.close_bits()?;
                self.align_to(BIT_WORD_SIZE.min(self.word_size))?;
                self.end_of(BIT_WORD_SIZE)?;
                BitWord {
                    offset: self.offset,
                    next_bit: 0,
                }
            }
        };
        self.push_both(Rc::new(field), word.offset, Some(word.next_bit))?;
        self.bits = Some(BitWord {
            offset: word.offset,
            next_bit: word.next_bit + 1,
        });
        Ok(())
    }

    /// Append the same field instance to both views.
    pub fn add_both(&mut self, field: Field) -> Result<(), String> {
        self.close_bits()?;
        self.align_to(field.alignment(self.word_size))?;
        let end = self.end_of(self.field_size(&field)?)?;
        self.push_both(Rc::new(field), self.offset, None)?;
        self.offset = end;
        Ok(())
    }

    /// Append an iterate array: once to the primary view, element by element to the
    /// secondary view.
    pub fn add_iterate(&mut self, field: Field) -> Result<(), String> {
        self.close_bits()?;
        self.align_to(field.alignment(self.word_size))?;
        let base = self.offset;
        let end = self.end_of(self.field_size(&field)?)?;
        self.count_leaves(field.flat_len())?;
        let element_size = field.element_size();
        for index in 1..=field.array_size {
            self.secondary.push(PlacedField {
                field: Rc::new(field.iterate_element(index)),
                offset: base + (index - 1) * element_size,
                bit: None,
            });
        }
        self.offset = end;
        self.primary.push(PlacedField {
            field: Rc::new(field),
            offset: base,
            bit: None,
        });
        Ok(())
    }

    /// Close any open bit word and pad to the platform word size.
    pub fn finish(mut self) -> Result<Structure, String> {
        self.close_bits()?;
        self.align_to(self.word_size)?;
        Ok(Structure {
            name: self.name,
            comment: self.comment,
            uses_prefix: self.uses_prefix,
            depth: self.depth,
            primary: self.primary,
            secondary: self.secondary,
            total_size: self.offset,
            flat_len: self.flat_len,
        })
    }

    fn field_size(&self, field: &Field) -> Result<usize, String> {
        field
            .checked_size()
            .ok_or_else(|| format!("{} is too large", field.name))
    }

    /// Offset just past `size` bytes placed at the current offset.
    fn end_of(&self, size: usize) -> Result<usize, String> {
        self.offset.checked_add(size).ok_or_else(|| {
            format!(
                "{} does not fit in the address space at offset {}",
                self.name, self.offset
            )
        })
    }

    fn count_leaves(&mut self, leaves: Option<usize>) -> Result<(), String> {
        self.flat_len = leaves
            .and_then(|n| self.flat_len.checked_add(n))
            .filter(|total| *total <= MAX_FLAT_FIELDS)
            .ok_or_else(|| {
                format!(
                    "{} expands to more than {} fields",
                    self.name, MAX_FLAT_FIELDS
                )
            })?;
        Ok(())
    }

    fn push_both(&mut self, field: Rc<Field>, offset: usize, bit: Option<u32>) -> Result<(), String> {
        self.count_leaves(field.flat_len())?;
        self.secondary.push(PlacedField {
            field: Rc::clone(&field),
            offset,
            bit,
        });
        self.primary.push(PlacedField { field, offset, bit });
        Ok(())
    }

    fn close_bits(&mut self) -> Result<(), String> {
        let Some(word) = self.bits.take() else {
            return Ok(());
        };
        for bit in word.next_bit..BITS_PER_WORD {
            let filler = Field::bit(format!("unusedBit_{}_{}", word.offset, bit), "");
            self.push_both(Rc::new(filler), word.offset, Some(bit))?;
        }
        // Reserved when the word was opened.
        self.offset = self.end_of(BIT_WORD_SIZE)?;
        Ok(())
    }

    fn align_to(&mut self, alignment: usize) -> Result<(), String> {
        let alignment = alignment.max(1);
        let fill = (alignment - self.offset % alignment) % alignment;
        if fill == 0 {
            return Ok(());
        }
        let end = self.end_of(fill)?;
        let filler = Field::new(
            format!("alignmentFill_at_{}", self.offset),
            format!("need {} byte alignment", alignment),
            FieldType::Scalar(ScalarType::UInt8),
        )
        .with_array(fill, false);
        self.push_both(Rc::new(filler), self.offset, None)?;
        self.offset = end;
        Ok(())
    }
}

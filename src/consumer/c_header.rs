//! Native C/C++ header: one struct per closed structure, primary view, with the byte
//! offset of every member in its doc comment.

use super::ConfigurationConsumer;
use crate::error::CompileError;
use crate::field::{Field, FieldType};
use crate::structure::{PlacedField, Structure};
use std::fmt::Write;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct CHeaderOptions {
    /// First line of the header, written as a `//` comment.
    pub banner: String,
    /// Extra `#include` lines written after `#pragma once`.
    pub includes: Vec<String>,
}

impl Default for CHeaderOptions {
    fn default() -> Self {
        CHeaderOptions {
            banner: "this section was generated automatically by configdef".to_string(),
            includes: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CHeaderConsumer {
    options: CHeaderOptions,
    content: String,
}

impl CHeaderConsumer {
    pub fn new(options: CHeaderOptions) -> Self {
        CHeaderConsumer {
            options,
            content: String::new(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }

    fn write_member(&mut self, placed: &PlacedField) -> Result<(), CompileError> {
        let field = placed.field.as_ref();
        self.content.push_str("\t/**\n");
        write_comment(&mut self.content, &field.comment_lines(), "\t")?;
        match placed.bit {
            Some(bit) => writeln!(self.content, "\toffset {} bit {} */", placed.offset, bit)?,
            None => {
                writeln!(self.content, "\t * offset {}", placed.offset)?;
                self.content.push_str("\t */\n");
            }
        }
        writeln!(self.content, "\t{}", declaration(field))?;
        Ok(())
    }
}

fn write_comment(out: &mut String, lines: &[&str], indent: &str) -> Result<(), CompileError> {
    for line in lines {
        writeln!(out, "{} * {}", indent, line)?;
    }
    Ok(())
}

fn declaration(field: &Field) -> String {
    match &field.ty {
        FieldType::Bit => format!("bool {} : 1 {{}};", field.name),
        ty if field.is_array() => {
            format!("{} {}[{}];", ty.type_name(), field.name, field.array_size)
        }
        ty => format!("{} {};", ty.type_name(), field.name),
    }
}

impl ConfigurationConsumer for CHeaderConsumer {
    fn start_file(&mut self) -> Result<(), CompileError> {
        writeln!(self.content, "// {}", self.options.banner)?;
        self.content.push_str("#pragma once\n");
        for include in &self.options.includes {
            writeln!(self.content, "#include \"{}\"", include)?;
        }
        self.content.push('\n');
        Ok(())
    }

    fn handle_end_struct(&mut self, structure: &Rc<Structure>) -> Result<(), CompileError> {
        writeln!(self.content, "// start of {}", structure.name)?;
        if let Some(comment) = &structure.comment {
            self.content.push_str("/**\n");
            let lines: Vec<&str> = comment.split("\\n").collect();
            write_comment(&mut self.content, &lines, "")?;
            self.content.push_str(" */\n");
        }
        writeln!(self.content, "struct {} {{", structure.name)?;
        for placed in &structure.primary {
            self.write_member(placed)?;
        }
        writeln!(self.content, "}};")?;
        writeln!(
            self.content,
            "static_assert(sizeof({}) == {});",
            structure.name, structure.total_size
        )?;
        self.content.push('\n');
        Ok(())
    }

    fn end_file(&mut self) -> Result<(), CompileError> {
        writeln!(self.content, "// end")?;
        writeln!(self.content, "// {}", self.options.banner)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::ScalarType;
    use crate::structure::StructureBuilder;

    #[test]
    fn renders_offsets_and_bits() {
        let mut b = StructureBuilder::new("Foo", Some("Demo\\nsecond".to_string()), true, 0, 4);
        b.add_both(Field::new(
            "rpm",
            "Engine speed",
            FieldType::Scalar(ScalarType::UInt16),
        ))
        .unwrap();
        b.add_bit(Field::bit("isOn", "")).unwrap();
        let s = Rc::new(b.finish().unwrap());

        let mut c = CHeaderConsumer::default();
        c.start_file().unwrap();
        c.handle_end_struct(&s).unwrap();
        c.end_file().unwrap();
        let out = c.into_content();

        assert!(out.contains("#pragma once"));
        assert!(out.contains("/**\n * Demo\n * second\n */\nstruct Foo {"));
        assert!(out.contains("\t * Engine speed\n\t * offset 0\n\t */\n\tuint16_t rpm;\n"));
        assert!(out.contains("\tuint8_t alignmentFill_at_2[2];"));
        assert!(out.contains("\toffset 4 bit 0 */\n\tbool isOn : 1 {};"));
        assert!(out.contains("static_assert(sizeof(Foo) == 8);"));
        assert!(out.trim_end().ends_with("configdef"));
    }
}

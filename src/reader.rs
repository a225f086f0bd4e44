//! Reader state machine: consumes definition lines, keeps the stack of open structures
//! and fans structure-completion events out to the consumers.

use crate::ast::{Directive, FieldDecl};
use crate::consumer::ConfigurationConsumer;
use crate::error::CompileError;
use crate::field::{CustomType, Field, FieldType, ScalarType};
use crate::parser::{normalize_line, parse_line};
use crate::structure::{Structure, StructureBuilder};
use crate::variables::{RegistryError, VariableRegistry};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Platform word size; every structure is padded to a multiple of it.
    pub word_size: usize,
    /// Lines starting with this marker are ignored.
    pub comment_marker: String,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            word_size: 4,
            comment_marker: "!".to_string(),
        }
    }
}

/// State of one compiler run over one definition file.
pub struct ReaderState<'r> {
    registry: &'r mut VariableRegistry,
    options: ReaderOptions,
    stack: Vec<StructureBuilder>,
    structures: HashMap<String, Rc<Structure>>,
    completed: Vec<Rc<Structure>>,
    custom_types: HashMap<String, Rc<CustomType>>,
}

impl<'r> ReaderState<'r> {
    pub fn new(registry: &'r mut VariableRegistry) -> Self {
        Self::with_options(registry, ReaderOptions::default())
    }

    pub fn with_options(registry: &'r mut VariableRegistry, options: ReaderOptions) -> Self {
        ReaderState {
            registry,
            options,
            stack: Vec::new(),
            structures: HashMap::new(),
            completed: Vec::new(),
            custom_types: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &VariableRegistry {
        self.registry
    }

    /// A structure closed earlier in this run.
    pub fn structure(&self, name: &str) -> Option<&Rc<Structure>> {
        self.structures.get(name)
    }

    /// Closed structures in completion order.
    pub fn completed(&self) -> &[Rc<Structure>] {
        &self.completed
    }

    pub fn custom_type(&self, name: &str) -> Option<&Rc<CustomType>> {
        self.custom_types.get(name)
    }

    /// Register the `#define` lines of a prepend file; every other line is ignored.
    pub fn read_prepend(&mut self, source: &str) {
        for raw in source.lines() {
            let line = normalize_line(raw);
            if self.is_skipped(&line) {
                continue;
            }
            if let Ok(Directive::Define { name, value }) = parse_line(&line) {
                self.registry.register(&name, &value);
            }
        }
    }

    /// Process a whole definition file, notifying `consumers` in order.
    ///
    /// Any error aborts the run; consumers may then hold partial output, which the
    /// caller must discard.
    pub fn read_definition(
        &mut self,
        source: &str,
        consumers: &mut [&mut dyn ConfigurationConsumer],
    ) -> Result<(), CompileError> {
        for consumer in consumers.iter_mut() {
            consumer.start_file()?;
        }
        for (i, raw) in source.lines().enumerate() {
            let line = normalize_line(raw);
            if self.is_skipped(&line) {
                continue;
            }
            self.handle_line(i + 1, &line, consumers)?;
        }
        self.ensure_empty_after_processing()?;
        for consumer in consumers.iter_mut() {
            consumer.end_file()?;
        }
        Ok(())
    }

    fn is_skipped(&self, line: &str) -> bool {
        line.is_empty()
            || (!self.options.comment_marker.is_empty()
                && line.starts_with(self.options.comment_marker.as_str()))
    }

    fn ensure_empty_after_processing(&self) -> Result<(), CompileError> {
        if self.stack.is_empty() {
            return Ok(());
        }
        Err(CompileError::UnclosedStructures {
            names: self.stack.iter().map(|s| s.name().to_string()).collect(),
        })
    }

    fn handle_line(
        &mut self,
        line_no: usize,
        line: &str,
        consumers: &mut [&mut dyn ConfigurationConsumer],
    ) -> Result<(), CompileError> {
        let directive = parse_line(line).map_err(|_| CompileError::UnparsableFieldLine {
            line: line_no,
            content: line.to_string(),
        })?;
        match directive {
            Directive::StructStart {
                name,
                comment,
                uses_prefix,
            } => {
                log::info!("Starting structure {}", name);
                let builder = StructureBuilder::new(
                    name,
                    comment,
                    uses_prefix,
                    self.stack.len(),
                    self.options.word_size,
                );
                self.stack.push(builder);
                Ok(())
            }
            Directive::EndStruct => self.handle_end_struct(line_no, consumers),
            Directive::Bit { name, comment } => {
                let top = self
                    .stack
                    .last_mut()
                    .ok_or_else(|| CompileError::NoOpenStructure {
                        line: line_no,
                        content: line.to_string(),
                    })?;
                if top.has_field(&name) {
                    log::warn!("line {}: {} already declares {}", line_no, top.name(), name);
                }
                let structure = top.name().to_string();
                top.add_bit(Field::bit(name, comment))
                    .map_err(|reason| CompileError::InvalidField {
                        line: line_no,
                        structure,
                        reason,
                    })
            }
            Directive::Custom {
                name,
                size,
                descriptor,
            } => {
                let size = size
                    .parse::<usize>()
                    .map_err(|_| CompileError::MalformedSize {
                        line: line_no,
                        token: size.clone(),
                        content: line.to_string(),
                    })?;
                let descriptor = self.registry.apply_variables(&descriptor);
                self.custom_types.insert(
                    name.clone(),
                    Rc::new(CustomType {
                        name,
                        size,
                        descriptor,
                    }),
                );
                Ok(())
            }
            Directive::Define { name, value } => {
                self.registry.register(&name, &value);
                Ok(())
            }
            Directive::Field(decl) => self.handle_field(line_no, line, decl),
        }
    }

    fn handle_end_struct(
        &mut self,
        line_no: usize,
        consumers: &mut [&mut dyn ConfigurationConsumer],
    ) -> Result<(), CompileError> {
        let builder = self
            .stack
            .pop()
            .ok_or(CompileError::UnbalancedStructure { line: line_no })?;
        let name = builder.name().to_string();
        let structure = Rc::new(builder.finish().map_err(|reason| {
            CompileError::InvalidField {
                line: line_no,
                structure: name,
                reason,
            }
        })?);
        log::info!(
            "Ending structure {} ({} bytes)",
            structure.name,
            structure.total_size
        );
        if self
            .structures
            .insert(structure.name.clone(), Rc::clone(&structure))
            .is_some()
        {
            log::warn!("Structure {} redefined at line {}", structure.name, line_no);
        }
        self.completed.push(Rc::clone(&structure));
        for consumer in consumers.iter_mut() {
            consumer.handle_end_struct(&structure)?;
        }
        Ok(())
    }

    fn handle_field(
        &mut self,
        line_no: usize,
        line: &str,
        decl: FieldDecl,
    ) -> Result<(), CompileError> {
        let structure = match self.stack.last() {
            Some(top) => top.name().to_string(),
            None => {
                return Err(CompileError::NoOpenStructure {
                    line: line_no,
                    content: line.to_string(),
                })
            }
        };
        let array_size = match &decl.array_size {
            Some(token) => self.registry.resolve_size(token).map_err(|e| match e {
                RegistryError::UnresolvedSize(token) => CompileError::UnresolvedSize {
                    line: line_no,
                    structure: structure.clone(),
                    token,
                },
            })?,
            None => 0,
        };
        let ty = self
            .resolve_type(&decl.type_name)
            .ok_or_else(|| CompileError::UnknownType {
                line: line_no,
                structure: structure.clone(),
                type_name: decl.type_name.clone(),
            })?;
        let ts_info = decl.ts_info.map(|t| self.registry.apply_variables(&t));
        let field = Field::new(decl.name, decl.comment, ty)
            .with_array(array_size, decl.is_iterate)
            .with_ts_info(ts_info);
        field
            .validate()
            .map_err(|reason| CompileError::InvalidField {
                line: line_no,
                structure: structure.clone(),
                reason,
            })?;

        // Checked non-empty above.
        let Some(top) = self.stack.last_mut() else {
            return Ok(());
        };
        if top.has_field(&field.name) {
            log::warn!("line {}: {} already declares {}", line_no, structure, field.name);
        }
        let placed = if field.is_iterate {
            top.add_iterate(field)
        } else {
            top.add_both(field)
        };
        placed.map_err(|reason| CompileError::InvalidField {
            line: line_no,
            structure,
            reason,
        })
    }

    fn resolve_type(&self, type_name: &str) -> Option<FieldType> {
        if let Some(scalar) = ScalarType::from_name(type_name) {
            return Some(FieldType::Scalar(scalar));
        }
        if let Some(custom) = self.custom_types.get(type_name) {
            return Some(FieldType::Custom(Rc::clone(custom)));
        }
        self.structures
            .get(type_name)
            .map(|s| FieldType::Structure(Rc::clone(s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> Result<Vec<Rc<Structure>>, CompileError> {
        let mut registry = VariableRegistry::new();
        let mut state = ReaderState::new(&mut registry);
        state.read_definition(source, &mut [])?;
        Ok(state.completed().to_vec())
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let done = run("! header comment\n\n   \nstruct A\n! inside\nint x\nend_struct\n").unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].primary.len(), 1);
    }

    #[test]
    fn custom_size_must_be_literal() {
        let err = run("#define N 2\ncustom pin_e N bits, U08, @OFFSET@\n").unwrap_err();
        assert!(matches!(err, CompileError::MalformedSize { line: 2, .. }));
    }

    #[test]
    fn custom_type_is_usable_in_fields() {
        let done = run(
            "custom pin_e 1 bits, U08, @OFFSET@, [0:6]\nstruct A\npin_e[2] pins\nuint16_t x\nend_struct\n",
        )
        .unwrap();
        let a = &done[0];
        assert_eq!(a.primary_field("pins").map(|p| p.field.size()), Some(2));
        assert_eq!(a.primary_field("x").map(|p| p.offset), Some(2));
    }

    #[test]
    fn custom_descriptor_gets_variables() {
        let mut registry = VariableRegistry::new();
        registry.register("PIN_NAMES", "\"NONE\", \"PA0\"");
        let mut state = ReaderState::new(&mut registry);
        state
            .read_definition("custom pin_e 1 bits, U08, @OFFSET@, [0:6], PIN_NAMES\n", &mut [])
            .unwrap();
        let custom = state.custom_type("pin_e").expect("custom");
        assert_eq!(custom.descriptor, "bits, U08, @OFFSET@, [0:6], \"NONE\", \"PA0\"");
    }

    #[test]
    fn unknown_type_is_reported_with_structure() {
        let err = run("struct A\nwidget_t w\nend_struct\n").unwrap_err();
        match err {
            CompileError::UnknownType {
                line,
                structure,
                type_name,
            } => {
                assert_eq!(line, 2);
                assert_eq!(structure, "A");
                assert_eq!(type_name, "widget_t");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unresolved_array_size() {
        let err = run("struct A\nfloat[MISSING] x\nend_struct\n").unwrap_err();
        assert!(matches!(
            err,
            CompileError::UnresolvedSize { line: 2, ref token, .. } if token == "MISSING"
        ));
    }

    #[test]
    fn prepend_only_registers_defines() {
        let mut registry = VariableRegistry::new();
        let mut state = ReaderState::new(&mut registry);
        state.read_prepend("! board overrides\n#define CYL 6\nstruct Ignored\n");
        assert_eq!(state.registry().int_value("CYL"), Some(6));
        assert!(state.completed().is_empty());
        state
            .read_definition("struct A\nuint8_t[CYL] x\nend_struct\n", &mut [])
            .unwrap();
        assert_eq!(state.structure("A").map(|s| s.total_size), Some(8));
    }

    #[test]
    fn custom_comment_marker() {
        let mut registry = VariableRegistry::new();
        let options = ReaderOptions {
            word_size: 4,
            comment_marker: "//".to_string(),
        };
        let mut state = ReaderState::with_options(&mut registry, options);
        state
            .read_definition("// note\nstruct A\nint x\nend_struct\n", &mut [])
            .unwrap();
        assert_eq!(state.completed().len(), 1);
    }
}

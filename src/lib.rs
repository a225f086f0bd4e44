//! # configdef — layout definition compiler
//!
//! Reads a line-oriented definition language describing C-compatible memory layouts and
//! renders several artifacts from a single parse, so they never drift apart:
//!
//! - a native C/C++ header with the byte offset of every member,
//! - a TunerStudio-style descriptor for tuning/telemetry tools,
//! - a Java mirror of field names and offsets.
//!
//! ## Definition language
//!
//! ```text
//! ! comment lines start with '!'
//! #define CLT_CURVE_SIZE 16
//! custom pin_e 1 bits, U08, @OFFSET@, [0:6], "NONE", "PA0"
//!
//! struct injector_s Injector settings
//! float flow;Flow rate\nat 3 bar;"cc/min", 1, 0, 0, 1000, 1
//! float[CLT_CURVE_SIZE] cltBins;;"C", 1, 0, -40, 150, 1
//! pin_e[4 iterate] pins
//! bit isEnabled;Enable injection
//! end_struct
//! ```
//!
//! - `struct <Name> [comment]` / `struct_no_prefix <Name> [comment]` … `end_struct`
//! - `bit <name>[;comment]` packs flags into a shared 32-bit word
//! - `custom <name> <size> <descriptor>` declares a custom type
//! - `#define <name> [value]` registers a macro
//! - `<type>[<size>[ iterate]] <name>[;comment[;tsInfo]]` declares a field
//!
//! ## Usage
//!
//! ```no_run
//! use configdef::{CHeaderConsumer, ConfigurationConsumer, ReaderState, VariableRegistry};
//!
//! let mut registry = VariableRegistry::new();
//! let mut header = CHeaderConsumer::default();
//! let mut state = ReaderState::new(&mut registry);
//! state.read_definition("struct Foo\nuint8_t a\nend_struct\n", &mut [&mut header])?;
//! println!("{}", header.content());
//! # Ok::<(), configdef::CompileError>(())
//! ```

pub mod ast;
pub mod consumer;
pub mod error;
pub mod field;
pub mod parser;
pub mod reader;
pub mod structure;
pub mod template;
pub mod variables;

pub use consumer::{
    CHeaderConsumer, CHeaderOptions, ConfigurationConsumer, JavaFieldsConsumer,
    JavaFieldsOptions, TsProjectConsumer,
};
pub use error::CompileError;
pub use field::{CustomType, Field, FieldType, ScalarType};
pub use parser::{normalize_line, parse_line};
pub use reader::{ReaderOptions, ReaderState};
pub use structure::{PlacedField, Structure, StructureBuilder};
pub use template::render_template;
pub use variables::{RegistryError, VariableRegistry, VariableValue};

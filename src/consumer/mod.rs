//! Consumers: backends that observe structure-completion events of one parse and each
//! render their own artifact. Consumers never mutate the model and never depend on each
//! other, so every artifact describes the same layout.

mod c_header;
mod flatten;
mod java_fields;
mod ts_project;

pub use c_header::{CHeaderConsumer, CHeaderOptions};
pub use flatten::{flatten, FlatField, RootStructures};
pub use java_fields::{JavaFieldsConsumer, JavaFieldsOptions};
pub use ts_project::TsProjectConsumer;

use crate::error::CompileError;
use crate::structure::Structure;
use std::rc::Rc;

pub trait ConfigurationConsumer {
    /// Called once before the first line is read.
    fn start_file(&mut self) -> Result<(), CompileError> {
        Ok(())
    }

    /// Called once per closed structure, innermost first.
    fn handle_end_struct(&mut self, structure: &Rc<Structure>) -> Result<(), CompileError>;

    /// Called once after the last line; flush accumulated output.
    fn end_file(&mut self) -> Result<(), CompileError> {
        Ok(())
    }
}

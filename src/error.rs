//! Errors raised while compiling a definition file. All of them abort the current run.

/// Fatal compile error. Line numbers are 1-based and refer to the file being read;
/// `content` is the normalized line.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("line {line}: unexpected end_struct, no structure is open")]
    UnbalancedStructure { line: usize },
    #[error("input ended with unclosed structure(s): {}", .names.join(", "))]
    UnclosedStructures { names: Vec<String> },
    #[error("line {line}: [{content}] is not enclosed in a struct")]
    NoOpenStructure { line: usize, content: String },
    #[error("line {line}: cannot parse line [{content}]")]
    UnparsableFieldLine { line: usize, content: String },
    #[error("line {line}: size [{token}] in [{content}] is not an integer")]
    MalformedSize {
        line: usize,
        token: String,
        content: String,
    },
    #[error("line {line} in {structure}: cannot resolve size [{token}]")]
    UnresolvedSize {
        line: usize,
        structure: String,
        token: String,
    },
    #[error("line {line} in {structure}: unknown type [{type_name}]")]
    UnknownType {
        line: usize,
        structure: String,
        type_name: String,
    },
    #[error("line {line} in {structure}: invalid field: {reason}")]
    InvalidField {
        line: usize,
        structure: String,
        reason: String,
    },
    #[error("{structure} placed at {position} runs past the end of the address space")]
    PositionOverflow { structure: String, position: usize },
    #[error("Format: {0}")]
    Fmt(#[from] std::fmt::Error),
}

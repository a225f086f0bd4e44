//! Macro-expanded template pass: registered variables substituted into a text file.

use crate::variables::VariableRegistry;

/// Variable the CLI sets before rendering, describing the generator run.
pub const GENERATOR_MESSAGE: &str = "generator_message";

/// Apply variables line by line. Unmatched text is copied verbatim; every line,
/// including the last, ends with `\n`.
pub fn render_template(registry: &VariableRegistry, template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    for line in template.lines() {
        out.push_str(&registry.apply_variables(line));
        out.push('\n');
    }
    out
}

//! Macro registry: `#define` names mapped to integer or text values.
//!
//! Substitution is plain text replacement with no scoping and no recursion guard: a macro
//! whose value mentions another registered name is expanded again if that name is applied
//! later. Re-registering a name overwrites the previous value.

use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableValue::Int(i) => write!(f, "{}", i),
            VariableValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Unresolved size: {0}")]
    UnresolvedSize(String),
}

#[derive(Debug, Clone, Default)]
pub struct VariableRegistry {
    values: BTreeMap<String, VariableValue>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `name`, as an integer when it parses as one.
    pub fn register(&mut self, name: &str, value: &str) {
        let trimmed = value.trim();
        let parsed = match trimmed.parse::<i64>() {
            Ok(i) => VariableValue::Int(i),
            Err(_) => VariableValue::Text(value.to_string()),
        };
        log::debug!("Registering {} as {}", name, parsed);
        if let Some(previous) = self.values.insert(name.to_string(), parsed) {
            log::debug!("{} overwrites previous value {}", name, previous);
        }
    }

    pub fn get(&self, name: &str) -> Option<&VariableValue> {
        self.values.get(name)
    }

    pub fn int_value(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(VariableValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Resolve an array or type size: integer macro first, then a decimal literal.
    pub fn resolve_size(&self, token: &str) -> Result<usize, RegistryError> {
        let value = match self.int_value(token) {
            Some(i) => i,
            None => token
                .parse::<i64>()
                .map_err(|_| RegistryError::UnresolvedSize(token.to_string()))?,
        };
        usize::try_from(value).map_err(|_| RegistryError::UnresolvedSize(token.to_string()))
    }

    /// Replace every occurrence of every registered name in `text` with its value.
    pub fn apply_variables(&self, text: &str) -> String {
        // Longest names first so that `CLT_SIZE` is not clobbered by `SIZE`.
        let mut names: Vec<&String> = self.values.keys().filter(|n| !n.is_empty()).collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let mut out = text.to_string();
        for name in names {
            if out.contains(name.as_str()) {
                out = out.replace(name.as_str(), &self.values[name].to_string());
            }
        }
        out
    }

    /// C header with one `#define` per registered name, in name order.
    pub fn render_defines(&self) -> String {
        let mut out = String::from("#pragma once\n\n");
        for (name, value) in &self.values {
            match value {
                VariableValue::Int(i) => out.push_str(&format!("#define {} {}\n", name, i)),
                VariableValue::Text(s) if s.is_empty() => {
                    out.push_str(&format!("#define {}\n", name))
                }
                VariableValue::Text(s) => out.push_str(&format!("#define {} {}\n", name, s)),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_parses_integers() {
        let mut r = VariableRegistry::new();
        r.register("SIZE", " 16 ");
        r.register("NAME", "\"rusEFI\"");
        assert_eq!(r.get("SIZE"), Some(&VariableValue::Int(16)));
        assert_eq!(r.get("NAME"), Some(&VariableValue::Text("\"rusEFI\"".to_string())));
    }

    #[test]
    fn last_write_wins() {
        let mut r = VariableRegistry::new();
        r.register("SIZE", "4");
        r.register("SIZE", "8");
        assert_eq!(r.int_value("SIZE"), Some(8));
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn resolve_size_prefers_macro_then_literal() {
        let mut r = VariableRegistry::new();
        r.register("CLT_CURVE_SIZE", "16");
        assert_eq!(r.resolve_size("CLT_CURVE_SIZE"), Ok(16));
        assert_eq!(r.resolve_size("8"), Ok(8));
        assert_eq!(
            r.resolve_size("MISSING"),
            Err(RegistryError::UnresolvedSize("MISSING".to_string()))
        );
        r.register("NEG", "-1");
        assert!(r.resolve_size("NEG").is_err());
    }

    #[test]
    fn text_macro_is_not_a_size() {
        let mut r = VariableRegistry::new();
        r.register("LABEL", "hello");
        assert!(r.resolve_size("LABEL").is_err());
    }

    #[test]
    fn apply_variables_longest_name_first() {
        let mut r = VariableRegistry::new();
        r.register("SIZE", "4");
        r.register("CLT_SIZE", "16");
        assert_eq!(r.apply_variables("[CLT_SIZE] [SIZE]"), "[16] [4]");
    }

    #[test]
    fn apply_variables_is_idempotent_without_matches() {
        let mut r = VariableRegistry::new();
        r.register("RPM", "rpm");
        let once = r.apply_variables("units RPM");
        assert_eq!(once, "units rpm");
        assert_eq!(r.apply_variables(&once), once);
        assert_eq!(r.apply_variables("nothing here"), "nothing here");
    }

    #[test]
    fn render_defines_lists_everything() {
        let mut r = VariableRegistry::new();
        r.register("B", "2");
        r.register("A", "x y");
        r.register("FLAG", "");
        let h = r.render_defines();
        assert!(h.starts_with("#pragma once\n"));
        assert!(h.contains("#define A x y\n#define B 2\n#define FLAG\n"));
    }
}

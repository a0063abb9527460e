//! Flat `{identifier}` placeholders: discovery and substitution.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
});

/// Distinct placeholder identifiers in order of first appearance.
pub fn placeholders(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    PLACEHOLDER
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Outcome of [`substitute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub text: String,
    /// Identifiers with no (or an empty) value, rendered as `[identifier]`.
    pub unresolved: Vec<String>,
}

/// Replace every `{identifier}` with its value from `vars`.
///
/// Missing or empty values become the literal `[identifier]`. Braces inside a
/// value are inserted as `(` and `)`, so a value can never introduce a new
/// placeholder and a second pass over the output changes nothing (for
/// templates without nested braces, which validation already rejects).
pub fn substitute(text: &str, vars: &BTreeMap<String, String>) -> Substitution {
    let mut unresolved = Vec::new();
    for name in placeholders(text) {
        match vars.get(&name) {
            Some(v) if !v.is_empty() => {}
            _ => unresolved.push(name),
        }
    }

    let text = render(text, |name| match vars.get(name) {
        Some(v) if !v.is_empty() => v.replace('{', "(").replace('}', ")"),
        _ => format!("[{name}]"),
    });

    Substitution { text, unresolved }
}

/// Single left-to-right pass replacing each placeholder with `value(name)`.
/// Replacement text is never re-scanned.
pub(crate) fn render(text: &str, mut value: impl FnMut(&str) -> String) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &regex::Captures<'_>| value(&caps[1]))
        .into_owned()
}

use super::ValidationResult;
use crate::context::CONTEXT_FIELDS;
use crate::prompt::SchemaVersion;
use crate::routing::{version_from_value, Route, RoutingFileConfig};
use crate::template;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeSet;

/// Prompts longer than this are rejected.
pub const MAX_PROMPT_CHARS: usize = 50_000;

/// Prompts shorter than this draw a warning.
pub const MIN_PROMPT_CHARS: usize = 20;

const REQUIRED_KEYS: &[&str] = &["version", "routes", "fallback_chain"];
const OPTIONAL_KEYS: &[&str] = &["variables", "config"];

/// Structural checks for routing files and prompt templates. Never fails;
/// every problem is reported through a [`ValidationResult`].
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    max_prompt_chars: usize,
    min_prompt_chars: usize,
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self {
            max_prompt_chars: MAX_PROMPT_CHARS,
            min_prompt_chars: MIN_PROMPT_CHARS,
        }
    }
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_prompt_chars(mut self, max: usize) -> Self {
        self.max_prompt_chars = max;
        self
    }

    /// Full check of raw routing-file text: syntax, structure and references.
    pub fn validate_routing_file(&self, text: &str) -> ValidationResult {
        let value: Value = match serde_yaml::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                let mut result = ValidationResult::new();
                result.error(format!("invalid YAML: {e}"));
                return result;
            }
        };

        let mut result = self.validate_routing_value(&value);
        if !result.is_valid {
            return result;
        }

        match crate::routing::RoutingFileParser::typed_from_value(value) {
            Ok(config) => result.merge(self.validate_routing_config(&config)),
            Err(e) => result.error(e.to_string()),
        }
        result
    }

    /// Top-level shape of a routing file before typed deserialisation.
    pub fn validate_routing_value(&self, value: &Value) -> ValidationResult {
        let mut result = ValidationResult::new();

        let Some(map) = value.as_mapping() else {
            result.error("routing file must be a mapping at the top level");
            return result;
        };

        for key in REQUIRED_KEYS {
            if !map.contains_key(*key) {
                result.error(format!("missing required key '{key}'"));
            }
        }

        for key in map.keys() {
            let name = key.as_str().unwrap_or("<non-string>");
            if !REQUIRED_KEYS.contains(&name) && !OPTIONAL_KEYS.contains(&name) {
                result.warning(format!("unknown top-level key '{name}' is ignored"));
            }
        }

        let version = map.get("version").and_then(version_from_value);
        match (map.get("version"), version) {
            (Some(raw), None) => result.error(format!(
                "unrecognised schema version {}",
                describe(raw)
            )),
            (Some(_), Some(SchemaVersion::V1)) => {
                for key in OPTIONAL_KEYS {
                    if map.contains_key(*key) {
                        result.warning(format!("'{key}' requires schema v2 and is ignored by v1 readers"));
                    }
                }
            }
            _ => {}
        }

        if let Some(routes) = map.get("routes") {
            match routes.as_mapping() {
                Some(m) if m.is_empty() => result.error("'routes' must declare at least one route"),
                Some(m) => check_route_shapes(m, &mut result),
                None => result.error("'routes' must be a mapping of route name to route"),
            }
        }

        if let Some(chain) = map.get("fallback_chain") {
            match chain.as_sequence() {
                Some(items) if items.iter().all(|i| i.as_str().is_some()) => {}
                Some(_) => result.error("'fallback_chain' entries must be route names"),
                None => result.error("'fallback_chain' must be a list of route names"),
            }
        }

        for key in OPTIONAL_KEYS {
            if let Some(block) = map.get(*key) {
                if !block.is_mapping() && !block.is_null() {
                    result.error(format!("'{key}' must be a mapping"));
                }
            }
        }

        result
    }

    /// Cross-references within a typed routing file.
    pub fn validate_routing_config(&self, config: &RoutingFileConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        let mut seen = BTreeSet::new();
        for name in &config.fallback_chain {
            if !config.routes.contains_key(name) {
                result.error(format!("fallback_chain references undeclared route '{name}'"));
            }
            if !seen.insert(name.as_str()) {
                result.warning(format!("route '{name}' appears more than once in fallback_chain"));
            }
        }

        for (name, route) in &config.routes {
            if !seen.contains(name.as_str()) {
                result.warning(format!(
                    "route '{name}' is not in fallback_chain and sorts after chained routes on ties"
                ));
            }
            self.check_route(name, route, config, &mut result);
        }

        result
    }

    fn check_route(
        &self,
        name: &str,
        route: &Route,
        config: &RoutingFileConfig,
        result: &mut ValidationResult,
    ) {
        let template = route.path_template.trim();
        if template.is_empty() {
            result.error(format!("route '{name}': path_template is empty"));
            return;
        }
        if template.starts_with('/') || template.contains('\\') {
            result.error(format!(
                "route '{name}': path_template must be a relative path with '/' separators"
            ));
        }
        if template.split('/').any(|segment| segment == "..") {
            result.error(format!("route '{name}': path_template must not contain '..'"));
        }

        let braces = check_braces(template);
        for problem in braces.errors {
            result.error(format!("route '{name}': path_template {problem}"));
        }

        for placeholder in template::placeholders(template) {
            let known = CONTEXT_FIELDS.contains(&placeholder.as_str())
                || config.variables.contains_key(&placeholder)
                || route.variables.contains_key(&placeholder);
            if !known {
                result.error(format!(
                    "route '{name}': placeholder '{{{placeholder}}}' is neither a context field nor a declared variable"
                ));
            }
        }

        for (i, condition) in route.conditions.iter().enumerate() {
            if condition.field.trim().is_empty() {
                result.error(format!("route '{name}': condition #{} has no field", i + 1));
            } else if condition.predicates().is_empty() {
                result.warning(format!(
                    "route '{name}': condition on '{}' has no predicate and always holds",
                    condition.field
                ));
            }
        }
    }

    /// Check candidate prompt text: non-empty, well-formed braces, sane length.
    pub fn validate_prompt(&self, text: &str) -> ValidationResult {
        let mut result = ValidationResult::new();

        if text.trim().is_empty() {
            result.error("prompt is empty");
            return result;
        }

        let chars = text.chars().count();
        if chars > self.max_prompt_chars {
            result.error(format!(
                "prompt is {chars} characters, limit is {}",
                self.max_prompt_chars
            ));
        } else if chars < self.min_prompt_chars {
            result.warning(format!("prompt is only {chars} characters"));
        }

        result.merge(check_braces(text));

        if result.is_valid && template::placeholders(text).is_empty() {
            result.warning("prompt has no placeholders");
        }

        result
    }
}

fn describe(value: &Value) -> String {
    crate::routing::scalar_to_string(value)
        .map(|s| format!("'{s}'"))
        .unwrap_or_else(|| "(not a scalar)".to_string())
}

fn check_route_shapes(routes: &Mapping, result: &mut ValidationResult) {
    for (key, route) in routes {
        let name = key.as_str().unwrap_or("<non-string>");
        match route.as_mapping() {
            Some(fields) => {
                if !fields.contains_key("path_template") {
                    result.error(format!("route '{name}' is missing 'path_template'"));
                }
                if let Some(p) = fields.get("priority") {
                    if !p.is_i64() && !p.is_u64() {
                        result.error(format!("route '{name}': priority must be an integer"));
                    }
                }
                if let Some(c) = fields.get("conditions") {
                    if !c.is_sequence() && !c.is_null() {
                        result.error(format!("route '{name}': conditions must be a list"));
                    }
                }
            }
            None => result.error(format!("route '{name}' must be a mapping")),
        }
    }
}

/// Balanced, non-nested `{` / `}`. Non-identifier groups are only warned about.
fn check_braces(text: &str) -> ValidationResult {
    let mut result = ValidationResult::new();
    let mut open: Option<usize> = None;
    let mut group = String::new();

    for (i, ch) in text.char_indices() {
        match (ch, open) {
            ('{', Some(at)) => {
                result.error(format!("has a nested '{{' at offset {i} inside group opened at {at}"));
                return result;
            }
            ('{', None) => {
                open = Some(i);
                group.clear();
            }
            ('}', None) => {
                result.error(format!("has an unmatched '}}' at offset {i}"));
                return result;
            }
            ('}', Some(_)) => {
                if !is_identifier(&group) {
                    result.warning(format!(
                        "brace group '{{{group}}}' is not a placeholder and is kept literally"
                    ));
                }
                open = None;
            }
            (c, Some(_)) => group.push(c),
            _ => {}
        }
    }

    if let Some(at) = open {
        result.error(format!("has an unclosed '{{' at offset {at}"));
    }
    result
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

mod conditions;
mod parser;

pub use conditions::{MatchCondition, Predicate};
pub use parser::{RouteCandidate, RoutingFileParser};

use crate::prompt::SchemaVersion;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// Parsed form of a guild's routing file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingFileConfig {
    pub version: SchemaVersion,
    pub routes: BTreeMap<String, Route>,
    /// Route names in tie-break order. Every name exists in `routes`.
    pub fallback_chain: Vec<String>,
    #[serde(default)]
    pub variables: BTreeMap<String, VariableDecl>,
    /// Free-form block owned by the guild; not interpreted.
    #[serde(default)]
    pub config: BTreeMap<String, Value>,
}

/// One named routing rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Route {
    /// Repository-relative path with `{placeholder}`s, e.g. `prompts/{category}.md`.
    pub path_template: String,
    /// All must hold for the route to apply. Empty means always.
    #[serde(default)]
    pub conditions: Vec<MatchCondition>,
    /// Higher is tried first.
    #[serde(default)]
    pub priority: i64,
    /// Extra values available to this route's path template.
    #[serde(default)]
    pub variables: BTreeMap<String, Value>,
}

/// Global variable declaration from the routing file's `variables` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableDecl {
    /// Used when neither the context nor the route supplies a value.
    pub default: Option<Value>,
    pub description: Option<String>,
}

/// String form of a YAML scalar; `None` for null, sequences and mappings.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Schema version from a YAML `version:` value (`v1`, `"2"`, `1`, ...).
pub(crate) fn version_from_value(value: &Value) -> Option<SchemaVersion> {
    match value {
        Value::String(s) => SchemaVersion::parse(s),
        Value::Number(n) => SchemaVersion::parse(&n.to_string()),
        _ => None,
    }
}

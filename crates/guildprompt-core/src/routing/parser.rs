use super::{scalar_to_string, version_from_value, Route, RoutingFileConfig, VariableDecl};
use crate::context::PromptContext;
use crate::error::{PromptError, Result};
use crate::schema::SchemaValidator;
use crate::template;
use serde::Deserialize;
use serde_yaml::Value;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};

/// A route that applies to a context, rendered to a concrete repository path.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteCandidate {
    pub route_name: String,
    pub priority: i64,
    /// The route's `path_template`.
    pub pattern: String,
    pub path: String,
    /// Values that drove selection: condition fields and path placeholders.
    pub routing_variables: BTreeMap<String, String>,
}

/// Shape of the file as written; `version` is checked separately so that both
/// `v1` and `1` are accepted.
#[derive(Deserialize)]
struct RawRoutingFile {
    version: Value,
    routes: BTreeMap<String, Route>,
    fallback_chain: Vec<String>,
    #[serde(default)]
    variables: Option<BTreeMap<String, VariableDecl>>,
    #[serde(default)]
    config: Option<BTreeMap<String, Value>>,
}

/// Parses routing files and maps a context to candidate template paths.
#[derive(Debug, Clone, Default)]
pub struct RoutingFileParser {
    validator: SchemaValidator,
}

impl RoutingFileParser {
    pub fn new(validator: SchemaValidator) -> Self {
        Self { validator }
    }

    /// Parse and validate routing-file text. Any validation error rejects the file.
    pub fn parse(&self, text: &str) -> Result<RoutingFileConfig> {
        let value: Value = serde_yaml::from_str(text)?;

        let structure = self.validator.validate_routing_value(&value);
        if !structure.is_valid {
            return Err(PromptError::RoutingInvalid {
                errors: structure.errors,
            });
        }

        let config = Self::typed_from_value(value)?;

        let mut report = structure;
        report.merge(self.validator.validate_routing_config(&config));
        if !report.is_valid {
            return Err(PromptError::RoutingInvalid {
                errors: report.errors,
            });
        }
        for warning in &report.warnings {
            log::debug!("Routing file warning: {}", warning);
        }

        Ok(config)
    }

    pub(crate) fn typed_from_value(value: Value) -> Result<RoutingFileConfig> {
        let raw: RawRoutingFile = serde_yaml::from_value(value)?;
        let version = version_from_value(&raw.version).ok_or_else(|| PromptError::RoutingInvalid {
            errors: vec!["unrecognised schema version".to_string()],
        })?;

        Ok(RoutingFileConfig {
            version,
            routes: raw.routes,
            fallback_chain: raw.fallback_chain,
            variables: raw.variables.unwrap_or_default(),
            config: raw.config.unwrap_or_default(),
        })
    }

    /// Concrete, de-duplicated candidate paths for `context`, best first.
    pub fn resolve_paths(&self, config: &RoutingFileConfig, context: &PromptContext) -> Vec<String> {
        self.resolve_routes(config, context)
            .into_iter()
            .map(|c| c.path)
            .collect()
    }

    /// Matching routes ordered by descending priority, ties broken by position
    /// in the fallback chain (unchained routes last, then by name). Routes whose
    /// placeholders cannot all be filled safely are skipped.
    pub fn resolve_routes(
        &self,
        config: &RoutingFileConfig,
        context: &PromptContext,
    ) -> Vec<RouteCandidate> {
        let vars = context.variables();

        let chain_position = |name: &str| {
            config
                .fallback_chain
                .iter()
                .position(|n| n == name)
                .unwrap_or(usize::MAX)
        };

        let mut matching: Vec<(&String, &Route)> = config
            .routes
            .iter()
            .filter(|(_, route)| route.conditions.iter().all(|c| c.matches(&vars)))
            .collect();
        matching.sort_by_key(|(name, route)| (Reverse(route.priority), chain_position(name), *name));

        let mut seen_paths = HashSet::new();
        let mut candidates = Vec::new();

        for (name, route) in matching {
            let Some(candidate) = render_route(name, route, config, &vars) else {
                continue;
            };
            if seen_paths.insert(candidate.path.clone()) {
                candidates.push(candidate);
            }
        }

        candidates
    }
}

fn render_route(
    name: &str,
    route: &Route,
    config: &RoutingFileConfig,
    vars: &BTreeMap<String, String>,
) -> Option<RouteCandidate> {
    let mut routing_variables = BTreeMap::new();
    for condition in &route.conditions {
        if let Some(value) = vars.get(&condition.field) {
            routing_variables.insert(condition.field.clone(), value.clone());
        }
    }

    let mut segments = BTreeMap::new();
    for placeholder in template::placeholders(&route.path_template) {
        let raw = vars
            .get(&placeholder)
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .or_else(|| route.variables.get(&placeholder).and_then(scalar_to_string))
            .or_else(|| {
                config
                    .variables
                    .get(&placeholder)
                    .and_then(|decl| decl.default.as_ref())
                    .and_then(scalar_to_string)
            });

        let Some(raw) = raw else {
            log::debug!("Route '{}' skipped: no value for '{{{}}}'", name, placeholder);
            return None;
        };
        let Some(segment) = path_segment(&raw) else {
            log::warn!(
                "Route '{}' skipped: value {:?} for '{{{}}}' is not a safe path segment",
                name,
                raw,
                placeholder
            );
            return None;
        };

        segments.insert(placeholder.clone(), segment);
        routing_variables.insert(placeholder, raw);
    }
    let path = template::render(route.path_template.trim(), |name| {
        segments.get(name).cloned().unwrap_or_default()
    });

    Some(RouteCandidate {
        route_name: name.to_string(),
        priority: route.priority,
        pattern: route.path_template.clone(),
        path,
        routing_variables,
    })
}

/// Lower-cased, whitespace collapsed to `-`; `None` for values that could
/// escape the template's directory.
fn path_segment(value: &str) -> Option<String> {
    let segment = value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();

    if segment.is_empty() || segment.contains('/') || segment.contains('\\') || segment.contains("..") {
        return None;
    }
    Some(segment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::SchemaVersion;

    const ROUTING: &str = r#"
version: v2
routes:
  meeting-perspective:
    path_template: prompts/meeting/{perspective}.md
    priority: 30
    conditions:
      - field: category
        equals: meeting
      - field: perspective
        exists: true
  large-batch:
    path_template: prompts/{category}/large.md
    priority: 20
    conditions:
      - field: message_count
        min: 500
  channel:
    path_template: channels/{channel_name}.md
    priority: 10
  category:
    path_template: prompts/{category}.md
    priority: 10
  toned:
    path_template: prompts/{tone}/{category}.md
    priority: 5
  generic:
    path_template: prompts/default.md
fallback_chain: [meeting-perspective, large-batch, category, channel, toned, generic]
variables:
  tone:
    default: neutral
    description: Voice of the summary
config:
  maintainer: ops
"#;

    fn parser() -> RoutingFileParser {
        RoutingFileParser::default()
    }

    fn parsed() -> RoutingFileConfig {
        parser().parse(ROUTING).unwrap()
    }

    // ── parse ─────────────────────────────────────────────────────────────────

    #[test]
    fn parse_reads_every_section() {
        let config = parsed();
        assert_eq!(config.version, SchemaVersion::V2);
        assert_eq!(config.routes.len(), 6);
        assert_eq!(config.fallback_chain[0], "meeting-perspective");
        assert_eq!(config.routes["generic"].priority, 0);
        assert_eq!(config.routes["meeting-perspective"].conditions.len(), 2);
        assert!(config.variables.contains_key("tone"));
        assert!(config.config.contains_key("maintainer"));
    }

    #[test]
    fn parse_rejects_invalid_structure() {
        let err = parser()
            .parse("version: v1\nroutes:\n  a:\n    path_template: x.md\nfallback_chain: [b]\n")
            .unwrap_err();
        match err {
            PromptError::RoutingInvalid { errors } => {
                assert!(errors.iter().any(|e| e.contains("undeclared route 'b'")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parse_rejects_bad_yaml() {
        let err = parser().parse("routes: [").unwrap_err();
        assert!(matches!(err, PromptError::RoutingSyntax(_)));
    }

    #[test]
    fn parse_rejects_unknown_route_fields() {
        let text = "version: v1\nroutes:\n  a:\n    path_template: x.md\n    priorty: 3\nfallback_chain: [a]\n";
        assert!(parser().parse(text).is_err());
    }

    #[test]
    fn parse_accepts_minimal_v1() {
        let text = "version: 1\nroutes:\n  a:\n    path_template: prompts/{category}.md\nfallback_chain: [a]\n";
        let config = parser().parse(text).unwrap();
        assert_eq!(config.version, SchemaVersion::V1);
        assert!(config.variables.is_empty());
    }

    // ── resolve_paths ─────────────────────────────────────────────────────────

    #[test]
    fn highest_priority_first_then_chain_order() {
        let ctx = PromptContext::new("g1")
            .with_category("Meeting")
            .with_perspective("Developer")
            .with_channel("42", "Daily Standup");

        let paths = parser().resolve_paths(&parsed(), &ctx);
        assert_eq!(
            paths,
            vec![
                "prompts/meeting/developer.md",
                // priority 10 tie: `category` precedes `channel` in the chain
                "prompts/meeting.md",
                "channels/daily-standup.md",
                "prompts/neutral/meeting.md",
                "prompts/default.md",
            ]
        );
    }

    #[test]
    fn routes_with_unfillable_placeholders_skipped() {
        let ctx = PromptContext::new("g1").with_category("discussion");
        let paths = parser().resolve_paths(&parsed(), &ctx);
        assert!(!paths.iter().any(|p| p.starts_with("channels/")));
        assert_eq!(paths[0], "prompts/discussion.md");
    }

    #[test]
    fn numeric_condition_selects_route() {
        let ctx = PromptContext::new("g1")
            .with_category("discussion")
            .with_message_count(800);
        let paths = parser().resolve_paths(&parsed(), &ctx);
        assert_eq!(paths[0], "prompts/discussion/large.md");
    }

    #[test]
    fn context_value_overrides_variable_default() {
        let ctx = PromptContext::new("g1")
            .with_category("discussion")
            .with_extra("tone", "Playful");
        let paths = parser().resolve_paths(&parsed(), &ctx);
        assert!(paths.contains(&"prompts/playful/discussion.md".to_string()));
    }

    #[test]
    fn traversal_values_rejected() {
        let ctx = PromptContext::new("g1").with_category("../../etc/passwd");
        let paths = parser().resolve_paths(&parsed(), &ctx);
        assert!(paths.iter().all(|p| !p.contains("..")));
        assert!(paths.contains(&"prompts/default.md".to_string()));
    }

    #[test]
    fn duplicate_paths_collapsed() {
        let text = r#"
version: v1
routes:
  a:
    path_template: prompts/{category}.md
    priority: 2
  b:
    path_template: prompts/{category}.md
    priority: 1
fallback_chain: [a, b]
"#;
        let config = parser().parse(text).unwrap();
        let paths = parser().resolve_paths(&config, &PromptContext::new("g").with_category("x"));
        assert_eq!(paths, vec!["prompts/x.md"]);
    }

    #[test]
    fn unchained_routes_sort_after_chained_on_ties() {
        let text = r#"
version: v1
routes:
  zeta:
    path_template: z.md
  alpha:
    path_template: a.md
  chained:
    path_template: c.md
fallback_chain: [chained]
"#;
        let config = parser().parse(text).unwrap();
        let paths = parser().resolve_paths(&config, &PromptContext::new("g"));
        assert_eq!(paths, vec!["c.md", "a.md", "z.md"]);
    }

    #[test]
    fn substituted_values_are_not_expanded_again() {
        let ctx = PromptContext::new("g1")
            .with_category("standup")
            .with_extra("tone", "{category}");
        let candidates = parser().resolve_routes(&parsed(), &ctx);
        let toned = candidates.iter().find(|c| c.route_name == "toned").unwrap();
        assert_eq!(toned.path, "prompts/{category}/standup.md");
    }

    #[test]
    fn candidates_record_routing_variables() {
        let ctx = PromptContext::new("g1")
            .with_category("meeting")
            .with_perspective("executive");
        let candidates = parser().resolve_routes(&parsed(), &ctx);
        let top = &candidates[0];

        assert_eq!(top.route_name, "meeting-perspective");
        assert_eq!(top.pattern, "prompts/meeting/{perspective}.md");
        assert_eq!(top.routing_variables["category"], "meeting");
        assert_eq!(top.routing_variables["perspective"], "executive");
        assert_eq!(top.routing_variables.len(), 2);
    }
}

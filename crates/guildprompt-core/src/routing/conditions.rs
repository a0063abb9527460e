use super::scalar_to_string;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// A predicate over one context field, as written in the routing file:
///
/// ```yaml
/// - field: category
///   in: [meeting, standup]
/// - field: message_count
///   min: 50
/// ```
///
/// Every predicate set on a condition must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchCondition {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_equals: Option<Value>,
    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals(String),
    NotEquals(String),
    In(Vec<String>),
    Exists(bool),
    Min(f64),
    Max(f64),
}

impl MatchCondition {
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut preds = Vec::new();
        if let Some(v) = self.equals.as_ref().and_then(scalar_to_string) {
            preds.push(Predicate::Equals(v));
        }
        if let Some(v) = self.not_equals.as_ref().and_then(scalar_to_string) {
            preds.push(Predicate::NotEquals(v));
        }
        if let Some(values) = &self.one_of {
            preds.push(Predicate::In(values.iter().filter_map(scalar_to_string).collect()));
        }
        if let Some(flag) = self.exists {
            preds.push(Predicate::Exists(flag));
        }
        if let Some(min) = self.min {
            preds.push(Predicate::Min(min));
        }
        if let Some(max) = self.max {
            preds.push(Predicate::Max(max));
        }
        preds
    }

    /// True when every predicate holds against `vars`.
    pub fn matches(&self, vars: &BTreeMap<String, String>) -> bool {
        let actual = vars
            .get(&self.field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty());

        self.predicates().iter().all(|pred| pred.holds(actual))
    }
}

impl Predicate {
    fn holds(&self, actual: Option<&str>) -> bool {
        match self {
            Predicate::Equals(expected) => actual.is_some_and(|a| same(a, expected)),
            Predicate::NotEquals(expected) => !actual.is_some_and(|a| same(a, expected)),
            Predicate::In(options) => actual.is_some_and(|a| options.iter().any(|o| same(a, o))),
            Predicate::Exists(flag) => actual.is_some() == *flag,
            Predicate::Min(min) => numeric(actual).is_some_and(|n| n >= *min),
            Predicate::Max(max) => numeric(actual).is_some_and(|n| n <= *max),
        }
    }
}

fn same(actual: &str, expected: &str) -> bool {
    actual.eq_ignore_ascii_case(expected.trim())
}

fn numeric(actual: Option<&str>) -> Option<f64> {
    actual.and_then(|a| a.parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn cond(yaml: &str) -> MatchCondition {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn equals_is_case_insensitive() {
        let c = cond("field: category\nequals: Meeting");
        assert!(c.matches(&vars(&[("category", "meeting")])));
        assert!(!c.matches(&vars(&[("category", "discussion")])));
        assert!(!c.matches(&vars(&[])));
    }

    #[test]
    fn not_equals_holds_for_missing_field() {
        let c = cond("field: perspective\nnot_equals: executive");
        assert!(c.matches(&vars(&[])));
        assert!(c.matches(&vars(&[("perspective", "developer")])));
        assert!(!c.matches(&vars(&[("perspective", "EXECUTIVE")])));
    }

    #[test]
    fn in_accepts_any_listed_scalar() {
        let c = cond("field: channel_id\nin: [123, '456']");
        assert!(c.matches(&vars(&[("channel_id", "123")])));
        assert!(c.matches(&vars(&[("channel_id", "456")])));
        assert!(!c.matches(&vars(&[("channel_id", "789")])));
    }

    #[test]
    fn exists_checks_presence_and_blankness() {
        let present = cond("field: user_id\nexists: true");
        let absent = cond("field: user_id\nexists: false");
        assert!(present.matches(&vars(&[("user_id", "u1")])));
        assert!(!present.matches(&vars(&[("user_id", "  ")])));
        assert!(absent.matches(&vars(&[])));
    }

    #[test]
    fn numeric_bounds_are_inclusive() {
        let c = cond("field: message_count\nmin: 10\nmax: 100");
        assert!(c.matches(&vars(&[("message_count", "10")])));
        assert!(c.matches(&vars(&[("message_count", "100")])));
        assert!(!c.matches(&vars(&[("message_count", "101")])));
        assert!(!c.matches(&vars(&[("message_count", "many")])));
    }

    #[test]
    fn condition_without_predicates_always_matches() {
        let c = cond("field: category");
        assert!(c.predicates().is_empty());
        assert!(c.matches(&vars(&[])));
    }

    #[test]
    fn unknown_predicate_key_rejected() {
        assert!(serde_yaml::from_str::<MatchCondition>("field: a\nequal: b").is_err());
    }
}

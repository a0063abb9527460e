use super::builtin::{self, CATEGORIES, HARDCODED_FALLBACK, LENGTHS, PERSPECTIVES};
use super::{DEFAULT_CATEGORY_KEY, DEFAULT_LENGTH, DEFAULT_PERSPECTIVE};
use crate::context::PromptContext;
use crate::error::Result;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

const BUILTIN_PREFIX: &str = "builtin";
const TEMPLATE_EXTENSION: &str = "md";

/// A built-in template together with the key it was found under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultTemplate {
    pub path: String,
    pub content: String,
}

/// Result of a [`DefaultPromptProvider::get_prompt`] lookup.
#[derive(Debug, Clone, Default)]
pub struct DefaultLookup {
    pub matched: Option<DefaultTemplate>,
    /// Every key consulted, matched or not, in order.
    pub attempted: Vec<String>,
}

/// Built-in templates, organised as flat categories and as a
/// perspective × length hierarchy.
#[derive(Debug, Clone, Default)]
pub struct DefaultPromptProvider {
    categories: HashMap<String, String>,
    hierarchy: HashMap<String, HashMap<String, String>>,
}

impl DefaultPromptProvider {
    /// Provider loaded with the templates compiled into the crate.
    ///
    /// The default perspective has no template at the default length: that
    /// slot is what the flat category templates cover.
    pub fn builtin() -> Self {
        let categories = CATEGORIES
            .iter()
            .map(|(name, text)| (name.to_string(), text.to_string()))
            .collect();

        let hierarchy = PERSPECTIVES
            .iter()
            .map(|(perspective, p_guidance)| {
                let by_length = LENGTHS
                    .iter()
                    .filter(|(length, _)| {
                        *perspective != DEFAULT_PERSPECTIVE || *length != DEFAULT_LENGTH
                    })
                    .map(|(length, l_guidance)| {
                        (length.to_string(), builtin::hierarchical(p_guidance, l_guidance))
                    })
                    .collect();
                (perspective.to_string(), by_length)
            })
            .collect();

        Self { categories, hierarchy }
    }

    /// Provider with no templates at all; every lookup falls through to the
    /// hardcoded instruction.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_templates(
        categories: HashMap<String, String>,
        hierarchy: HashMap<String, HashMap<String, String>>,
    ) -> Self {
        let mut provider = Self::empty();
        for (name, text) in categories {
            provider.insert_category(&name, text);
        }
        for (perspective, lengths) in hierarchy {
            for (length, text) in lengths {
                provider.insert_hierarchical(&perspective, &length, text);
            }
        }
        provider
    }

    pub fn insert_category(&mut self, name: &str, content: impl Into<String>) {
        self.categories.insert(normalize(name), content.into());
    }

    pub fn insert_hierarchical(&mut self, perspective: &str, length: &str, content: impl Into<String>) {
        self.hierarchy
            .entry(normalize(perspective))
            .or_default()
            .insert(normalize(length), content.into());
    }

    /// Overlay templates from `dir`: `<dir>/<category>.md` and
    /// `<dir>/<perspective>/<length>.md`. Blank or unreadable files are skipped.
    /// Returns the number of templates loaded.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let mut loaded = 0;

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                let Some(perspective) = file_stem(&path, false) else {
                    continue;
                };
                for sub in std::fs::read_dir(&path)? {
                    let sub_path = sub?.path();
                    let Some(length) = file_stem(&sub_path, true) else {
                        continue;
                    };
                    if let Some(text) = read_template(&sub_path) {
                        self.insert_hierarchical(&perspective, &length, text);
                        loaded += 1;
                    }
                }
            } else if let Some(category) = file_stem(&path, true) {
                if let Some(text) = read_template(&path) {
                    self.insert_category(&category, text);
                    loaded += 1;
                }
            }
        }

        log::info!("Loaded {} default template(s) from {:?}", loaded, dir);
        Ok(loaded)
    }

    /// Drop every template, including built-ins.
    pub fn clear(&mut self) {
        self.categories.clear();
        self.hierarchy.clear();
    }

    /// First match of `{perspective}/{length}`, `{category}`, `default`.
    pub fn get_prompt(&self, context: &PromptContext) -> DefaultLookup {
        let mut lookup = DefaultLookup::default();

        let perspective = context
            .perspective
            .as_deref()
            .map(normalize)
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PERSPECTIVE.to_string());
        let length = context
            .summary_length
            .as_deref()
            .map(normalize)
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LENGTH.to_string());

        let key = format!("{BUILTIN_PREFIX}/{perspective}/{length}");
        lookup.attempted.push(key.clone());
        if let Some(text) = self.hierarchy.get(&perspective).and_then(|l| l.get(&length)) {
            lookup.matched = Some(DefaultTemplate { path: key, content: text.clone() });
            return lookup;
        }

        let category = normalize(&context.category);
        if !category.is_empty() {
            let key = format!("{BUILTIN_PREFIX}/{category}");
            lookup.attempted.push(key.clone());
            if let Some(text) = self.categories.get(&category) {
                lookup.matched = Some(DefaultTemplate { path: key, content: text.clone() });
                return lookup;
            }
        }

        let key = format!("{BUILTIN_PREFIX}/{DEFAULT_CATEGORY_KEY}");
        if !lookup.attempted.contains(&key) {
            lookup.attempted.push(key.clone());
            if let Some(text) = self.categories.get(DEFAULT_CATEGORY_KEY) {
                lookup.matched = Some(DefaultTemplate { path: key, content: text.clone() });
            }
        }

        lookup
    }

    /// The `default` category if loaded, else the hardcoded instruction.
    /// Never fails and never returns empty content.
    pub fn get_fallback_prompt(&self) -> DefaultTemplate {
        match self.categories.get(DEFAULT_CATEGORY_KEY) {
            Some(text) if !text.trim().is_empty() => DefaultTemplate {
                path: format!("{BUILTIN_PREFIX}/{DEFAULT_CATEGORY_KEY}"),
                content: text.clone(),
            },
            _ => DefaultTemplate {
                path: format!("{BUILTIN_PREFIX}/fallback"),
                content: HARDCODED_FALLBACK.to_string(),
            },
        }
    }

    pub fn get_category(&self, name: &str) -> Option<&str> {
        self.categories.get(&normalize(name)).map(String::as_str)
    }

    pub fn get_hierarchical(&self, perspective: &str, length: &str) -> Option<&str> {
        self.hierarchy
            .get(&normalize(perspective))
            .and_then(|lengths| lengths.get(&normalize(length)))
            .map(String::as_str)
    }

    pub fn categories(&self) -> Vec<String> {
        let mut names: Vec<String> = self.categories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Perspective → sorted lengths available for it.
    pub fn perspectives(&self) -> BTreeMap<String, Vec<String>> {
        self.hierarchy
            .iter()
            .map(|(perspective, lengths)| {
                let mut lengths: Vec<String> = lengths.keys().cloned().collect();
                lengths.sort();
                (perspective.clone(), lengths)
            })
            .collect()
    }
}

fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}

fn file_stem(path: &Path, want_template: bool) -> Option<String> {
    if want_template
        && path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXTENSION)
    {
        return None;
    }
    let stem = if want_template {
        path.file_stem()
    } else {
        path.file_name()
    };
    stem.and_then(|s| s.to_str()).map(normalize).filter(|s| !s.is_empty())
}

fn read_template(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => {
            log::warn!("Skipping empty default template {:?}", path);
            None
        }
        Err(e) => {
            log::warn!("Failed to read default template {:?}: {}", path, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ctx() -> PromptContext {
        PromptContext::new("g1")
    }

    // ── builtin ───────────────────────────────────────────────────────────────

    #[test]
    fn builtin_has_expected_shape() {
        let p = DefaultPromptProvider::builtin();
        for name in ["default", "discussion", "meeting", "moderation"] {
            assert!(p.get_category(name).is_some(), "missing category {name}");
        }
        let perspectives = p.perspectives();
        for name in ["developer", "marketing", "executive", "support"] {
            assert_eq!(
                perspectives[name],
                vec!["brief", "comprehensive", "detailed"],
                "lengths for {name}"
            );
        }
        assert_eq!(perspectives["general"], vec!["brief", "comprehensive"]);
    }

    // ── get_prompt ────────────────────────────────────────────────────────────

    #[test]
    fn hierarchy_beats_flat_category() {
        let p = DefaultPromptProvider::builtin();
        let c = ctx()
            .with_perspective("developer")
            .with_summary_length("brief")
            .with_category("meeting");

        let lookup = p.get_prompt(&c);
        let matched = lookup.matched.unwrap();
        assert_eq!(matched.path, "builtin/developer/brief");
        assert!(matched.content.contains("software developers"));
        assert_eq!(lookup.attempted, vec!["builtin/developer/brief"]);
    }

    #[test]
    fn unset_perspective_falls_through_to_category() {
        let p = DefaultPromptProvider::builtin();
        let lookup = p.get_prompt(&ctx().with_category("meeting"));
        assert_eq!(lookup.matched.unwrap().path, "builtin/meeting");
        assert_eq!(lookup.attempted, vec!["builtin/general/detailed", "builtin/meeting"]);

        let lookup = p.get_prompt(&ctx().with_summary_length("brief"));
        assert_eq!(lookup.matched.unwrap().path, "builtin/general/brief");
    }

    #[test]
    fn hierarchical_lookup_is_case_insensitive() {
        let p = DefaultPromptProvider::builtin();
        assert!(p.get_hierarchical("Developer", " BRIEF ").is_some());
        assert!(p.get_hierarchical("general", "detailed").is_none());
    }

    #[test]
    fn overlay_can_fill_general_detailed() {
        let mut p = DefaultPromptProvider::builtin();
        p.insert_hierarchical("general", "detailed", "Everyone gets the long version.");
        let lookup = p.get_prompt(&ctx().with_category("meeting"));
        assert_eq!(lookup.matched.unwrap().path, "builtin/general/detailed");
    }

    #[test]
    fn flat_category_after_hierarchy_miss() {
        let p = DefaultPromptProvider::builtin();
        let c = ctx().with_perspective("lawyer").with_category("Meeting");

        let lookup = p.get_prompt(&c);
        assert_eq!(lookup.matched.unwrap().path, "builtin/meeting");
        assert_eq!(lookup.attempted, vec!["builtin/lawyer/detailed", "builtin/meeting"]);
    }

    #[test]
    fn default_category_is_last_step() {
        let p = DefaultPromptProvider::builtin();
        let c = ctx().with_perspective("lawyer").with_category("poetry");

        let lookup = p.get_prompt(&c);
        assert_eq!(lookup.matched.unwrap().path, "builtin/default");
        assert_eq!(
            lookup.attempted,
            vec!["builtin/lawyer/detailed", "builtin/poetry", "builtin/default"]
        );
    }

    #[test]
    fn empty_provider_misses_every_step() {
        let p = DefaultPromptProvider::empty();
        let lookup = p.get_prompt(&ctx().with_category("meeting"));
        assert!(lookup.matched.is_none());
        assert_eq!(lookup.attempted.len(), 3);
    }

    // ── get_fallback_prompt ───────────────────────────────────────────────────

    #[test]
    fn fallback_prefers_default_category() {
        let p = DefaultPromptProvider::builtin();
        let fb = p.get_fallback_prompt();
        assert_eq!(fb.path, "builtin/default");
        assert_eq!(Some(fb.content.as_str()), p.get_category("default"));
    }

    #[test]
    fn fallback_hardcoded_when_nothing_loaded() {
        let fb = DefaultPromptProvider::empty().get_fallback_prompt();
        assert_eq!(fb.content, HARDCODED_FALLBACK);
        assert!(!fb.content.trim().is_empty());
    }

    #[test]
    fn fallback_ignores_blank_default() {
        let mut p = DefaultPromptProvider::empty();
        p.insert_category("default", "   ");
        assert_eq!(p.get_fallback_prompt().content, HARDCODED_FALLBACK);
    }

    // ── load_dir ──────────────────────────────────────────────────────────────

    #[test]
    fn load_dir_overlays_templates() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("meeting.md"), "Custom meeting {message_count}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::write(dir.path().join("empty.md"), "  ").unwrap();
        std::fs::create_dir(dir.path().join("Legal")).unwrap();
        std::fs::write(dir.path().join("Legal").join("brief.md"), "Legal brief").unwrap();

        let mut p = DefaultPromptProvider::builtin();
        let loaded = p.load_dir(dir.path()).unwrap();

        assert_eq!(loaded, 2);
        assert_eq!(p.get_category("meeting"), Some("Custom meeting {message_count}"));
        assert!(p.get_category("notes").is_none());
        assert!(p.get_category("empty").is_none());

        let lookup = p.get_prompt(&ctx().with_perspective("legal").with_summary_length("brief"));
        assert_eq!(lookup.matched.unwrap().content, "Legal brief");
    }

    #[test]
    fn load_dir_missing_directory_errors() {
        let dir = tempdir().unwrap();
        let mut p = DefaultPromptProvider::empty();
        assert!(p.load_dir(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn clear_drops_everything() {
        let mut p = DefaultPromptProvider::builtin();
        p.clear();
        assert!(p.categories().is_empty());
        assert_eq!(p.get_fallback_prompt().content, HARDCODED_FALLBACK);
    }
}

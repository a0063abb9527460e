mod builtin;
mod provider;

pub use builtin::HARDCODED_FALLBACK;
pub use provider::{DefaultLookup, DefaultPromptProvider, DefaultTemplate};

/// Perspective used when the context does not name one.
pub const DEFAULT_PERSPECTIVE: &str = "general";

/// Summary length used when the context does not name one.
pub const DEFAULT_LENGTH: &str = "detailed";

/// Flat category consulted when nothing more specific matches.
pub const DEFAULT_CATEGORY_KEY: &str = "default";

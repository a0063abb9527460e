mod custom;
mod fallback;
mod model;
mod resolver;

pub use custom::RepositoryPromptFetch;
pub use fallback::{CustomFetch, CustomOutcome, FallbackChain};
pub use model::{PromptProvenance, PromptSource, ResolvedPrompt, SchemaVersion};
pub use resolver::PromptResolver;

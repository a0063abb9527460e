pub mod cache;
pub mod config;
pub mod context;
pub mod defaults;
pub mod error;
pub mod guild;
pub mod prompt;
pub mod remote;
pub mod routing;
pub mod schema;
pub mod template;

pub use cache::{CacheStats, CachedPromptEntry, PromptCacheManager};
pub use config::{ResolverConfig, ROUTING_FILE_NAME};
pub use context::PromptContext;
pub use defaults::{DefaultLookup, DefaultPromptProvider, DefaultTemplate, HARDCODED_FALLBACK};
pub use error::{PromptError, Result};
pub use guild::{GuildConfigStore, GuildPromptConfig, InMemoryConfigStore, SyncStatus};
pub use prompt::{
    CustomFetch, CustomOutcome, FallbackChain, PromptProvenance, PromptResolver, PromptSource,
    RepositoryPromptFetch, ResolvedPrompt, SchemaVersion,
};
pub use remote::{HttpRepositoryClient, RemoteRepository, RepoCoordinates};
pub use routing::{MatchCondition, Route, RouteCandidate, RoutingFileConfig, RoutingFileParser, VariableDecl};
pub use schema::{SchemaValidator, ValidationResult};
pub use template::{substitute, Substitution};

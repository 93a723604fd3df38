pub mod cache;
pub mod extraction;
pub mod intent;
pub mod llm;
pub mod phrasing;
pub mod query;
pub mod synthesis;

pub use cache::InteractionCache;
pub use extraction::EntityExtractionService;
pub use intent::IntentClassificationService;
pub use llm::LlmClient;
pub use phrasing::PhrasingService;
pub use query::{QueryError, QueryOutcome, QueryService, ResolvedName};

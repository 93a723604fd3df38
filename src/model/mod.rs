pub mod config;
pub mod extraction;
pub mod payload;

pub use config::{Config, CorpusConfig, ProviderConfig, RetrievalConfig, TimeoutConfig};
pub use payload::{
    DrugId, DrugPair, DrugRecord, ExtractedEntity, InteractionEdge, InteractionSeverity, MatchFact,
    QueryIntent, RegulatoryChunk, ResponsePayload,
};

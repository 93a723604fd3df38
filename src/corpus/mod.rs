//! Static pharmaceutical corpus: vocabulary, interaction graph, and
//! regulatory passages.
//!
//! Everything here is loaded once at startup into an immutable
//! [`CorpusSnapshot`]. Reload builds a fresh snapshot and swaps the shared
//! handle atomically; requests in flight keep the snapshot they started with.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::model::CorpusConfig;

pub mod interactions;
pub mod loader;
pub mod snapshot;
pub mod vocabulary;

pub use interactions::InteractionIndex;
pub use snapshot::CorpusSnapshot;
pub use vocabulary::{Resolution, VocabularyIndex};

/// Integrity violations found while loading the corpus. All of these are
/// fatal at startup: the service refuses to serve from a corpus it cannot
/// trust.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CorpusError {
    #[error("Failed to read corpus file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record in {path} at line {line}: {reason}")]
    Malformed {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("Duplicate canonical drug id {id} with conflicting names ({existing} vs {incoming})")]
    DuplicateDrugId {
        id: String,
        existing: String,
        incoming: String,
    },

    #[error("Corpus vocabulary is empty after loading {path}")]
    EmptyVocabulary { path: String },
}

/// Shared handle to the current corpus snapshot.
///
/// `current()` hands out an `Arc` clone; `reload()` swaps the inner pointer
/// so readers never observe a partially loaded corpus.
#[derive(Clone)]
pub struct CorpusHandle {
    inner: Arc<RwLock<Arc<CorpusSnapshot>>>,
    /// Bumped on every successful reload. Cache keys carry this so entries
    /// derived from a replaced corpus are never served again.
    generation: Arc<AtomicU64>,
}

impl CorpusHandle {
    /// Load the corpus from disk and wrap it in a shared handle.
    pub fn load(config: &CorpusConfig) -> Result<Self, CorpusError> {
        let snapshot = loader::load_snapshot(config)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Build a handle around an already-constructed snapshot (tests).
    pub fn from_snapshot(snapshot: CorpusSnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(snapshot))),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The current snapshot. Cheap; clones an `Arc`.
    pub fn current(&self) -> Arc<CorpusSnapshot> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Generation of the current snapshot, starting at 0.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Reload from disk. On failure the previous snapshot stays in place and
    /// the generation is not bumped.
    pub fn reload(&self, config: &CorpusConfig) -> Result<(), CorpusError> {
        let snapshot = loader::load_snapshot(config)?;
        let drugs = snapshot.vocabulary.len();
        let edges = snapshot.interactions.len();

        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(snapshot);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        drop(guard);

        tracing::info!(
            drugs = drugs,
            edges = edges,
            generation = generation,
            "Corpus snapshot swapped"
        );
        Ok(())
    }
}

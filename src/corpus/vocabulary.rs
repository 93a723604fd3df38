//! Drug vocabulary index: exact and fuzzy name resolution

use std::collections::HashMap;

use strsim::jaro_winkler;

use crate::corpus::CorpusError;
use crate::model::{DrugId, DrugRecord};

/// Outcome of resolving a token against the vocabulary. `Unresolved` is a
/// normal result, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Token matched a canonical name or synonym exactly (case-insensitive)
    Exact(DrugId),
    /// Best fuzzy match at or above the acceptance threshold
    Fuzzy { id: DrugId, score: f64 },
    Unresolved,
}

/// Immutable index over all known drugs.
///
/// Lookup is exact first (lowercased canonical names and synonyms), then
/// Jaro-Winkler against every known name. Drug-name misspellings tend to
/// preserve prefixes ("asprin", "warfarine"), which is the case Jaro-Winkler
/// weights for.
#[derive(Debug, Default)]
pub struct VocabularyIndex {
    records: HashMap<DrugId, DrugRecord>,
    exact: HashMap<String, DrugId>,
    /// (lowercased name, owning id) for the fuzzy scan
    names: Vec<(String, DrugId)>,
}

impl VocabularyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a drug. Duplicate ids are an integrity violation unless the
    /// canonical name matches, in which case synonyms are merged.
    pub fn insert(&mut self, record: DrugRecord) -> Result<(), CorpusError> {
        if let Some(existing) = self.records.get_mut(&record.id) {
            if !existing.name.eq_ignore_ascii_case(&record.name) {
                return Err(CorpusError::DuplicateDrugId {
                    id: record.id.to_string(),
                    existing: existing.name.clone(),
                    incoming: record.name,
                });
            }
            for synonym in record.synonyms {
                Self::index_name(&mut self.exact, &mut self.names, &synonym, &record.id);
                if !existing
                    .synonyms
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(&synonym))
                {
                    existing.synonyms.push(synonym);
                }
            }
            return Ok(());
        }

        Self::index_name(&mut self.exact, &mut self.names, &record.name, &record.id);
        for synonym in &record.synonyms {
            Self::index_name(&mut self.exact, &mut self.names, synonym, &record.id);
        }
        self.records.insert(record.id.clone(), record);
        Ok(())
    }

    /// Add a synonym to an already-registered drug. Unknown ids are ignored
    /// with a warning; a synonyms file referencing a missing drug should not
    /// take the whole corpus down.
    pub fn add_synonym(&mut self, id: &DrugId, synonym: &str) {
        match self.records.get_mut(id) {
            Some(record) => {
                Self::index_name(&mut self.exact, &mut self.names, synonym, id);
                if !record
                    .synonyms
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(synonym))
                {
                    record.synonyms.push(synonym.to_string());
                }
            }
            None => {
                tracing::warn!(id = %id, synonym = %synonym, "Synonym for unknown drug id, skipping");
            }
        }
    }

    fn index_name(
        exact: &mut HashMap<String, DrugId>,
        names: &mut Vec<(String, DrugId)>,
        name: &str,
        id: &DrugId,
    ) {
        let key = name.trim().to_lowercase();
        if key.is_empty() {
            return;
        }
        // First registration wins; ambiguous shared synonyms keep their
        // original owner deterministically.
        exact.entry(key.clone()).or_insert_with(|| id.clone());
        names.push((key, id.clone()));
    }

    /// Resolve a token. Exact match wins outright; otherwise the best fuzzy
    /// score at or above `fuzzy_threshold` is accepted. Ties break on higher
    /// score, then shorter canonical name, then lexicographic id, so
    /// resolution is deterministic for a given vocabulary. The match may be
    /// against a synonym, but the tie-break always looks at the owning
    /// record's canonical name.
    pub fn resolve(&self, token: &str, fuzzy_threshold: f64) -> Resolution {
        let needle = token.trim().to_lowercase();
        if needle.is_empty() {
            return Resolution::Unresolved;
        }

        if let Some(id) = self.exact.get(&needle) {
            return Resolution::Exact(id.clone());
        }

        let mut best: Option<(f64, usize, &DrugId)> = None;
        for (name, id) in &self.names {
            let score = jaro_winkler(&needle, name);
            if score < fuzzy_threshold {
                continue;
            }
            let canonical_len = self
                .records
                .get(id)
                .map(|r| r.name.len())
                .unwrap_or(usize::MAX);
            let better = match best {
                None => true,
                Some((best_score, best_len, best_id)) => {
                    score > best_score
                        || (score == best_score
                            && (canonical_len < best_len
                                || (canonical_len == best_len && id < best_id)))
                }
            };
            if better {
                best = Some((score, canonical_len, id));
            }
        }

        match best {
            Some((score, _, id)) => Resolution::Fuzzy {
                id: id.clone(),
                score,
            },
            None => Resolution::Unresolved,
        }
    }

    pub fn get(&self, id: &DrugId) -> Option<&DrugRecord> {
        self.records.get(id)
    }

    /// Canonical display name for an id, falling back to the id itself.
    pub fn canonical_name(&self, id: &DrugId) -> String {
        self.records
            .get(id)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> VocabularyIndex {
        let mut index = VocabularyIndex::new();
        index
            .insert(DrugRecord {
                id: DrugId::from("DB00945"),
                name: "Aspirin".to_string(),
                synonyms: vec!["acetylsalicylic acid".to_string()],
            })
            .unwrap();
        index
            .insert(DrugRecord {
                id: DrugId::from("DB00682"),
                name: "Warfarin".to_string(),
                synonyms: vec![],
            })
            .unwrap();
        index
            .insert(DrugRecord {
                id: DrugId::from("DB00316"),
                name: "Acetaminophen".to_string(),
                synonyms: vec!["paracetamol".to_string(), "Tylenol".to_string()],
            })
            .unwrap();
        index
    }

    #[test]
    fn test_exact_resolution_is_case_insensitive() {
        let index = vocab();
        assert_eq!(
            index.resolve("ASPIRIN", 0.84),
            Resolution::Exact(DrugId::from("DB00945"))
        );
        assert_eq!(
            index.resolve("tylenol", 0.84),
            Resolution::Exact(DrugId::from("DB00316"))
        );
    }

    #[test]
    fn test_misspelling_resolves_fuzzily() {
        let index = vocab();
        match index.resolve("asprin", 0.84) {
            Resolution::Fuzzy { id, score } => {
                assert_eq!(id, DrugId::from("DB00945"));
                assert!(score >= 0.84);
            }
            other => panic!("expected fuzzy match, got {:?}", other),
        }
    }

    #[test]
    fn test_unrelated_token_stays_unresolved() {
        let index = vocab();
        assert_eq!(index.resolve("breakfast", 0.84), Resolution::Unresolved);
        assert_eq!(index.resolve("", 0.84), Resolution::Unresolved);
    }

    #[test]
    fn test_fuzzy_tie_breaks_on_canonical_name_not_matched_synonym() {
        // Both drugs carry the same synonym, so a misspelling of it scores
        // identically for both. The shorter canonical name must win even
        // though its id sorts later.
        let mut index = VocabularyIndex::new();
        index
            .insert(DrugRecord {
                id: DrugId::from("DB0001"),
                name: "Extremelylongcanonicalname".to_string(),
                synonyms: vec!["tramadol".to_string()],
            })
            .unwrap();
        index
            .insert(DrugRecord {
                id: DrugId::from("DB0002"),
                name: "Zed".to_string(),
                synonyms: vec!["tramadol".to_string()],
            })
            .unwrap();

        match index.resolve("tramadl", 0.84) {
            Resolution::Fuzzy { id, .. } => assert_eq!(id, DrugId::from("DB0002")),
            other => panic!("expected fuzzy match, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_id_with_conflicting_name_is_rejected() {
        let mut index = vocab();
        let err = index.insert(DrugRecord {
            id: DrugId::from("DB00945"),
            name: "Ibuprofen".to_string(),
            synonyms: vec![],
        });
        assert!(matches!(err, Err(CorpusError::DuplicateDrugId { .. })));
    }

    #[test]
    fn test_duplicate_id_with_same_name_merges_synonyms() {
        let mut index = vocab();
        index
            .insert(DrugRecord {
                id: DrugId::from("DB00945"),
                name: "aspirin".to_string(),
                synonyms: vec!["ASA".to_string()],
            })
            .unwrap();
        assert_eq!(
            index.resolve("asa", 0.84),
            Resolution::Exact(DrugId::from("DB00945"))
        );
    }
}

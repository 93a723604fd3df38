//! Drug mention extraction
//!
//! Candidate spans come from three sources: greedy longest-match n-grams
//! resolved against the vocabulary, single tokens that look pharmaceutical
//! (known suffix or mid-sentence capitalization), and an optional LLM
//! recognizer. Extraction never fails; an empty query yields an empty list
//! and LLM errors are logged and ignored.

use regex::Regex;
use rig::client::CompletionClient;
use rig::providers::openai;

use crate::corpus::{CorpusHandle, Resolution};
use crate::model::extraction::ExtractedDrugList;
use crate::model::{DrugId, ExtractedEntity};
use crate::service::extraction::prompts::{NER_SYSTEM_PROMPT, build_ner_prompt};
use crate::service::llm::LlmClient;

pub mod prompts;

/// Environment variable for the recognizer model
const ENV_NER_MODEL: &str = "NER_MODEL";

const DEFAULT_MODEL: &str = openai::GPT_4O_MINI;

/// Longest n-gram tried against the vocabulary
const MAX_NGRAM: usize = 3;

/// Confidence assigned to mentions that look like drugs but resolve nowhere
const UNRESOLVED_CONFIDENCE: f64 = 0.3;

/// Confidence assigned to LLM-recognized mentions that resolve exactly
const LLM_EXACT_CONFIDENCE: f64 = 0.9;

/// Single-token suffixes common to drug names
const DRUG_SUFFIXES: &[&str] = &[
    "in", "ol", "ine", "azole", "statin", "mab", "cillin", "mycin", "pril", "sartan", "oxetine",
    "azepam", "profen",
];

/// Query vocabulary that must never become a drug candidate
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "any", "are", "can", "could", "do", "does", "for", "from", "have", "how",
    "i", "if", "in", "is", "it", "me", "my", "of", "on", "or", "safe", "should", "similar",
    "take", "taking", "tell", "the", "there", "to", "together", "use", "using", "what", "when",
    "which", "while", "will", "with", "you",
];

struct Candidate {
    text: String,
    offset: usize,
}

/// Extracts and resolves drug mentions from free text.
pub struct EntityExtractionService {
    corpus: CorpusHandle,
    fuzzy_threshold: f64,
    token_pattern: Regex,
    llm: Option<LlmClient>,
    model: String,
}

impl EntityExtractionService {
    pub fn new(corpus: CorpusHandle, fuzzy_threshold: f64, llm: Option<LlmClient>) -> Self {
        let model = std::env::var(ENV_NER_MODEL).unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Self {
            corpus,
            fuzzy_threshold,
            // Word characters plus the hyphens and apostrophes drug names carry
            token_pattern: Regex::new(r"[A-Za-z][A-Za-z0-9'\-]*").expect("token pattern is valid"),
            llm,
            model,
        }
    }

    /// Extract drug mentions ordered by first occurrence, deduplicated by
    /// canonical id keeping the highest-confidence occurrence.
    pub async fn extract(&self, text: &str) -> Vec<ExtractedEntity> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let snapshot = self.corpus.current();
        let tokens: Vec<(String, usize)> = self
            .token_pattern
            .find_iter(text)
            .map(|m| (m.as_str().to_string(), m.start()))
            .collect();

        let mut entities: Vec<ExtractedEntity> = Vec::new();
        let mut consumed = vec![false; tokens.len()];

        // Greedy longest-match n-grams against the vocabulary
        let mut i = 0;
        while i < tokens.len() {
            let mut matched_len = 0;
            for n in (1..=MAX_NGRAM.min(tokens.len() - i)).rev() {
                let span: Vec<&str> = tokens[i..i + n].iter().map(|(t, _)| t.as_str()).collect();
                let phrase = span.join(" ");
                if n == 1 && is_stopword(&phrase) {
                    continue;
                }
                let resolution = if n == 1 && phrase.len() >= 4 {
                    snapshot.vocabulary.resolve(&phrase, self.fuzzy_threshold)
                } else {
                    // Multi-token and short spans must match exactly
                    match snapshot.vocabulary.resolve(&phrase, 1.0) {
                        Resolution::Exact(id) => Resolution::Exact(id),
                        _ => Resolution::Unresolved,
                    }
                };

                match resolution {
                    Resolution::Exact(id) => {
                        entities.push(self.resolved_entity(&snapshot, phrase, tokens[i].1, id, 1.0));
                        matched_len = n;
                        break;
                    }
                    Resolution::Fuzzy { id, score } => {
                        entities.push(self.resolved_entity(
                            &snapshot,
                            phrase,
                            tokens[i].1,
                            id,
                            score,
                        ));
                        matched_len = n;
                        break;
                    }
                    Resolution::Unresolved => {}
                }
            }

            if matched_len > 0 {
                for slot in consumed.iter_mut().skip(i).take(matched_len) {
                    *slot = true;
                }
                i += matched_len;
            } else {
                i += 1;
            }
        }

        // Tokens that look pharmaceutical but resolved nowhere are still
        // surfaced, so the payload can report them as unresolved.
        for (idx, (token, offset)) in tokens.iter().enumerate() {
            if consumed[idx] || is_stopword(token) {
                continue;
            }
            if looks_like_drug(token, *offset) {
                entities.push(ExtractedEntity {
                    text: token.clone(),
                    offset: *offset,
                    resolved: None,
                    canonical_name: None,
                    confidence: UNRESOLVED_CONFIDENCE,
                });
            }
        }

        // Optional LLM recognizer for mentions the heuristics miss
        if let Some(names) = self.recognize_with_llm(text).await {
            for name in names {
                let resolution = snapshot.vocabulary.resolve(&name, self.fuzzy_threshold);
                let offset = find_offset(text, &name);
                match resolution {
                    Resolution::Exact(id) => entities.push(self.resolved_entity(
                        &snapshot,
                        name,
                        offset,
                        id,
                        LLM_EXACT_CONFIDENCE,
                    )),
                    Resolution::Fuzzy { id, score } => {
                        entities.push(self.resolved_entity(&snapshot, name, offset, id, score))
                    }
                    Resolution::Unresolved => entities.push(ExtractedEntity {
                        text: name,
                        offset,
                        resolved: None,
                        canonical_name: None,
                        confidence: UNRESOLVED_CONFIDENCE,
                    }),
                }
            }
        }

        dedupe(entities)
    }

    fn resolved_entity(
        &self,
        snapshot: &crate::corpus::CorpusSnapshot,
        text: String,
        offset: usize,
        id: DrugId,
        confidence: f64,
    ) -> ExtractedEntity {
        let canonical_name = Some(snapshot.vocabulary.canonical_name(&id));
        ExtractedEntity {
            text,
            offset,
            resolved: Some(id),
            canonical_name,
            confidence,
        }
    }

    async fn recognize_with_llm(&self, text: &str) -> Option<Vec<String>> {
        let llm = self.llm.as_ref()?;

        let extractor = llm
            .openai_client()
            .extractor::<ExtractedDrugList>(&self.model)
            .preamble(NER_SYSTEM_PROMPT)
            .build();

        match extractor.extract(&build_ner_prompt(text)).await {
            Ok(list) => {
                tracing::debug!(count = list.drugs.len(), "LLM drug recognition completed");
                Some(list.drugs)
            }
            Err(e) => {
                tracing::warn!(error = %e, "LLM drug recognition failed, continuing with heuristics");
                None
            }
        }
    }
}

fn is_stopword(token: &str) -> bool {
    let lower = token.to_lowercase();
    STOPWORDS.contains(&lower.as_str())
}

/// A token is a drug candidate when it carries a known pharmaceutical suffix
/// or is capitalized away from the start of the text.
fn looks_like_drug(token: &str, offset: usize) -> bool {
    if token.len() < 4 {
        return false;
    }
    let lower = token.to_lowercase();
    if DRUG_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        return true;
    }
    offset > 0 && token.chars().next().is_some_and(|c| c.is_uppercase())
}

fn find_offset(text: &str, name: &str) -> usize {
    text.to_lowercase()
        .find(&name.to_lowercase())
        .unwrap_or(text.len())
}

/// Order by first occurrence; collapse duplicates (same canonical id, or same
/// lowercased text when unresolved) keeping the highest confidence.
fn dedupe(mut entities: Vec<ExtractedEntity>) -> Vec<ExtractedEntity> {
    entities.sort_by_key(|e| e.offset);

    let mut out: Vec<ExtractedEntity> = Vec::new();
    for entity in entities {
        let existing = out.iter_mut().find(|e| match (&e.resolved, &entity.resolved) {
            (Some(a), Some(b)) => a == b,
            (None, None) => e.text.eq_ignore_ascii_case(&entity.text),
            _ => false,
        });
        match existing {
            Some(e) => {
                if entity.confidence > e.confidence {
                    e.confidence = entity.confidence;
                    e.text = entity.text;
                }
            }
            None => out.push(entity),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{CorpusSnapshot, VocabularyIndex};
    use crate::model::DrugRecord;

    fn service() -> EntityExtractionService {
        let mut vocabulary = VocabularyIndex::new();
        for (id, name, synonyms) in [
            ("DB00945", "Aspirin", vec!["acetylsalicylic acid"]),
            ("DB00682", "Warfarin", vec![]),
            ("DB00316", "Acetaminophen", vec!["paracetamol", "Tylenol"]),
        ] {
            vocabulary
                .insert(DrugRecord {
                    id: DrugId::from(id),
                    name: name.to_string(),
                    synonyms: synonyms.into_iter().map(String::from).collect(),
                })
                .unwrap();
        }
        let snapshot = CorpusSnapshot {
            vocabulary,
            ..Default::default()
        };
        EntityExtractionService::new(CorpusHandle::from_snapshot(snapshot), 0.84, None)
    }

    #[tokio::test]
    async fn test_extracts_two_drugs_in_mention_order() {
        let service = service();
        let entities = service.extract("Can I take aspirin with warfarin?").await;

        let resolved: Vec<_> = entities
            .iter()
            .filter_map(|e| e.canonical_name.as_deref())
            .collect();
        assert_eq!(resolved, vec!["Aspirin", "Warfarin"]);
    }

    #[tokio::test]
    async fn test_multi_token_synonym_resolves() {
        let service = service();
        let entities = service
            .extract("Is acetylsalicylic acid safe with Tylenol?")
            .await;

        let ids: Vec<_> = entities.iter().filter_map(|e| e.resolved.clone()).collect();
        assert!(ids.contains(&DrugId::from("DB00945")));
        assert!(ids.contains(&DrugId::from("DB00316")));
    }

    #[tokio::test]
    async fn test_misspelling_resolves_with_lower_confidence() {
        let service = service();
        let entities = service.extract("can i take asprin daily").await;

        let aspirin = entities
            .iter()
            .find(|e| e.resolved == Some(DrugId::from("DB00945")))
            .expect("misspelling should resolve");
        assert!(aspirin.confidence < 1.0);
        assert!(aspirin.confidence >= 0.84);
    }

    #[tokio::test]
    async fn test_unknown_druglike_token_is_surfaced_unresolved() {
        let service = service();
        let entities = service.extract("can i take xanadrol with aspirin").await;

        let unresolved: Vec<_> = entities.iter().filter(|e| !e.is_resolved()).collect();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].text, "xanadrol");
    }

    #[tokio::test]
    async fn test_empty_input_yields_empty_list() {
        let service = service();
        assert!(service.extract("").await.is_empty());
        assert!(service.extract("   ").await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_mentions_collapse() {
        let service = service();
        let entities = service.extract("aspirin and more aspirin and Aspirin").await;
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].resolved, Some(DrugId::from("DB00945")));
    }

    #[tokio::test]
    async fn test_query_words_are_never_candidates() {
        let service = service();
        let entities = service.extract("what should i take for a headache").await;
        assert!(entities.iter().all(|e| !e.is_resolved()));
        // "take" and friends are stopworded; "headache" has no drug shape
        assert!(entities.is_empty());
    }
}

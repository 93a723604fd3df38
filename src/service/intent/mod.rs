//! Query intent classification
//!
//! Lexical cues decide first; an optional LLM fallback handles queries with
//! no lexical signal. Safety-first override: two or more resolved drugs plus
//! any interaction cue or connecting word always classify as
//! `check_interaction`, whatever weaker signals (or the LLM) say.

use rig::client::CompletionClient;
use rig::providers::openai;

use crate::model::extraction::ExtractedIntent;
use crate::model::{ExtractedEntity, QueryIntent};
use crate::service::intent::prompts::{INTENT_SYSTEM_PROMPT, build_intent_prompt};
use crate::service::llm::LlmClient;

pub mod prompts;

/// Environment variable for the fallback classifier model
const ENV_INTENT_MODEL: &str = "INTENT_MODEL";

const DEFAULT_MODEL: &str = openai::GPT_4O_MINI;

const INTERACTION_CUES: &[&str] = &[
    "can i take",
    "safe to take",
    "safe to combine",
    "take with",
    "taken with",
    "take together",
    "combine with",
    "combined with",
    "mix with",
    "mixing",
    "interaction",
    "interact",
    "contraindicated",
];

/// Weak connectors that mark an interaction question when two or more drugs
/// are present
const CONNECTING_WORDS: &[&str] = &[" with ", " and ", " together"];

const SIMILARITY_CUES: &[&str] = &[
    "similar to",
    "alternative to",
    "alternatives to",
    "substitute for",
    "substitutes for",
    "instead of",
    "replace",
    "replacement for",
    "equivalent",
];

const LEGAL_CUES: &[&str] = &[
    "legal",
    "law",
    "act",
    "regulation",
    "regulatory",
    "section",
    "penalty",
    "punishment",
    "license",
    "licence",
    "prohibited",
    "banned",
];

const CUE_CONFIDENCE: f64 = 0.9;
const OVERRIDE_CONFIDENCE: f64 = 0.95;
/// Two resolved drugs with no explicit cue still default to an interaction
/// check, at lower confidence
const IMPLICIT_PAIR_CONFIDENCE: f64 = 0.75;

/// Classifies queries, preferring deterministic lexical rules.
pub struct IntentClassificationService {
    confidence_threshold: f64,
    llm: Option<LlmClient>,
    model: String,
}

impl IntentClassificationService {
    pub fn new(confidence_threshold: f64, llm: Option<LlmClient>) -> Self {
        let model = std::env::var(ENV_INTENT_MODEL).unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Self {
            confidence_threshold,
            llm,
            model,
        }
    }

    /// Classify a query. Total: always returns an intent, falling back to
    /// `general_query` when nothing clears the confidence threshold.
    pub async fn classify(
        &self,
        text: &str,
        entities: &[ExtractedEntity],
    ) -> (QueryIntent, f64) {
        let lower = text.to_lowercase();
        let resolved_count = entities.iter().filter(|e| e.is_resolved()).count();

        let interaction_cue = INTERACTION_CUES.iter().any(|c| lower.contains(c));
        let connecting_word = CONNECTING_WORDS.iter().any(|c| lower.contains(c));

        // Safety-first: a multi-drug query with any interaction signal is an
        // interaction check, no matter what else matches.
        if resolved_count >= 2 && (interaction_cue || connecting_word) {
            return (QueryIntent::CheckInteraction, OVERRIDE_CONFIDENCE);
        }

        if SIMILARITY_CUES.iter().any(|c| lower.contains(c)) {
            return (QueryIntent::FindSimilar, CUE_CONFIDENCE);
        }

        // Legal cues are single words; match on word boundaries so "act"
        // never fires inside "interaction".
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        if LEGAL_CUES.iter().any(|c| words.contains(c)) {
            return (QueryIntent::LegalQuery, CUE_CONFIDENCE);
        }

        if interaction_cue {
            return (QueryIntent::CheckInteraction, CUE_CONFIDENCE);
        }

        if resolved_count >= 2 {
            return (QueryIntent::CheckInteraction, IMPLICIT_PAIR_CONFIDENCE);
        }

        // No lexical signal; ask the LLM if one is configured
        if let Some((intent, confidence)) = self.classify_with_llm(text).await {
            // The override above already ran; the LLM cannot promote a
            // single-drug query into an interaction check with high stakes,
            // but its label stands if confident enough.
            if confidence >= self.confidence_threshold {
                return (intent, confidence);
            }
        }

        (QueryIntent::GeneralQuery, self.confidence_threshold)
    }

    async fn classify_with_llm(&self, text: &str) -> Option<(QueryIntent, f64)> {
        let llm = self.llm.as_ref()?;

        let extractor = llm
            .openai_client()
            .extractor::<ExtractedIntent>(&self.model)
            .preamble(INTENT_SYSTEM_PROMPT)
            .build();

        match extractor.extract(&build_intent_prompt(text)).await {
            Ok(extracted) => {
                let intent = match extracted.intent.as_str() {
                    "check_interaction" => QueryIntent::CheckInteraction,
                    "find_similar" => QueryIntent::FindSimilar,
                    "legal_query" => QueryIntent::LegalQuery,
                    _ => QueryIntent::GeneralQuery,
                };
                let confidence = extracted.confidence.clamp(0.0, 1.0);
                tracing::debug!(intent = %intent, confidence = confidence, "LLM intent classification completed");
                Some((intent, confidence))
            }
            Err(e) => {
                tracing::warn!(error = %e, "LLM intent classification failed, defaulting to general_query");
                None
            }
        }
    }
}

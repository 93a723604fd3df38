//! Natural-language phrasing of finalized payloads
//!
//! Strictly one-way: the payload is assembled and validated before this
//! service sees it, and the generated text is carried next to the payload,
//! never merged back into it. A phrasing failure costs only the prose.

use rig::client::CompletionClient;
use rig::providers::openai;

use crate::model::extraction::PhrasedAnswer;
use crate::model::{MatchFact, QueryIntent, ResponsePayload};
use crate::service::llm::LlmClient;

/// Environment variable for the phrasing model
const ENV_PHRASING_MODEL: &str = "PHRASING_MODEL";

const DEFAULT_MODEL: &str = openai::GPT_4O_MINI;

const PHRASING_SYSTEM_PROMPT: &str = r#"You are a careful pharmaceutical information assistant.

You will receive structured facts about a drug query. Write a clear,
user-facing answer.

You must:
- State only the facts provided, including severity labels verbatim
- Restate the provided safety disclaimer at the end of your answer
- Say explicitly when a drug combination has no recorded data
- Keep the answer short and plain

Do not:
- Add facts, severities, drugs, or recommendations not in the input
- Soften or omit warnings
- Offer diagnosis or personal medical advice

Your output must be structured JSON only and conform to the requested schema."#;

/// Phrases finalized payloads into user-facing text.
pub struct PhrasingService {
    llm: LlmClient,
    model: String,
}

impl PhrasingService {
    /// Uses a shared LLM client passed from startup.
    /// Optionally uses PHRASING_MODEL env var (defaults to gpt-4o-mini)
    pub fn new(llm: LlmClient) -> Self {
        let model = std::env::var(ENV_PHRASING_MODEL).unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        tracing::info!(model = %model, "Phrasing service initialized");

        Self { llm, model }
    }

    /// Phrase a payload. Errors are returned as strings; the caller treats
    /// any failure as "no answer", never as a degraded payload.
    pub async fn phrase(&self, payload: &ResponsePayload) -> Result<String, String> {
        let start_time = std::time::Instant::now();
        let prompt = build_phrasing_prompt(payload);
        let prompt_length = prompt.len();

        tracing::debug!(
            intent = %payload.intent,
            model = %self.model,
            "Initiating OpenAI API call for answer phrasing"
        );

        let extractor = self
            .llm
            .openai_client()
            .extractor::<PhrasedAnswer>(&self.model)
            .preamble(PHRASING_SYSTEM_PROMPT)
            .build();

        match extractor.extract(&prompt).await {
            Ok(answer) => {
                let elapsed = start_time.elapsed();
                tracing::info!(
                    intent = %payload.intent,
                    model = %self.model,
                    elapsed_ms = elapsed.as_millis(),
                    prompt_length = prompt_length,
                    disclaimer_included = answer.disclaimer_included,
                    "OpenAI API call for answer phrasing completed successfully"
                );
                if answer.response.trim().is_empty() {
                    return Err("phrasing returned an empty response".to_string());
                }
                Ok(answer.response)
            }
            Err(e) => {
                let elapsed = start_time.elapsed();
                tracing::error!(
                    intent = %payload.intent,
                    model = %self.model,
                    elapsed_ms = elapsed.as_millis(),
                    prompt_length = prompt_length,
                    error = %e,
                    "OpenAI API call for answer phrasing failed"
                );
                Err(e.to_string())
            }
        }
    }
}

/// Render the payload's facts as prompt context.
fn build_phrasing_prompt(payload: &ResponsePayload) -> String {
    let mut sections = Vec::new();

    sections.push(format!("Query intent: {}", payload.intent));

    if !payload.entities.is_empty() {
        sections.push(format!("Drugs identified: {}", payload.entities.join(", ")));
    }
    if !payload.unresolved_entities.is_empty() {
        sections.push(format!(
            "Mentions that could not be matched to a known drug: {}",
            payload.unresolved_entities.join(", ")
        ));
    }
    if let Some(severity) = payload.severity {
        sections.push(format!("Overall severity: {}", severity));
    }
    if payload.degraded {
        sections.push(
            "Some data sources were unavailable; facts below are partial.".to_string(),
        );
    }

    match payload.intent {
        QueryIntent::CheckInteraction => {
            for fact in &payload.matches {
                if let MatchFact::Interaction {
                    drug_a,
                    drug_b,
                    severity,
                    mechanism,
                    recorded,
                } = fact
                {
                    let detail = if *recorded {
                        mechanism.clone().unwrap_or_default()
                    } else {
                        "no recorded data for this combination".to_string()
                    };
                    sections.push(format!("- {} + {}: {} ({})", drug_a, drug_b, severity, detail));
                }
            }
        }
        QueryIntent::FindSimilar => {
            for fact in &payload.matches {
                if let MatchFact::SimilarDrug { name, score, .. } = fact {
                    sections.push(format!("- {} (similarity {:.2})", name, score));
                }
            }
        }
        QueryIntent::LegalQuery => {
            for fact in &payload.matches {
                if let MatchFact::Passage { citation, text, .. } = fact {
                    sections.push(format!("- [{}] {}", citation, text));
                }
            }
        }
        QueryIntent::GeneralQuery => {}
    }

    sections.push(format!("Safety disclaimer to restate: {}", payload.disclaimer));

    sections.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InteractionSeverity;

    #[test]
    fn test_prompt_includes_facts_and_disclaimer() {
        let payload = ResponsePayload {
            intent: QueryIntent::CheckInteraction,
            severity: Some(InteractionSeverity::MajorInteraction),
            matches: vec![MatchFact::Interaction {
                drug_a: "Aspirin".to_string(),
                drug_b: "Warfarin".to_string(),
                severity: InteractionSeverity::MajorInteraction,
                mechanism: Some("Increased risk of bleeding".to_string()),
                recorded: true,
            }],
            entities: vec!["Aspirin".to_string(), "Warfarin".to_string()],
            unresolved_entities: vec![],
            disclaimer: "WARNING: not medical advice.".to_string(),
            degraded: false,
        };

        let prompt = build_phrasing_prompt(&payload);
        assert!(prompt.contains("MAJOR_INTERACTION"));
        assert!(prompt.contains("Increased risk of bleeding"));
        assert!(prompt.contains("WARNING: not medical advice."));
    }

    #[test]
    fn test_prompt_marks_unrecorded_pairs() {
        let payload = ResponsePayload {
            intent: QueryIntent::CheckInteraction,
            severity: Some(InteractionSeverity::Safe),
            matches: vec![MatchFact::Interaction {
                drug_a: "Aspirin".to_string(),
                drug_b: "Lisinopril".to_string(),
                severity: InteractionSeverity::Safe,
                mechanism: None,
                recorded: false,
            }],
            entities: vec!["Aspirin".to_string(), "Lisinopril".to_string()],
            unresolved_entities: vec![],
            disclaimer: "Not medical advice.".to_string(),
            degraded: false,
        };

        let prompt = build_phrasing_prompt(&payload);
        assert!(prompt.contains("no recorded data"));
    }
}

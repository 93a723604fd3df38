//! Deterministic response payload assembly
//!
//! Pure functions of their inputs: no clocks, no randomness, no I/O.
//! Identical retrieval results synthesize byte-identical payloads.

use std::collections::HashMap;

use crate::corpus::interactions::{aggregate_severity, all_pairs};
use crate::model::{
    DrugId, ExtractedEntity, InteractionEdge, InteractionSeverity, MatchFact, QueryIntent,
    ResponsePayload,
};
use crate::provider::{PassageHit, SimilarDrug};

pub mod disclaimers;
pub mod validation;

pub use validation::{ValidationError, validate_payload};

/// Retrieval results handed to the synthesizer, shaped by intent.
#[derive(Debug, Default)]
pub struct Retrieved {
    pub edges: Vec<InteractionEdge>,
    pub similar: Vec<SimilarDrug>,
    pub passages: Vec<PassageHit>,
}

/// Assemble the payload for a completed (non-degraded) request.
pub fn synthesize(
    intent: QueryIntent,
    entities: &[ExtractedEntity],
    retrieved: &Retrieved,
) -> ResponsePayload {
    let (entity_names, unresolved) = split_entities(entities);

    match intent {
        QueryIntent::CheckInteraction => {
            synthesize_interactions(entities, &retrieved.edges, entity_names, unresolved)
        }
        QueryIntent::FindSimilar => ResponsePayload {
            intent,
            severity: None,
            matches: retrieved
                .similar
                .iter()
                .map(|hit| MatchFact::SimilarDrug {
                    id: hit.id.clone(),
                    name: hit.name.clone(),
                    score: hit.score,
                })
                .collect(),
            entities: entity_names,
            unresolved_entities: unresolved,
            disclaimer: disclaimers::DISCLAIMER_ALTERNATIVES.to_string(),
            degraded: false,
        },
        QueryIntent::LegalQuery => ResponsePayload {
            intent,
            severity: None,
            matches: retrieved
                .passages
                .iter()
                .map(|hit| MatchFact::Passage {
                    citation: hit.chunk.citation.clone(),
                    text: hit.chunk.text.clone(),
                    score: hit.score,
                })
                .collect(),
            entities: entity_names,
            unresolved_entities: unresolved,
            disclaimer: disclaimers::DISCLAIMER_LEGAL.to_string(),
            degraded: false,
        },
        QueryIntent::GeneralQuery => ResponsePayload {
            intent,
            severity: None,
            matches: vec![],
            entities: entity_names,
            unresolved_entities: unresolved,
            disclaimer: disclaimers::DISCLAIMER_GENERIC.to_string(),
            degraded: false,
        },
    }
}

/// Assemble a degraded payload: partial information, explicit flag, no
/// fabricated severity.
pub fn synthesize_degraded(intent: QueryIntent, entities: &[ExtractedEntity]) -> ResponsePayload {
    let (entity_names, unresolved) = split_entities(entities);

    ResponsePayload {
        intent,
        severity: None,
        matches: vec![],
        entities: entity_names,
        unresolved_entities: unresolved,
        disclaimer: disclaimers::DISCLAIMER_DEGRADED.to_string(),
        degraded: true,
    }
}

fn synthesize_interactions(
    entities: &[ExtractedEntity],
    edges: &[InteractionEdge],
    entity_names: Vec<String>,
    unresolved: Vec<String>,
) -> ResponsePayload {
    let ids: Vec<DrugId> = entities.iter().filter_map(|e| e.resolved.clone()).collect();

    let names: HashMap<&DrugId, &str> = entities
        .iter()
        .filter_map(|e| {
            e.resolved
                .as_ref()
                .zip(e.canonical_name.as_deref())
        })
        .collect();

    let edge_index: HashMap<_, _> = edges.iter().map(|e| (&e.pair, e)).collect();

    let pairs = all_pairs(&ids);
    let no_pair_checked = pairs.is_empty();

    let mut matches = Vec::new();
    let mut has_unrecorded = false;

    // Every queried pair appears, recorded or not. An absent edge is
    // reported as SAFE with recorded: false, which the disclaimer
    // distinguishes from confirmed safety.
    for pair in pairs {
        let name_of = |id: &DrugId| {
            names
                .get(id)
                .map(|n| n.to_string())
                .unwrap_or_else(|| id.to_string())
        };

        match edge_index.get(&pair) {
            Some(edge) => matches.push(MatchFact::Interaction {
                drug_a: name_of(pair.first()),
                drug_b: name_of(pair.second()),
                severity: edge.severity,
                mechanism: Some(edge.mechanism.clone()),
                recorded: true,
            }),
            None => {
                has_unrecorded = true;
                matches.push(MatchFact::Interaction {
                    drug_a: name_of(pair.first()),
                    drug_b: name_of(pair.second()),
                    severity: InteractionSeverity::Safe,
                    mechanism: None,
                    recorded: false,
                });
            }
        }
    }

    let severity = aggregate_severity(edges);

    // Any gap in coverage gets the absence-of-data clause: an unrecorded
    // pair, an unresolved mention, or too few resolved drugs to form a pair
    // at all. A payload that checked nothing must not read as confirmed safe.
    let data_gap = has_unrecorded || no_pair_checked || !unresolved.is_empty();

    ResponsePayload {
        intent: QueryIntent::CheckInteraction,
        severity: Some(severity),
        matches,
        entities: entity_names,
        unresolved_entities: unresolved,
        disclaimer: disclaimers::interaction_disclaimer(severity, data_gap),
        degraded: false,
    }
}

/// Canonical names of resolved entities in mention order, and the raw text of
/// unresolved mentions.
fn split_entities(entities: &[ExtractedEntity]) -> (Vec<String>, Vec<String>) {
    let resolved = entities
        .iter()
        .filter_map(|e| e.canonical_name.clone())
        .collect();
    let unresolved = entities
        .iter()
        .filter(|e| !e.is_resolved())
        .map(|e| e.text.clone())
        .collect();
    (resolved, unresolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DrugPair;

    fn entity(name: &str, id: &str, offset: usize) -> ExtractedEntity {
        ExtractedEntity {
            text: name.to_lowercase(),
            offset,
            resolved: Some(DrugId::from(id)),
            canonical_name: Some(name.to_string()),
            confidence: 1.0,
        }
    }

    fn unresolved_entity(text: &str, offset: usize) -> ExtractedEntity {
        ExtractedEntity {
            text: text.to_string(),
            offset,
            resolved: None,
            canonical_name: None,
            confidence: 0.3,
        }
    }

    fn major_edge() -> InteractionEdge {
        InteractionEdge {
            pair: DrugPair::new(DrugId::from("DB00945"), DrugId::from("DB00682")),
            severity: InteractionSeverity::MajorInteraction,
            mechanism: "Increased risk of bleeding".to_string(),
        }
    }

    #[test]
    fn test_recorded_major_interaction() {
        let entities = vec![entity("Aspirin", "DB00945", 0), entity("Warfarin", "DB00682", 20)];
        let retrieved = Retrieved {
            edges: vec![major_edge()],
            ..Default::default()
        };

        let payload = synthesize(QueryIntent::CheckInteraction, &entities, &retrieved);

        assert_eq!(payload.severity, Some(InteractionSeverity::MajorInteraction));
        assert_eq!(payload.matches.len(), 1);
        assert!(matches!(
            &payload.matches[0],
            MatchFact::Interaction { recorded: true, .. }
        ));
        assert!(payload.disclaimer.contains("WARNING"));
        assert!(!payload.degraded);
        validate_payload(&payload).unwrap();
    }

    #[test]
    fn test_unrecorded_pair_is_listed_not_omitted() {
        let entities = vec![entity("Aspirin", "DB00945", 0), entity("Lisinopril", "DB00722", 20)];
        let retrieved = Retrieved::default();

        let payload = synthesize(QueryIntent::CheckInteraction, &entities, &retrieved);

        assert_eq!(payload.severity, Some(InteractionSeverity::Safe));
        assert_eq!(payload.matches.len(), 1);
        match &payload.matches[0] {
            MatchFact::Interaction { recorded, severity, mechanism, .. } => {
                assert!(!recorded);
                assert_eq!(*severity, InteractionSeverity::Safe);
                assert!(mechanism.is_none());
            }
            other => panic!("unexpected fact {:?}", other),
        }
        // No-data wording distinguishes this from confirmed safety
        assert!(payload.disclaimer.contains("not proof of safety"));
        validate_payload(&payload).unwrap();
    }

    #[test]
    fn test_unresolved_partner_never_reads_as_confirmed_safe() {
        // "can i take aspirin with xanadrol": one drug resolves, the other
        // does not, so no pair was actually checked
        let entities = vec![entity("Aspirin", "DB00945", 0), unresolved_entity("xanadrol", 20)];

        let payload =
            synthesize(QueryIntent::CheckInteraction, &entities, &Retrieved::default());

        assert_eq!(payload.unresolved_entities, vec!["xanadrol"]);
        assert!(payload.matches.is_empty());
        assert!(payload.disclaimer.contains("not proof of safety"));
        validate_payload(&payload).unwrap();
    }

    #[test]
    fn test_single_drug_check_carries_no_data_clause() {
        let entities = vec![entity("Aspirin", "DB00945", 0)];

        let payload =
            synthesize(QueryIntent::CheckInteraction, &entities, &Retrieved::default());

        assert!(payload.matches.is_empty());
        assert!(payload.disclaimer.contains("not proof of safety"));
    }

    #[test]
    fn test_synthesis_is_byte_idempotent() {
        let entities = vec![entity("Aspirin", "DB00945", 0), entity("Warfarin", "DB00682", 20)];
        let retrieved = Retrieved {
            edges: vec![major_edge()],
            ..Default::default()
        };

        let first = synthesize(QueryIntent::CheckInteraction, &entities, &retrieved);
        let second = synthesize(QueryIntent::CheckInteraction, &entities, &retrieved);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn test_three_drugs_enumerate_three_pairs() {
        let entities = vec![
            entity("Aspirin", "DB00945", 0),
            entity("Warfarin", "DB00682", 10),
            entity("Acetaminophen", "DB00316", 20),
        ];
        let retrieved = Retrieved {
            edges: vec![major_edge()],
            ..Default::default()
        };

        let payload = synthesize(QueryIntent::CheckInteraction, &entities, &retrieved);

        assert_eq!(payload.matches.len(), 3);
        assert_eq!(payload.severity, Some(InteractionSeverity::MajorInteraction));
        assert!(payload.disclaimer.contains("not proof of safety"));
    }

    #[test]
    fn test_similar_payload_carries_scores_and_no_severity() {
        let entities = vec![entity("Aspirin", "DB00945", 0)];
        let retrieved = Retrieved {
            similar: vec![SimilarDrug {
                id: DrugId::from("DB01050"),
                name: "Ibuprofen".to_string(),
                score: 0.82,
            }],
            ..Default::default()
        };

        let payload = synthesize(QueryIntent::FindSimilar, &entities, &retrieved);

        assert!(payload.severity.is_none());
        assert_eq!(payload.matches.len(), 1);
        assert!(!payload.disclaimer.is_empty());
        validate_payload(&payload).unwrap();
    }

    #[test]
    fn test_degraded_payload_has_flag_and_disclaimer_but_no_severity() {
        let entities = vec![entity("Aspirin", "DB00945", 0), entity("Warfarin", "DB00682", 20)];

        let payload = synthesize_degraded(QueryIntent::CheckInteraction, &entities);

        assert!(payload.degraded);
        assert!(payload.severity.is_none());
        assert!(!payload.disclaimer.is_empty());
        validate_payload(&payload).unwrap();
    }

    #[test]
    fn test_unresolved_entities_are_surfaced() {
        let entities = vec![entity("Aspirin", "DB00945", 0), unresolved_entity("xanadrol", 20)];
        let payload = synthesize(QueryIntent::GeneralQuery, &entities, &Retrieved::default());

        assert_eq!(payload.entities, vec!["Aspirin"]);
        assert_eq!(payload.unresolved_entities, vec!["xanadrol"]);
        validate_payload(&payload).unwrap();
    }
}

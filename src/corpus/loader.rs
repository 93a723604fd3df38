//! Corpus file parsing
//!
//! The interaction corpus is a TSV with one interaction per line:
//! `drug_a_id  drug_a_name  drug_b_id  drug_b_name  description[  severity]`.
//! Parsing fails closed: a malformed line is a fatal integrity violation, not
//! a skip.

use std::collections::HashMap;
use std::fs;

use serde::Deserialize;

use crate::corpus::snapshot::PassageEntry;
use crate::corpus::{CorpusError, CorpusSnapshot, InteractionIndex, VocabularyIndex};
use crate::model::{
    CorpusConfig, DrugId, DrugPair, DrugRecord, InteractionEdge, InteractionSeverity,
    RegulatoryChunk,
};

/// Mechanism-description keywords that mark a major interaction when the
/// corpus carries no explicit severity column.
const MAJOR_KEYWORDS: &[&str] = &[
    "severe",
    "contraindicated",
    "avoid",
    "dangerous",
    "life-threatening",
    "bleeding",
    "hemorrhage",
    "anticoagulant",
];

/// Infer a severity tier from interaction mechanism text. Anything that
/// describes a recorded interaction but matches no keyword defaults to
/// `CAUTION`, the conservative reading of unknown text.
pub fn infer_severity(description: &str) -> InteractionSeverity {
    let lower = description.to_lowercase();
    if MAJOR_KEYWORDS.iter().any(|k| lower.contains(k)) {
        InteractionSeverity::MajorInteraction
    } else {
        InteractionSeverity::Caution
    }
}

/// Load the full snapshot from the configured corpus files.
pub fn load_snapshot(config: &CorpusConfig) -> Result<CorpusSnapshot, CorpusError> {
    let mut vocabulary = VocabularyIndex::new();
    let mut interactions = InteractionIndex::new();

    load_interactions(
        &config.interactions_path,
        &mut vocabulary,
        &mut interactions,
    )?;

    if vocabulary.is_empty() {
        return Err(CorpusError::EmptyVocabulary {
            path: config.interactions_path.clone(),
        });
    }

    if let Some(path) = &config.synonyms_path {
        load_synonyms(path, &mut vocabulary)?;
    }

    let drug_vectors = match &config.drug_embeddings_path {
        Some(path) => load_drug_vectors(path)?,
        None => HashMap::new(),
    };

    let passages = match &config.regulatory_path {
        Some(path) => load_passages(path)?,
        None => Vec::new(),
    };

    tracing::info!(
        drugs = vocabulary.len(),
        edges = interactions.len(),
        drug_vectors = drug_vectors.len(),
        passages = passages.len(),
        "Corpus loaded"
    );

    Ok(CorpusSnapshot {
        vocabulary,
        interactions,
        drug_vectors,
        passages,
    })
}

fn read_file(path: &str) -> Result<String, CorpusError> {
    fs::read_to_string(path).map_err(|source| CorpusError::Io {
        path: path.to_string(),
        source,
    })
}

fn load_interactions(
    path: &str,
    vocabulary: &mut VocabularyIndex,
    interactions: &mut InteractionIndex,
) -> Result<(), CorpusError> {
    let contents = read_file(path)?;

    for (idx, line) in contents.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 5 {
            return Err(CorpusError::Malformed {
                path: path.to_string(),
                line: line_no,
                reason: format!("expected at least 5 tab-separated fields, got {}", fields.len()),
            });
        }

        let (a_id, a_name, b_id, b_name, description) =
            (fields[0], fields[1], fields[2], fields[3], fields[4]);

        for (label, value) in [
            ("drug_a_id", a_id),
            ("drug_a_name", a_name),
            ("drug_b_id", b_id),
            ("drug_b_name", b_name),
        ] {
            if value.trim().is_empty() {
                return Err(CorpusError::Malformed {
                    path: path.to_string(),
                    line: line_no,
                    reason: format!("empty {} field", label),
                });
            }
        }

        let severity = match fields.get(5).map(|s| s.trim()).filter(|s| !s.is_empty()) {
            Some(raw) => InteractionSeverity::parse(raw).ok_or_else(|| CorpusError::Malformed {
                path: path.to_string(),
                line: line_no,
                reason: format!("unknown severity {:?}", raw),
            })?,
            None => infer_severity(description),
        };

        vocabulary.insert(DrugRecord {
            id: DrugId::from(a_id),
            name: a_name.trim().to_string(),
            synonyms: vec![],
        })?;
        vocabulary.insert(DrugRecord {
            id: DrugId::from(b_id),
            name: b_name.trim().to_string(),
            synonyms: vec![],
        })?;

        interactions.insert(InteractionEdge {
            pair: DrugPair::new(DrugId::from(a_id), DrugId::from(b_id)),
            severity,
            mechanism: description.trim().to_string(),
        });
    }

    Ok(())
}

/// Synonyms file: `drug_id  synonym`, one per line.
fn load_synonyms(path: &str, vocabulary: &mut VocabularyIndex) -> Result<(), CorpusError> {
    let contents = read_file(path)?;

    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.splitn(2, '\t');
        let id = fields.next().unwrap_or_default().trim();
        let synonym = fields.next().unwrap_or_default().trim();
        if id.is_empty() || synonym.is_empty() {
            return Err(CorpusError::Malformed {
                path: path.to_string(),
                line: idx + 1,
                reason: "expected 2 tab-separated fields: drug_id, synonym".to_string(),
            });
        }

        vocabulary.add_synonym(&DrugId::from(id), synonym);
    }

    Ok(())
}

#[derive(Deserialize)]
struct DrugVectorRecord {
    drug_id: String,
    embedding: Vec<f32>,
}

/// Drug embeddings JSONL: `{"drug_id": ..., "embedding": [...]}` per line.
fn load_drug_vectors(path: &str) -> Result<HashMap<DrugId, Vec<f32>>, CorpusError> {
    let contents = read_file(path)?;
    let mut vectors = HashMap::new();

    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: DrugVectorRecord =
            serde_json::from_str(line).map_err(|e| CorpusError::Malformed {
                path: path.to_string(),
                line: idx + 1,
                reason: e.to_string(),
            })?;
        vectors.insert(DrugId::new(record.drug_id), record.embedding);
    }

    Ok(vectors)
}

#[derive(Deserialize)]
struct PassageRecord {
    id: String,
    citation: String,
    text: String,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
}

/// Regulatory passages JSONL: `{"id", "citation", "text", "embedding"?}`.
fn load_passages(path: &str) -> Result<Vec<PassageEntry>, CorpusError> {
    let contents = read_file(path)?;
    let mut passages = Vec::new();

    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: PassageRecord =
            serde_json::from_str(line).map_err(|e| CorpusError::Malformed {
                path: path.to_string(),
                line: idx + 1,
                reason: e.to_string(),
            })?;
        passages.push(PassageEntry {
            chunk: RegulatoryChunk {
                id: record.id,
                citation: record.citation,
                text: record.text,
            },
            embedding: record.embedding,
        });
    }

    Ok(passages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> String {
        let path = std::env::temp_dir().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_loads_valid_tsv() {
        let path = write_temp(
            "ddi_valid.tsv",
            "DB00945\tAspirin\tDB00682\tWarfarin\tIncreased risk of bleeding\n\
             DB00945\tAspirin\tDB00316\tAcetaminophen\tMinor metabolic interaction\tSAFE\n",
        );
        let config = CorpusConfig {
            interactions_path: path,
            synonyms_path: None,
            regulatory_path: None,
            drug_embeddings_path: None,
        };

        let snapshot = load_snapshot(&config).unwrap();
        assert_eq!(snapshot.vocabulary.len(), 3);
        assert_eq!(snapshot.interactions.len(), 2);

        let pair = DrugPair::new(DrugId::from("DB00945"), DrugId::from("DB00682"));
        // "bleeding" keyword, no explicit column
        assert_eq!(
            snapshot.interactions.get(&pair).unwrap().severity,
            InteractionSeverity::MajorInteraction
        );
    }

    #[test]
    fn test_malformed_line_is_fatal() {
        let path = write_temp("ddi_malformed.tsv", "DB00945\tAspirin\tonly-three-fields\n");
        let config = CorpusConfig {
            interactions_path: path,
            ..Default::default()
        };
        assert!(matches!(
            load_snapshot(&config),
            Err(CorpusError::Malformed { line: 1, .. })
        ));
    }

    #[test]
    fn test_empty_corpus_is_fatal() {
        let path = write_temp("ddi_empty.tsv", "# header only\n");
        let config = CorpusConfig {
            interactions_path: path,
            ..Default::default()
        };
        assert!(matches!(
            load_snapshot(&config),
            Err(CorpusError::EmptyVocabulary { .. })
        ));
    }

    #[test]
    fn test_unknown_severity_column_is_fatal() {
        let path = write_temp(
            "ddi_badsev.tsv",
            "A\tDrugA\tB\tDrugB\tsome description\tCATASTROPHIC\n",
        );
        let config = CorpusConfig {
            interactions_path: path,
            ..Default::default()
        };
        assert!(matches!(
            load_snapshot(&config),
            Err(CorpusError::Malformed { .. })
        ));
    }

    #[test]
    fn test_infer_severity_buckets() {
        assert_eq!(
            infer_severity("Concomitant use is contraindicated"),
            InteractionSeverity::MajorInteraction
        );
        assert_eq!(
            infer_severity("May increase risk of hemorrhage"),
            InteractionSeverity::MajorInteraction
        );
        assert_eq!(
            infer_severity("Slightly delays absorption"),
            InteractionSeverity::Caution
        );
    }
}

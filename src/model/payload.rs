use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Canonical drug identifier (e.g. a DrugBank accession like `DB00945`).
///
/// Every name or synonym in the vocabulary resolves to exactly one `DrugId`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct DrugId(String);

impl DrugId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DrugId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DrugId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A drug known to the vocabulary. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DrugRecord {
    pub id: DrugId,
    /// Canonical display name
    pub name: String,
    /// Brand names and synonyms that also resolve to this record
    pub synonyms: Vec<String>,
}

/// Interaction risk tier. The derived `Ord` gives the aggregation order
/// `SAFE < CAUTION < MAJOR_INTERACTION`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractionSeverity {
    Safe,
    Caution,
    MajorInteraction,
}

impl InteractionSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionSeverity::Safe => "SAFE",
            InteractionSeverity::Caution => "CAUTION",
            InteractionSeverity::MajorInteraction => "MAJOR_INTERACTION",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SAFE" => Some(InteractionSeverity::Safe),
            "CAUTION" | "MODERATE" => Some(InteractionSeverity::Caution),
            "MAJOR_INTERACTION" | "MAJOR" | "SEVERE" | "CONTRAINDICATED" => {
                Some(InteractionSeverity::MajorInteraction)
            }
            _ => None,
        }
    }

    /// Maximum severity across a set of edges. Empty input aggregates to
    /// `SAFE`; the caller is responsible for surfacing the no-data case in
    /// the disclaimer.
    pub fn aggregate<'a, I>(severities: I) -> Self
    where
        I: IntoIterator<Item = &'a InteractionSeverity>,
    {
        severities
            .into_iter()
            .copied()
            .max()
            .unwrap_or(InteractionSeverity::Safe)
    }
}

impl fmt::Display for InteractionSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unordered pair of canonical drug identifiers.
///
/// Constructed in normalized order so that `(a, b)` and `(b, a)` compare and
/// hash identically. This is what makes `lookup_pairs` symmetric.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
pub struct DrugPair {
    first: DrugId,
    second: DrugId,
}

impl DrugPair {
    pub fn new(a: DrugId, b: DrugId) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    pub fn first(&self) -> &DrugId {
        &self.first
    }

    pub fn second(&self) -> &DrugId {
        &self.second
    }
}

/// One drug-drug interaction edge from the corpus.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InteractionEdge {
    pub pair: DrugPair,
    pub severity: InteractionSeverity,
    /// Textual mechanism description from the source corpus
    pub mechanism: String,
}

/// Query intent as determined by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    CheckInteraction,
    FindSimilar,
    GeneralQuery,
    LegalQuery,
}

impl QueryIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryIntent::CheckInteraction => "check_interaction",
            QueryIntent::FindSimilar => "find_similar",
            QueryIntent::GeneralQuery => "general_query",
            QueryIntent::LegalQuery => "legal_query",
        }
    }
}

impl fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A drug mention extracted from the query text. Per-request only, never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExtractedEntity {
    /// The span as it appeared in the source text
    pub text: String,
    /// Byte offset of the span in the source text
    pub offset: usize,
    /// Canonical identifier, if the mention resolved
    pub resolved: Option<DrugId>,
    /// Canonical display name, if the mention resolved
    pub canonical_name: Option<String>,
    /// Resolution confidence in [0, 1]
    pub confidence: f64,
}

impl ExtractedEntity {
    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }
}

/// One chunk of regulatory text with its source citation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegulatoryChunk {
    pub id: String,
    /// Source citation (act, section, page)
    pub citation: String,
    pub text: String,
}

/// A single structured fact in the response payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchFact {
    /// One queried drug pair. `recorded: false` means the corpus has no edge
    /// for this pair; absence of data is not proof of safety and the
    /// disclaimer says so.
    Interaction {
        drug_a: String,
        drug_b: String,
        severity: InteractionSeverity,
        mechanism: Option<String>,
        recorded: bool,
    },
    SimilarDrug {
        id: DrugId,
        name: String,
        score: f32,
    },
    Passage {
        citation: String,
        text: String,
        score: f32,
    },
}

/// The sole unit returned across the core boundary.
///
/// Deterministic for identical inputs: carries no timestamps, request ids,
/// or other per-call noise in its factual fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResponsePayload {
    pub intent: QueryIntent,
    /// Aggregated severity; present only for interaction checks that were
    /// not degraded
    pub severity: Option<InteractionSeverity>,
    /// Ordered structured facts (interaction edges, similar drugs, or
    /// regulatory passages depending on intent)
    pub matches: Vec<MatchFact>,
    /// Canonical names of the drugs that resolved, in order of first mention
    pub entities: Vec<String>,
    /// Mentions that could not be matched to a known drug
    pub unresolved_entities: Vec<String>,
    /// Mandatory safety disclaimer; non-empty on every path
    pub disclaimer: String,
    /// True when a data provider failed or timed out and the payload carries
    /// partial information
    pub degraded: bool,
}

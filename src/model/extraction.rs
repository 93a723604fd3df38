//! Structured extraction targets for LLM calls
//!
//! These types define the JSON schemas the rig extractors request from the
//! model. They are converted to domain types immediately after extraction and
//! never leave the service layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Drug names recognized in a free-text query
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedDrugList {
    /// Drug names exactly as they appear in the text
    #[schemars(
        description = "Every drug, medication, or pharmaceutical substance mentioned in the text, verbatim. Empty if none."
    )]
    pub drugs: Vec<String>,
}

/// Intent classification returned by the fallback classifier
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedIntent {
    /// One of: check_interaction, find_similar, general_query, legal_query
    #[schemars(
        description = "The single best intent label: check_interaction, find_similar, general_query, or legal_query"
    )]
    pub intent: String,

    /// Confidence in [0, 1]
    #[schemars(description = "Confidence in the chosen label, between 0 and 1")]
    pub confidence: f64,
}

/// Natural-language answer phrased from a finalized payload
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PhrasedAnswer {
    /// The user-facing answer text
    #[schemars(
        description = "A clear answer for the user, stating only the facts provided and restating the safety disclaimer"
    )]
    pub response: String,

    /// Whether the answer restates the safety disclaimer
    #[schemars(description = "True if the response includes the safety disclaimer")]
    pub disclaimer_included: bool,
}

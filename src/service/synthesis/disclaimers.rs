//! Safety disclaimer text
//!
//! Wording is tiered by aggregate severity. Every payload leaves the core
//! with one of these attached; `validation` enforces it.

use crate::model::InteractionSeverity;

pub const DISCLAIMER_MAJOR: &str = "WARNING: A major interaction is recorded for this combination. \
     Do not combine these medications without explicit guidance from your doctor or pharmacist. \
     This information is not medical advice.";

pub const DISCLAIMER_CAUTION: &str = "Caution: An interaction is recorded for this combination. \
     Consult your doctor or pharmacist before combining these medications. \
     This information is not medical advice.";

pub const DISCLAIMER_SAFE: &str = "No interaction is recorded between these medications in our data. \
     Always confirm with your doctor or pharmacist before combining medications. \
     This information is not medical advice.";

/// Appended whenever at least one queried pair has no recorded edge.
pub const NO_DATA_CLAUSE: &str = " Note: absence of a recorded interaction is not proof of safety; \
     some combinations in this query have no data in our sources.";

pub const DISCLAIMER_GENERIC: &str = "This information is provided for educational purposes only and is not medical advice. \
     Consult a qualified healthcare professional before making decisions about medication.";

pub const DISCLAIMER_ALTERNATIVES: &str = "Listed alternatives are based on pharmacological similarity only and are not \
     recommendations. Never switch medications without consulting your doctor or pharmacist.";

pub const DISCLAIMER_LEGAL: &str = "Regulatory excerpts are provided for information only, may be outdated, and do not \
     constitute legal advice. Consult the current official text or a qualified professional.";

pub const DISCLAIMER_DEGRADED: &str = "Some data sources were unavailable while answering this query; the information \
     below may be incomplete. Consult your doctor or pharmacist before acting on it. \
     This information is not medical advice.";

/// Disclaimer for an interaction check: tier by aggregate severity, with the
/// no-data clause when any queried pair is unrecorded.
pub fn interaction_disclaimer(severity: InteractionSeverity, has_unrecorded: bool) -> String {
    let base = match severity {
        InteractionSeverity::MajorInteraction => DISCLAIMER_MAJOR,
        InteractionSeverity::Caution => DISCLAIMER_CAUTION,
        InteractionSeverity::Safe => DISCLAIMER_SAFE,
    };

    if has_unrecorded {
        format!("{}{}", base, NO_DATA_CLAUSE)
    } else {
        base.to_string()
    }
}

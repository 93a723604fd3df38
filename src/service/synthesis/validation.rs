//! Payload postconditions
//!
//! Checked on every payload before it leaves the core, degraded or not.

use crate::model::{QueryIntent, ResponsePayload};

#[derive(Debug, thiserror::Error, PartialEq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("Payload has an empty disclaimer")]
    EmptyDisclaimer,

    #[error("Interaction payload is missing an aggregate severity")]
    MissingSeverity,
}

pub fn validate_payload(payload: &ResponsePayload) -> Result<(), ValidationError> {
    if payload.disclaimer.trim().is_empty() {
        return Err(ValidationError::EmptyDisclaimer);
    }

    // A non-degraded interaction check must commit to an aggregate severity;
    // a degraded one must not fabricate it.
    if payload.intent == QueryIntent::CheckInteraction
        && !payload.degraded
        && payload.severity.is_none()
    {
        return Err(ValidationError::MissingSeverity);
    }

    Ok(())
}

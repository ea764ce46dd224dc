//! Core capability errors (parsing, validation).
//!
//! These are bounded and stable: core errors represent domain/refusal
//! states, not library implementation details.

use thiserror::Error;

use crate::error::{Effect, Transience};

/// Invalid ID string.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum InvalidId {
    #[error("asset id `{raw}` is invalid: {reason}")]
    Asset { raw: String, reason: String },
    #[error("block id `{raw}` is invalid: {reason}")]
    Block { raw: String, reason: String },
    #[error("sector id `{raw}` is invalid: {reason}")]
    Sector { raw: String, reason: String },
    #[error("room id `{raw}` is invalid: {reason}")]
    Room { raw: String, reason: String },
    #[error("entry id `{raw}` is invalid: {reason}")]
    Entry { raw: String, reason: String },
    #[error("sector prefix `{raw}` is invalid: {reason}")]
    Prefix { raw: String, reason: String },
}

/// Invalid entity field value.
#[derive(Debug, Error, Clone)]
#[error("{field} is invalid: {reason}")]
pub struct InvalidField {
    pub field: &'static str,
    pub reason: String,
}

/// Canonical error enum for core capability.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum CoreError {
    #[error(transparent)]
    InvalidId(#[from] InvalidId),
    #[error(transparent)]
    InvalidField(#[from] InvalidField),
}

impl CoreError {
    pub fn transience(&self) -> Transience {
        // Core errors are pure domain/input failures.
        Transience::Permanent
    }

    pub fn effect(&self) -> Effect {
        Effect::None
    }
}

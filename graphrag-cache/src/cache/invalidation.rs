//! Cache invalidation
//!
//! Cached fingerprints and graph types are only valid for the planner logic
//! and normalization rules that produced them. Whenever either changes, the
//! optimizer drops both caches at once and moves to a new generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason for cache invalidation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvalidationReason {
    /// Downstream planner logic changed
    PlannerUpdated { version: String },

    /// Fingerprint or classifier rules changed
    ConfigChanged,

    /// Manual invalidation
    Manual,
}

impl fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidationReason::PlannerUpdated { version } => {
                write!(f, "planner updated to {}", version)
            }
            InvalidationReason::ConfigChanged => write!(f, "configuration changed"),
            InvalidationReason::Manual => write!(f, "manual invalidation"),
        }
    }
}

/// Record of a completed invalidation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationEvent {
    /// Reason for invalidation
    pub reason: InvalidationReason,

    /// When the invalidation occurred
    pub timestamp: DateTime<Utc>,

    /// Generation the optimizer moved to
    pub generation: u64,

    /// Entries dropped from the fingerprint cache
    pub fingerprint_entries: usize,

    /// Entries dropped from the graph-type cache
    pub type_entries: usize,

    /// Additional context
    pub context: Option<String>,
}

impl InvalidationEvent {
    pub fn new(
        reason: InvalidationReason,
        generation: u64,
        fingerprint_entries: usize,
        type_entries: usize,
    ) -> Self {
        Self {
            reason,
            timestamp: Utc::now(),
            generation,
            fingerprint_entries,
            type_entries,
            context: None,
        }
    }

    /// Add context to the event
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn total_entries(&self) -> usize {
        self.fingerprint_entries + self.type_entries
    }
}

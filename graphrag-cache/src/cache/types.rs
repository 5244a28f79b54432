//! Core type definitions for the cache system

use serde::{Deserialize, Serialize};
use std::fmt;

/// Statistics for one bounded cache
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CacheStats {
    /// Lookups that found an entry
    pub hits: u64,

    /// Total lookups
    pub accesses: u64,

    /// `hits / accesses`, 0.0 when nothing was looked up yet
    pub hit_rate: f64,

    /// Number of entries currently in cache
    pub size: usize,

    /// Configured capacity
    pub max_size: usize,

    /// Inserts dropped because the cache was full
    pub rejected: u64,
}

impl CacheStats {
    pub fn new(hits: u64, accesses: u64, size: usize, max_size: usize, rejected: u64) -> Self {
        let hit_rate = if accesses == 0 {
            0.0
        } else {
            hits as f64 / accesses as f64
        };

        Self {
            hits,
            accesses,
            hit_rate,
            size,
            max_size,
            rejected,
        }
    }

    pub fn misses(&self) -> u64 {
        self.accesses - self.hits
    }

    pub fn is_full(&self) -> bool {
        self.size >= self.max_size
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits: {}, misses: {}, accesses: {}, hit_rate: {:.2}%, size: {}/{}{}, rejected: {}",
            self.hits,
            self.misses(),
            self.accesses,
            self.hit_rate * 100.0,
            self.size,
            self.max_size,
            if self.is_full() { " (full)" } else { "" },
            self.rejected
        )
    }
}

/// What happened to a `put`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertOutcome {
    /// New entry stored
    Stored,

    /// Key already cached; the existing value was kept
    AlreadyPresent,

    /// Cache full; nothing stored
    CapacityReached,
}

impl InsertOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, InsertOutcome::Stored)
    }
}

impl fmt::Display for InsertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertOutcome::Stored => write!(f, "stored"),
            InsertOutcome::AlreadyPresent => write!(f, "already_present"),
            InsertOutcome::CapacityReached => write!(f, "capacity_reached"),
        }
    }
}

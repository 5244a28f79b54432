//! Optimizer statistics report

use crate::cache::types::CacheStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Read-only snapshot of both caches plus facade-level counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationStats {
    pub fingerprint_cache: CacheStats,

    pub type_detection_cache: CacheStats,

    /// Calls that skipped the caches because a signature could not be built
    pub bypassed: u64,

    /// Fingerprint-cache hits rejected by query-text verification
    pub collisions: u64,

    /// Number of invalidations so far
    pub generation: u64,

    pub generated_at: DateTime<Utc>,
}

impl OptimizationStats {
    /// Hit rate across both caches (0.0 - 1.0)
    pub fn combined_hit_rate(&self) -> f64 {
        let accesses = self.fingerprint_cache.accesses + self.type_detection_cache.accesses;
        if accesses == 0 {
            0.0
        } else {
            (self.fingerprint_cache.hits + self.type_detection_cache.hits) as f64 / accesses as f64
        }
    }
}

impl fmt::Display for OptimizationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "fingerprint_cache:    {}", self.fingerprint_cache)?;
        writeln!(f, "type_detection_cache: {}", self.type_detection_cache)?;
        write!(
            f,
            "combined_hit_rate: {:.2}%, bypassed: {}, collisions: {}, generation: {}",
            self.combined_hit_rate() * 100.0,
            self.bypassed,
            self.collisions,
            self.generation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(fp: CacheStats, types: CacheStats) -> OptimizationStats {
        OptimizationStats {
            fingerprint_cache: fp,
            type_detection_cache: types,
            bypassed: 1,
            collisions: 0,
            generation: 0,
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_combined_hit_rate() {
        let report = stats(
            CacheStats::new(3, 4, 1, 1000, 0),
            CacheStats::new(1, 4, 1, 500, 0),
        );
        assert_eq!(report.combined_hit_rate(), 0.5);

        let empty = stats(CacheStats::default(), CacheStats::default());
        assert_eq!(empty.combined_hit_rate(), 0.0);
    }

    #[test]
    fn test_display_lists_both_caches() {
        let report = stats(
            CacheStats::new(99, 100, 1, 1000, 0),
            CacheStats::new(0, 0, 0, 500, 0),
        );
        let text = report.to_string();
        assert!(text.contains("fingerprint_cache:"));
        assert!(text.contains("type_detection_cache:"));
        assert!(text.contains("bypassed: 1"));
        assert!(text.contains("combined_hit_rate: 99.00%"));
    }

    #[test]
    fn test_serialized_shape() {
        let report = stats(
            CacheStats::new(99, 100, 1, 1000, 0),
            CacheStats::new(0, 0, 0, 500, 0),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["fingerprint_cache"]["hits"], 99);
        assert_eq!(json["fingerprint_cache"]["accesses"], 100);
        assert_eq!(json["type_detection_cache"]["max_size"], 500);
    }
}

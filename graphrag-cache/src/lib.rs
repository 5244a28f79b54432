//! # GraphRAG Query Cache (graphrag-cache)
//!
//! Caching layer in front of a GraphRAG query planner. Each incoming request
//! is reduced to a stable fingerprint and tagged with the kind of knowledge
//! graph it targets. Both results are memoized in size-capped caches keyed by
//! cheap request signatures.
//!
//! ## Features
//!
//! - Canonical SHA-256 fingerprints, independent of key order, with large
//!   numeric vectors reduced to a shape hint
//! - Heuristic graph-type detection: `wikipedia`, `ipld`, `mixed`, `general`
//! - Capacity-capped caches with hit/access counters and no eviction
//! - Graceful degradation: a request the signature builder cannot read is
//!   computed directly instead of failing
//! - Generation-based invalidation when planner logic or rules change
//!
//! ## Fingerprints
//!
//! ```rust
//! use graphrag_cache::QueryOptimizer;
//! use serde_json::json;
//!
//! let mut optimizer = QueryOptimizer::default();
//! let request = json!({ "query": "find entity X", "type": "general" });
//!
//! let first = optimizer.optimize(&request)?;
//! let second = optimizer.optimize(&request)?;
//! assert_eq!(first, second);
//!
//! let stats = optimizer.get_optimization_stats();
//! assert_eq!(stats.fingerprint_cache.hits, 1);
//! assert_eq!(stats.fingerprint_cache.accesses, 2);
//! # Ok::<(), graphrag_cache::OptimizerError>(())
//! ```
//!
//! ## Graph Type Detection
//!
//! ```rust
//! use graphrag_cache::{GraphType, QueryOptimizer};
//! use serde_json::json;
//!
//! let mut optimizer = QueryOptimizer::default();
//!
//! let request = json!({ "query": "population of Paris per Wikipedia" });
//! assert_eq!(optimizer.detect_type(&request)?, GraphType::Wikipedia);
//!
//! let request = json!({ "entity_sources": ["wikidata", "ipfs"] });
//! assert_eq!(optimizer.detect_type(&request)?, GraphType::Mixed);
//! # Ok::<(), graphrag_cache::OptimizerError>(())
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use graphrag_cache::{HitVerification, OptimizerConfig, QueryOptimizer};
//!
//! let config = OptimizerConfig::builder()
//!     .max_fingerprint_cache_size(5_000)
//!     .max_type_cache_size(1_000)
//!     .hit_verification(HitVerification::Trust)
//!     .build();
//!
//! let optimizer = QueryOptimizer::new(config)?;
//! assert_eq!(optimizer.config().max_type_cache_size, 1_000);
//! # Ok::<(), graphrag_cache::OptimizerError>(())
//! ```

pub mod cache;
pub mod error;
pub mod optimizer;
pub mod request;

// Re-export main types for convenience
pub use cache::{
    BoundedCache, CacheStats, CachedFingerprint, HitVerification, InsertOutcome,
    InvalidationEvent, InvalidationReason, OptimizerConfig, OptimizerConfigBuilder,
};
pub use error::{OptimizerError, Result};
pub use optimizer::{
    ClassifierRules, Fingerprint, FingerprintComputer, FingerprintConfig, GraphType,
    HeuristicClassifier, OptimizationStats, QueryOptimizer, SharedQueryOptimizer,
};
pub use request::{Field, QueryRequest};

//! # Bounded Caches
//!
//! Storage side of the query optimizer: the capacity-capped store, its
//! statistics, the fingerprint entry type, configuration and invalidation.
//!
//! ## Policy
//!
//! - **Capacity capping**: once a cache is full, new keys are not stored and
//!   nothing is evicted. The computed value is still returned to the caller.
//! - **Write once**: an entry is never replaced in place; putting an existing
//!   key keeps the original value.
//! - **Counters**: every lookup counts as an access, every successful lookup as
//!   a hit. Counters survive invalidation and are reset only with the process.
//!
//! ## Example
//!
//! ```rust
//! use graphrag_cache::cache::{BoundedCache, InsertOutcome};
//!
//! let mut cache: BoundedCache<String, u32> = BoundedCache::new("example", 2);
//! cache.put("a".to_string(), 1);
//! cache.put("b".to_string(), 2);
//! assert_eq!(cache.put("c".to_string(), 3), InsertOutcome::CapacityReached);
//!
//! assert_eq!(cache.get("a"), Some(1));
//! assert_eq!(cache.get("c"), None);
//! assert_eq!(cache.stats().hits, 1);
//! ```

pub mod config;
pub mod entry;
pub mod invalidation;
pub mod store;
pub mod types;

pub use config::{HitVerification, OptimizerConfig, OptimizerConfigBuilder};
pub use entry::CachedFingerprint;
pub use invalidation::{InvalidationEvent, InvalidationReason};
pub use store::BoundedCache;
pub use types::{CacheStats, InsertOutcome};

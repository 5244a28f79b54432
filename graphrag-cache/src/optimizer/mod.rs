//! # Query Optimizer
//!
//! Request-facing half of the crate:
//!
//! - [`signature`]: cheap cache keys built from a handful of request fields
//! - [`fingerprint`]: the canonical SHA-256 identity of a whole request
//! - [`classifier`]: heuristic graph-type detection
//! - [`facade`]: [`QueryOptimizer`], tying the above to the bounded caches
//! - [`shared`]: a lock-wrapped handle for multi-threaded callers

pub mod classifier;
pub mod facade;
pub mod fingerprint;
pub mod shared;
pub mod signature;
pub mod stats;

pub use classifier::{ClassifierRules, DetectionInputs, GraphType, HeuristicClassifier};
pub use facade::QueryOptimizer;
pub use fingerprint::{CanonicalForm, Fingerprint, FingerprintComputer, FingerprintConfig};
pub use shared::SharedQueryOptimizer;
pub use signature::{build_detection_signature, build_signature, DetectionSignature, Signature};
pub use stats::OptimizationStats;

//! Query optimizer facade
//!
//! Both flows share one shape:
//!
//! 1. build a cheap signature for the request
//! 2. look up the matching cache; a hit is returned immediately
//! 3. on a miss, compute the fingerprint or run the classifier
//! 4. try to store the result (the cache may be full)
//! 5. return the computed value whether or not it was stored
//!
//! If the signature cannot be built because a recognized field has the wrong
//! shape, the call skips the cache and computes directly.
//!
//! A signature only reads a few fields, so unrelated requests can share one.
//! Under [`HitVerification::Verify`] each fingerprint entry carries the
//! canonical encoding of its request, and a hit is served only when the
//! incoming request encodes to the same bytes. The caches then change latency,
//! never the returned value. [`HitVerification::Trust`] skips the check.

use crate::cache::config::{HitVerification, OptimizerConfig};
use crate::cache::entry::CachedFingerprint;
use crate::cache::invalidation::{InvalidationEvent, InvalidationReason};
use crate::cache::store::BoundedCache;
use crate::error::{OptimizerError, Result};
use crate::optimizer::classifier::{GraphType, HeuristicClassifier};
use crate::optimizer::fingerprint::{Fingerprint, FingerprintComputer, FingerprintConfig};
use crate::optimizer::signature::{
    build_detection_signature, build_signature, DetectionSignature, Signature,
};
use crate::optimizer::stats::OptimizationStats;
use crate::request::QueryRequest;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};

/// Owns one fingerprint cache and one graph-type cache
#[derive(Debug)]
pub struct QueryOptimizer {
    config: OptimizerConfig,

    fingerprints: BoundedCache<Signature, CachedFingerprint>,

    graph_types: BoundedCache<DetectionSignature, GraphType>,

    computer: FingerprintComputer,

    classifier: HeuristicClassifier,

    generation: u64,

    bypassed: u64,

    collisions: u64,
}

impl QueryOptimizer {
    /// Create an optimizer after validating `config`
    pub fn new(config: OptimizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: OptimizerConfig) -> Self {
        info!(
            "Initializing query optimizer (fingerprint cache: {}, type cache: {}, hit verification: {})",
            config.max_fingerprint_cache_size, config.max_type_cache_size, config.hit_verification
        );

        Self {
            fingerprints: BoundedCache::new("fingerprint", config.max_fingerprint_cache_size),
            graph_types: BoundedCache::new("type_detection", config.max_type_cache_size),
            computer: FingerprintComputer::new(config.fingerprint.clone()),
            classifier: HeuristicClassifier::new(config.classifier.clone()),
            config,
            generation: 0,
            bypassed: 0,
            collisions: 0,
        }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Fingerprint a request, going through the fingerprint cache
    ///
    /// Fails only when `request` is not a JSON object.
    pub fn optimize(&mut self, request: &Value) -> Result<Fingerprint> {
        let request = QueryRequest::from_value(request)?;
        Ok(self.optimize_request(&request))
    }

    pub fn optimize_request(&mut self, request: &QueryRequest<'_>) -> Fingerprint {
        let signature = match build_signature(request) {
            Ok(signature) => signature,
            Err(e) => {
                self.bypassed += 1;
                debug!("Fingerprint cache bypassed: {}", e);
                return self.computer.compute(request);
            }
        };

        if let Some(cached) = self.fingerprints.get_ref(&signature) {
            let belongs = match &cached.form {
                Some(form) => self.computer.matches(request, form),
                None => true,
            };

            if belongs {
                debug!("Fingerprint cache hit: {}", signature);
                return cached.fingerprint.clone();
            }

            self.collisions += 1;
            debug!("Signature collision, recomputing: {}", signature);
            return self.computer.compute(request);
        }

        let (fingerprint, entry) = match self.config.hit_verification {
            HitVerification::Verify => {
                let (fingerprint, form) = self.computer.compute_with_form(request);
                (fingerprint.clone(), CachedFingerprint::verified(fingerprint, form))
            }
            HitVerification::Trust => {
                let fingerprint = self.computer.compute(request);
                (fingerprint.clone(), CachedFingerprint::unverified(fingerprint))
            }
        };

        let outcome = self.fingerprints.put(signature, entry);
        debug!("Fingerprint cache miss ({}): {}", outcome, fingerprint);

        fingerprint
    }

    /// Classify a request, going through the graph-type cache
    ///
    /// Fails only when `request` is not a JSON object.
    pub fn detect_type(&mut self, request: &Value) -> Result<GraphType> {
        let request = QueryRequest::from_value(request)?;
        Ok(self.detect_request_type(&request))
    }

    pub fn detect_request_type(&mut self, request: &QueryRequest<'_>) -> GraphType {
        let signature = match build_detection_signature(request, self.classifier.rules()) {
            Ok(signature) => signature,
            Err(e) => {
                self.bypassed += 1;
                debug!("Type detection cache bypassed: {}", e);
                return self.classifier.classify(request);
            }
        };

        if let Some(graph_type) = self.graph_types.get(&signature) {
            debug!("Type detection cache hit: {}", graph_type);
            return graph_type;
        }

        let graph_type = self.classifier.classify(request);
        let outcome = self.graph_types.put(signature, graph_type);
        debug!("Type detection cache miss ({}): {}", outcome, graph_type);

        graph_type
    }

    /// Fingerprint without touching the cache
    pub fn compute_fingerprint(&self, request: &QueryRequest<'_>) -> Fingerprint {
        self.computer.compute(request)
    }

    /// Classify without touching the cache
    pub fn classify(&self, request: &QueryRequest<'_>) -> GraphType {
        self.classifier.classify(request)
    }

    pub fn get_optimization_stats(&self) -> OptimizationStats {
        OptimizationStats {
            fingerprint_cache: self.fingerprints.stats(),
            type_detection_cache: self.graph_types.stats(),
            bypassed: self.bypassed,
            collisions: self.collisions,
            generation: self.generation,
            generated_at: Utc::now(),
        }
    }

    /// Drop both caches and start a new generation; counters are kept
    pub fn invalidate(&mut self, reason: InvalidationReason) -> InvalidationEvent {
        let fingerprint_entries = self.fingerprints.clear();
        let type_entries = self.graph_types.clear();
        self.generation += 1;

        let event = InvalidationEvent::new(reason, self.generation, fingerprint_entries, type_entries);
        info!(
            "Invalidated optimizer caches ({}): {} entries dropped, generation {}",
            event.reason,
            event.total_entries(),
            event.generation
        );

        event
    }

    /// Swap fingerprint normalization rules; cached fingerprints are dropped
    pub fn reconfigure_fingerprint(&mut self, config: FingerprintConfig) -> Result<InvalidationEvent> {
        config.validate().map_err(OptimizerError::Config)?;

        let context = format!(
            "vector_hint_threshold {} -> {}, max_depth {} -> {}",
            self.config.fingerprint.vector_hint_threshold,
            config.vector_hint_threshold,
            self.config.fingerprint.max_depth,
            config.max_depth
        );

        self.computer = FingerprintComputer::new(config.clone());
        self.config.fingerprint = config;

        Ok(self
            .invalidate(InvalidationReason::ConfigChanged)
            .with_context(context))
    }
}

impl Default for QueryOptimizer {
    fn default() -> Self {
        Self::with_valid_config(OptimizerConfig::default())
    }
}

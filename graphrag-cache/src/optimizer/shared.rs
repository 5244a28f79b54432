//! Thread-safe handle over a [`QueryOptimizer`]
//!
//! Each call holds the lock for one whole lookup-compute-store cycle, so the
//! access and hit counters stay exact under concurrent use.

use crate::cache::config::OptimizerConfig;
use crate::cache::invalidation::{InvalidationEvent, InvalidationReason};
use crate::error::Result;
use crate::optimizer::classifier::GraphType;
use crate::optimizer::facade::QueryOptimizer;
use crate::optimizer::fingerprint::Fingerprint;
use crate::optimizer::stats::OptimizationStats;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

/// Cloneable, `Send + Sync` optimizer handle
#[derive(Debug, Clone)]
pub struct SharedQueryOptimizer {
    inner: Arc<Mutex<QueryOptimizer>>,
}

impl SharedQueryOptimizer {
    pub fn new(config: OptimizerConfig) -> Result<Self> {
        Ok(Self::from_optimizer(QueryOptimizer::new(config)?))
    }

    pub fn from_optimizer(optimizer: QueryOptimizer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(optimizer)),
        }
    }

    pub fn optimize(&self, request: &Value) -> Result<Fingerprint> {
        self.inner.lock().optimize(request)
    }

    pub fn detect_type(&self, request: &Value) -> Result<GraphType> {
        self.inner.lock().detect_type(request)
    }

    pub fn get_optimization_stats(&self) -> OptimizationStats {
        self.inner.lock().get_optimization_stats()
    }

    pub fn invalidate(&self, reason: InvalidationReason) -> InvalidationEvent {
        self.inner.lock().invalidate(reason)
    }

    /// Run `f` with exclusive access to the underlying optimizer
    pub fn with<R>(&self, f: impl FnOnce(&mut QueryOptimizer) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl Default for SharedQueryOptimizer {
    fn default() -> Self {
        Self::from_optimizer(QueryOptimizer::default())
    }
}

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use anyhow::Context;

use crate::{
    analysis::{ImageAnalysis, analyze_bytes},
    config::PlanConfig,
    foundation::error::{DrawStepsError, DrawStepsResult},
    foundation::math::FnvPair,
};

/// Content address of one analysis: image bytes plus the analysis-relevant configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnalysisKey(u64, u64);

impl AnalysisKey {
    pub fn new(image_bytes: &[u8], cfg: &PlanConfig) -> DrawStepsResult<Self> {
        let params = serde_json::to_string(&(
            &cfg.preprocess,
            &cfg.extract,
            &cfg.tone,
            cfg.include_shading,
        ))
        .context("serialize analysis parameters")?;

        let mut h = FnvPair::new();
        h.write_bytes(image_bytes);
        h.write_str(&params);
        let (a, b) = h.finish();
        Ok(Self(a, b))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Default)]
struct Entries {
    by_key: HashMap<AnalysisKey, Arc<ImageAnalysis>>,
    // Insertion order for FIFO eviction.
    order: VecDeque<AnalysisKey>,
}

/// Bounded, caller-owned store of analysis results shared across plan requests.
///
/// Lookups take a read lock; analysis itself runs outside any lock, so two workers missing on
/// the same image may both analyse it and the second insert is dropped.
pub struct ContourTreeCache {
    capacity: usize,
    entries: RwLock<Entries>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl std::fmt::Debug for ContourTreeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContourTreeCache")
            .field("capacity", &self.capacity)
            .field("stats", &self.stats())
            .finish()
    }
}

impl ContourTreeCache {
    pub const DEFAULT_CAPACITY: usize = 32;

    /// `capacity` is clamped to at least one entry.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RwLock::new(Entries::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, key: &AnalysisKey) -> DrawStepsResult<Option<Arc<ImageAnalysis>>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| DrawStepsError::Other(anyhow::anyhow!("analysis cache lock poisoned")))?;
        Ok(entries.by_key.get(key).cloned())
    }

    /// Return the cached analysis of `image_bytes`, analysing and inserting it on a miss.
    ///
    /// Failed analyses are not cached.
    pub fn get_or_analyze(
        &self,
        image_bytes: &[u8],
        cfg: &PlanConfig,
    ) -> DrawStepsResult<Arc<ImageAnalysis>> {
        let key = AnalysisKey::new(image_bytes, cfg)?;
        if let Some(hit) = self.get(&key)? {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(?key, "analysis cache hit");
            return Ok(hit);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let analysis = Arc::new(analyze_bytes(image_bytes, cfg)?);
        self.insert(key, Arc::clone(&analysis))?;
        Ok(analysis)
    }

    fn insert(&self, key: AnalysisKey, analysis: Arc<ImageAnalysis>) -> DrawStepsResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| DrawStepsError::Other(anyhow::anyhow!("analysis cache lock poisoned")))?;
        if entries.by_key.contains_key(&key) {
            return Ok(());
        }
        while entries.order.len() >= self.capacity {
            if let Some(old) = entries.order.pop_front() {
                entries.by_key.remove(&old);
                tracing::debug!(key = ?old, "evicted analysis");
            }
        }
        entries.order.push_back(key);
        entries.by_key.insert(key, analysis);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.by_key.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.by_key.clear();
            entries.order.clear();
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl Default for ContourTreeCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/analysis/cache.rs"]
mod tests;

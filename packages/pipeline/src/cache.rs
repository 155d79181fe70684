//! Bounded-TTL memoization of the pipeline bundle.
//!
//! The inputs are static files, so a hosting dashboard only needs to
//! re-run the pipeline when the cache window lapses. The lock is held
//! across the load, which gives at-most-once computation under
//! contention; that property is best-effort, not load-bearing, since a
//! duplicate recomputation would be wasteful but not incorrect.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::{DataBundle, PipelineError};

/// Default cache window: one hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// A single-slot cache for the pipeline bundle.
pub struct BundleCache {
    ttl: Duration,
    slot: Mutex<Option<(Instant, Arc<DataBundle>)>>,
}

impl BundleCache {
    /// Creates a cache with the given window.
    #[must_use]
    pub const fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Returns the cached bundle, or runs `load` and caches its result.
    ///
    /// A failed load caches nothing; the next caller retries.
    ///
    /// # Errors
    ///
    /// Propagates the [`PipelineError`] from `load`.
    pub fn get_or_load(
        &self,
        load: impl FnOnce() -> Result<DataBundle, PipelineError>,
    ) -> Result<Arc<DataBundle>, PipelineError> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some((loaded_at, bundle)) = slot.as_ref()
            && loaded_at.elapsed() < self.ttl
        {
            log::debug!("Serving cached bundle ({:?} old)", loaded_at.elapsed());
            return Ok(Arc::clone(bundle));
        }

        let bundle = Arc::new(load()?);
        *slot = Some((Instant::now(), Arc::clone(&bundle)));
        Ok(bundle)
    }

    /// Drops any cached bundle, forcing the next call to recompute.
    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }
}

impl Default for BundleCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn empty_bundle() -> DataBundle {
        DataBundle {
            facilities: Vec::new(),
            districts: Vec::new(),
            joined: Vec::new(),
            district_counts: Vec::new(),
            department_totals: Vec::new(),
            centers: None,
            lima: None,
            loreto: None,
        }
    }

    #[test]
    fn second_call_within_ttl_reuses_the_bundle() {
        let cache = BundleCache::new(Duration::from_secs(60));
        let loads = Cell::new(0u32);

        for _ in 0..3 {
            let bundle = cache
                .get_or_load(|| {
                    loads.set(loads.get() + 1);
                    Ok(empty_bundle())
                })
                .unwrap();
            assert!(bundle.facilities.is_empty());
        }
        assert_eq!(loads.get(), 1);
    }

    #[test]
    fn zero_ttl_recomputes_every_call() {
        let cache = BundleCache::new(Duration::ZERO);
        let loads = Cell::new(0u32);

        for _ in 0..2 {
            cache
                .get_or_load(|| {
                    loads.set(loads.get() + 1);
                    Ok(empty_bundle())
                })
                .unwrap();
        }
        assert_eq!(loads.get(), 2);
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let cache = BundleCache::new(Duration::from_secs(60));
        let loads = Cell::new(0u32);

        let err = cache.get_or_load(|| {
            loads.set(loads.get() + 1);
            Err(PipelineError::EmptyJoin)
        });
        assert!(err.is_err());

        cache
            .get_or_load(|| {
                loads.set(loads.get() + 1);
                Ok(empty_bundle())
            })
            .unwrap();
        assert_eq!(loads.get(), 2);
    }

    #[test]
    fn invalidate_forces_a_reload() {
        let cache = BundleCache::new(Duration::from_secs(60));
        let loads = Cell::new(0u32);
        let load = || {
            cache
                .get_or_load(|| {
                    loads.set(loads.get() + 1);
                    Ok(empty_bundle())
                })
                .unwrap()
        };

        load();
        cache.invalidate();
        load();
        assert_eq!(loads.get(), 2);
    }
}

//! The Module record (spec.md §4.3): one entry per resolved CommonJS
//! module, tracking its `module.exports` value and load state.
//!
//! A plain `HashMap<PathBuf, ModuleRecord>` would be enough for a cache;
//! the `loaded` flag is what makes circular `require` work (spec.md §8
//! scenario 4): [`require::RequireCapability`] inserts a record with
//! `loaded = false` and the in-progress `exports` object *before* running
//! a module's body, so a module further down the call stack that requires
//! its way back to an ancestor gets the ancestor's partially-populated
//! `exports` instead of recursing into the loader again.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

use boa_engine::JsValue;

/// One loaded (or loading) CommonJS module.
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    pub id: PathBuf,
    pub exports: JsValue,
    pub loaded: bool,
}

/// Backing store for `require.cache` (the require_cache, in spec.md's
/// terms). Keyed by resolved absolute path.
///
/// Holds live `JsValue`s in a plain `RefCell`, not behind `Trace` — Boa's
/// `Gc` keeps them alive by reference count same as anything else holding a
/// clone, and this cache never runs on a thread other than the one that
/// owns the `Context` it was built from.
#[derive(Default)]
pub struct ModuleCache {
    records: RefCell<HashMap<PathBuf, ModuleRecord>>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &PathBuf) -> Option<ModuleRecord> {
        self.records.borrow().get(id).cloned()
    }

    pub fn contains(&self, id: &PathBuf) -> bool {
        self.records.borrow().contains_key(id)
    }

    /// Register the placeholder record a module gets before its body runs.
    pub fn insert_loading(&self, id: PathBuf, exports: JsValue) {
        self.records.borrow_mut().insert(id.clone(), ModuleRecord { id, exports, loaded: false });
    }

    /// Flip a record to loaded once its body has finished executing,
    /// recording the final `module.exports` value.
    pub fn mark_loaded(&self, id: &PathBuf, exports: JsValue) {
        if let Some(record) = self.records.borrow_mut().get_mut(id) {
            record.exports = exports;
            record.loaded = true;
        }
    }

    /// Drop a record whose body threw, so a later `require` of the same
    /// path retries instead of permanently caching a half-built `exports`.
    pub fn remove(&self, id: &PathBuf) {
        self.records.borrow_mut().remove(id);
    }

    /// Every path currently in `require.cache`, for diagnostics/tests.
    pub fn ids(&self) -> Vec<PathBuf> {
        self.records.borrow().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circular_require_observes_partial_exports() {
        let cache = ModuleCache::new();
        let id = PathBuf::from("/project/a.js");
        cache.insert_loading(id.clone(), JsValue::undefined());
        let record = cache.get(&id).expect("record present while loading");
        assert!(!record.loaded);

        cache.mark_loaded(&id, JsValue::from(1));
        let record = cache.get(&id).expect("record present after load");
        assert!(record.loaded);
    }

    #[test]
    fn failed_load_is_evictable() {
        let cache = ModuleCache::new();
        let id = PathBuf::from("/project/b.js");
        cache.insert_loading(id.clone(), JsValue::undefined());
        cache.remove(&id);
        assert!(!cache.contains(&id));
    }
}

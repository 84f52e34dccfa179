//! Optional process-wide default registry
//!
//! A thin holder for one explicitly built [`Registry`]. Install it once during startup,
//! tear it down at shutdown (or between tests). Code that can take a `&Registry` should.

use super::Registry;
use once_cell::sync::Lazy;
use std::sync::{Arc, PoisonError, RwLock};

static DEFAULT_REGISTRY: Lazy<RwLock<Option<Arc<Registry>>>> = Lazy::new(|| RwLock::new(None));

/// Install `registry` as the default, returning the previous one
pub fn install(registry: Registry) -> Option<Arc<Registry>> {
    let mut slot = DEFAULT_REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    slot.replace(Arc::new(registry))
}

/// The installed default, if any
pub fn registry() -> Option<Arc<Registry>> {
    DEFAULT_REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Remove the default, returning it
pub fn teardown() -> Option<Arc<Registry>> {
    DEFAULT_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
}

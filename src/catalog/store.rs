// Copyright (c) 2025 - Cowboy AI, Inc.
//! Shared catalog handle with whole-table reload

use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

use super::SignatureCatalog;

/// Holds the current catalog snapshot
///
/// Readers take an `Arc` snapshot and never observe a partially replaced
/// table: [`reload`](Self::reload) swaps the snapshot under the write lock.
#[derive(Debug, Default)]
pub struct CatalogStore {
    current: RwLock<Arc<SignatureCatalog>>,
}

impl CatalogStore {
    pub fn new(catalog: SignatureCatalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    /// Current catalog snapshot
    pub fn snapshot(&self) -> Arc<SignatureCatalog> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Replace the catalog, returning the previous snapshot
    pub fn reload(&self, catalog: SignatureCatalog) -> Arc<SignatureCatalog> {
        let replacement = Arc::new(catalog);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        info!("Reloading signature catalog ({} breeds)", replacement.len());
        std::mem::replace(&mut *guard, replacement)
    }
}

// Copyright (c) 2025 - Cowboy AI, Inc.
//! Configuration Items
//!
//! An item is a named, typed configuration object whose mutable fields are
//! guarded by [`field::FieldContract`]s. Items carry an immutable [`ItemId`]
//! that alone defines equality and hashing: two items with identical fields
//! but different ids are different items, and a clone is never equal to its
//! source.
//!
//! # Collaborators
//!
//! - [`ItemServices`] bundles the shared signature catalog and the boot file
//!   probe every item validates against.
//! - [`ItemLookup`] resolves by-name parent references on demand; items never
//!   own or borrow their parent.

pub mod distro;
pub mod field;
pub mod normalize;
pub mod resolver;

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::adapters::{BootFileProbe, LocalFileProbe};
use crate::catalog::{CatalogStore, SignatureCatalog};
use crate::config::CatalogConfig;
use crate::domain::Value;
use crate::errors::{CatalogResult, ItemResult};

pub use distro::Distro;
pub use field::{FieldContract, FieldContext, FieldSet, Shape};
pub use resolver::{BootLoaders, InheritanceResolver};

/// Immutable identity of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared collaborators items validate against
#[derive(Debug, Clone)]
pub struct ItemServices {
    catalog: Arc<SignatureCatalog>,
    probe: Arc<dyn BootFileProbe>,
}

impl ItemServices {
    /// Services over `catalog`, checking boot files on the local filesystem
    pub fn new(catalog: Arc<SignatureCatalog>) -> Self {
        Self {
            catalog,
            probe: Arc::new(LocalFileProbe),
        }
    }

    /// Load the catalog named by `config`
    pub fn from_config(config: &CatalogConfig) -> CatalogResult<Self> {
        let catalog = SignatureCatalog::load(&config.signature_path)?;
        Ok(Self::new(Arc::new(catalog)))
    }

    /// Services over the store's current catalog snapshot
    pub fn from_store(store: &CatalogStore) -> Self {
        Self::new(store.snapshot())
    }

    pub fn with_probe(mut self, probe: Arc<dyn BootFileProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn catalog(&self) -> &SignatureCatalog {
        &self.catalog
    }

    pub fn probe(&self) -> &dyn BootFileProbe {
        self.probe.as_ref()
    }
}

impl Default for ItemServices {
    fn default() -> Self {
        Self::new(Arc::new(SignatureCatalog::empty()))
    }
}

/// Common surface of configuration items
pub trait Item: Sized + 'static {
    /// Collection kind, e.g. `"distro"`
    const KIND: &'static str;

    fn uid(&self) -> ItemId;

    fn name(&self) -> &str;

    /// Name of the parent item, if any
    fn parent(&self) -> Option<&str>;

    /// Check mandatory invariants before persistence
    fn check_if_valid(&self) -> ItemResult<()>;

    /// Flatten validated state into a field-name keyed mapping
    fn to_dict(&self) -> BTreeMap<String, Value>;

    /// Independent duplicate with a fresh identity
    fn make_clone(&self) -> Self;

    /// Identity comparison against a value of any type
    ///
    /// Values that are not items of the same kind are never the same item.
    fn is_same_as(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<Self>()
            .is_some_and(|other| other.uid() == self.uid())
    }
}

/// By-name lookup into an owning collection
pub trait ItemLookup<T: Item> {
    fn find_item(&self, name: &str) -> Option<&T>;
}

impl<T: Item> ItemLookup<T> for HashMap<String, T> {
    fn find_item(&self, name: &str) -> Option<&T> {
        self.get(name)
    }
}

impl<T: Item> ItemLookup<T> for BTreeMap<String, T> {
    fn find_item(&self, name: &str) -> Option<&T> {
        self.get(name)
    }
}

impl<T: Item> ItemLookup<T> for [T] {
    fn find_item(&self, name: &str) -> Option<&T> {
        self.iter().find(|item| item.name() == name)
    }
}

impl<T: Item> ItemLookup<T> for Vec<T> {
    fn find_item(&self, name: &str) -> Option<&T> {
        self.as_slice().find_item(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_ids_are_unique() {
        let a = ItemId::new();
        let b = ItemId::new();
        assert_ne!(a, b);
        assert_eq!(ItemId::parse(&a.to_string()).unwrap(), a);
        assert!(ItemId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn test_default_services_have_no_catalog() {
        let services = ItemServices::default();
        assert!(!services.catalog().is_loaded());
    }
}

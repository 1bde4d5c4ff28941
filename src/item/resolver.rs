// Copyright (c) 2025 - Cowboy AI, Inc.
//! Capability Resolution
//!
//! Resolves the effective boot loader capabilities of a distro from its
//! breed, its architecture, the signature catalog and, when the distro sets
//! neither breed nor architecture, its parent chain.
//!
//! # Boot Loader States
//!
//! ```text
//!                 assign ""  / []
//!   ┌──────────────────────────────────────┐
//!   ▼                                      │
//! Unresolved ──assign validated list──> Explicit
//!   │                                      │
//!   └─ read: SupportedBootLoaders          └─ read: stored list verbatim
//! ```

use std::collections::HashSet;

use super::{Distro, Item, ItemLookup};
use crate::errors::{ItemError, ItemResult};

/// Boot loader selection of a distro
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootLoaders {
    /// Deferred to capability resolution
    Unresolved,
    /// Validated explicit list, read back verbatim
    Explicit(Vec<String>),
}

impl BootLoaders {
    /// State for a stored list; an empty list is unresolved
    pub fn from_stored(list: Vec<String>) -> Self {
        if list.is_empty() {
            Self::Unresolved
        } else {
            Self::Explicit(list)
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, Self::Explicit(_))
    }
}

/// Walks parent chains through a collection lookup
pub struct InheritanceResolver<'a, L: ?Sized> {
    lookup: &'a L,
}

impl<'a, L> InheritanceResolver<'a, L>
where
    L: ItemLookup<Distro> + ?Sized,
{
    pub fn new(lookup: &'a L) -> Self {
        Self { lookup }
    }

    /// Parent of `distro`, looked up by name
    pub fn parent_of(&self, distro: &Distro) -> ItemResult<Option<&'a Distro>> {
        match distro.parent() {
            None => Ok(None),
            Some(name) => self
                .lookup
                .find_item(name)
                .map(Some)
                .ok_or_else(|| ItemError::ParentNotFound(name.to_string())),
        }
    }

    /// The distro whose breed and architecture decide the capabilities
    ///
    /// That is `distro` itself unless it sets neither breed nor architecture
    /// and has a parent, in which case the search continues up the chain.
    pub fn capability_source<'b>(&'b self, distro: &'b Distro) -> ItemResult<&'b Distro>
    where
        'a: 'b,
    {
        let mut seen = HashSet::new();
        seen.insert(distro.uid());
        let mut current = distro;
        loop {
            if !current.breed().is_empty() || current.arch().is_some() {
                return Ok(current);
            }
            let Some(parent) = self.parent_of(current)? else {
                return Ok(current);
            };
            if !seen.insert(parent.uid()) {
                return Err(ItemError::ParentLoop(parent.name().to_string()));
            }
            current = parent;
        }
    }

    /// Supported boot loaders, inherited through the parent chain
    pub fn supported_boot_loaders(&self, distro: &Distro) -> ItemResult<Vec<String>> {
        Ok(self.capability_source(distro)?.supported_boot_loaders())
    }

    /// Effective boot loaders: the explicit list, or the inherited capabilities
    pub fn boot_loaders(&self, distro: &Distro) -> ItemResult<Vec<String>> {
        match distro.boot_loaders_state() {
            BootLoaders::Explicit(list) => Ok(list),
            BootLoaders::Unresolved => self.supported_boot_loaders(distro),
        }
    }
}

//! Configuration items for network-boot provisioning in the Composable Information Machine
//!
//! This crate provides the validated configuration-item core: the field
//! contracts enforced on every item write, the signature catalog that decides
//! which OS versions and boot loaders a breed supports, identity-based item
//! equality, cloning and serialization.

pub mod adapters;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod item;

// Re-export commonly used types
pub use catalog::{BreedSignature, CatalogStore, SignatureCatalog};
pub use config::CatalogConfig;
pub use domain::{Arch, Value};
pub use errors::{CatalogError, CatalogResult, ErrorKind, ItemError, ItemResult};
pub use item::{Distro, InheritanceResolver, Item, ItemId, ItemLookup, ItemServices};

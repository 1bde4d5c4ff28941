// Copyright (c) 2025 - Cowboy AI, Inc.
//! Distro Item
//!
//! A distro describes a bootable OS image: the kernel and initrd it boots,
//! the OS family ("breed") and version it belongs to, the architecture it
//! targets and the boot loaders that may load it. Its validated state drives
//! boot-loader configuration and installer templating downstream.
//!
//! # Invariants
//! - Equality and hashing use only the item id
//! - Every field write is all-or-nothing
//! - An explicit boot loader list is always a subset of the loaders the
//!   catalog supports for the current breed and architecture
//! - A non-empty OS version belongs to its breed when the breed is known
//! - Kernel and initrd paths match the current breed's file name patterns
//!
//! Changing breed or architecture re-checks the fields validated against
//! them; a change that would break one of them is rejected.
//!
//! # Examples
//!
//! ```rust
//! use cim_provisioning::item::{Distro, ItemServices};
//! use cim_provisioning::domain::Arch;
//!
//! let services = ItemServices::default();
//! let mut distro = Distro::new(&services);
//! distro.set_name("rhel9-x86_64").unwrap();
//! distro.set_arch("x86_64").unwrap();
//! assert_eq!(distro.arch(), Some(Arch::X86_64));
//!
//! assert!(distro.set_arch("Test").is_err());
//! assert_eq!(distro.arch(), Some(Arch::X86_64));
//! ```

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::path::Path;
use tracing::{debug, warn};

use super::field::{FieldContext, FieldContract, FieldSet, Shape};
use super::normalize::{label_to_arch, string_to_list, string_to_map};
use super::resolver::BootLoaders;
use super::{Item, ItemId, ItemLookup, ItemServices};
use crate::domain::{Arch, Value};
use crate::errors::{ItemError, ItemResult};

/// Keys reserved for templating metadata; both always appear in `to_dict`
pub const AUTOINSTALL_META: &str = "autoinstall_meta";
pub const KS_META: &str = "ks_meta";

const STR: &[Shape] = &[Shape::Str];
const STR_OR_ARCH: &[Shape] = &[Shape::Str, Shape::Arch];
const STR_OR_LIST: &[Shape] = &[Shape::Str, Shape::StrList];
const MAP_OR_STR: &[Shape] = &[Shape::Map, Shape::Str];
const MAP: &[Shape] = &[Shape::Map];
const NUMBER: &[Shape] = &[Shape::Int, Shape::Float];

fn empty_str() -> Value {
    Value::from("")
}

fn zero() -> Value {
    Value::Float(0.0)
}

/// Field contracts of a distro, in assignment order for deserialization
pub static DISTRO_FIELDS: &[FieldContract] = &[
    FieldContract::new("arch", STR_OR_ARCH, Value::default)
        .normalized_by(label_to_arch)
        .validated_by(validate_arch),
    FieldContract::new("breed", STR, empty_str).validated_by(validate_breed),
    FieldContract::new("os_version", STR, empty_str).validated_by(validate_os_version),
    FieldContract::new("boot_loaders", STR_OR_LIST, Value::empty_list)
        .normalized_by(string_to_list)
        .validated_by(validate_boot_loaders),
    FieldContract::new("kernel", STR, empty_str).validated_by(validate_kernel),
    FieldContract::new("initrd", STR, empty_str).validated_by(validate_initrd),
    FieldContract::new("remote_boot_kernel", STR, empty_str),
    FieldContract::new("remote_boot_initrd", STR, empty_str),
    FieldContract::new("remote_grub_kernel", STR, empty_str),
    FieldContract::new("remote_grub_initrd", STR, empty_str),
    FieldContract::new("fetchable_files", MAP_OR_STR, Value::empty_map)
        .normalized_by(string_to_map),
    FieldContract::new("boot_files", MAP_OR_STR, Value::empty_map).normalized_by(string_to_map),
    FieldContract::new("template_files", MAP_OR_STR, Value::empty_map)
        .normalized_by(string_to_map),
    FieldContract::new("kernel_options", MAP_OR_STR, Value::empty_map)
        .normalized_by(string_to_map),
    FieldContract::new("kernel_options_post", MAP_OR_STR, Value::empty_map)
        .normalized_by(string_to_map),
    FieldContract::new(AUTOINSTALL_META, MAP_OR_STR, Value::empty_map)
        .normalized_by(string_to_map),
    FieldContract::new("mgmt_classes", STR_OR_LIST, Value::empty_list)
        .normalized_by(string_to_list),
    FieldContract::new("mgmt_parameters", MAP, Value::empty_map),
    FieldContract::new("owners", STR_OR_LIST, Value::empty_list).normalized_by(string_to_list),
    FieldContract::new("source_repos", STR_OR_LIST, Value::empty_list)
        .normalized_by(string_to_list),
    FieldContract::new("redhat_management_key", STR, empty_str),
    FieldContract::new("tree_build_time", NUMBER, zero),
    FieldContract::new("comment", STR, empty_str),
];

fn validate_breed(field: &'static str, value: &Value, ctx: &FieldContext<'_>) -> ItemResult<()> {
    let breed = value.as_str().unwrap_or("");
    if !breed.is_empty() && ctx.catalog.is_loaded() && ctx.catalog.breed(breed).is_none() {
        return Err(ItemError::constraint(
            field,
            format!("unknown breed '{breed}'"),
        ));
    }

    let version = ctx.fields.str_value("os_version");
    if let Some(signature) = ctx.catalog.breed(breed) {
        if !version.is_empty() && !signature.has_version(version) {
            return Err(ItemError::constraint(
                field,
                format!("breed '{breed}' does not know the current OS version '{version}'"),
            ));
        }
    }

    for (path_field, pattern) in [
        ("kernel", ctx.catalog.kernel_pattern(breed)),
        ("initrd", ctx.catalog.initrd_pattern(breed)),
    ] {
        let path = ctx.fields.str_value(path_field);
        if !path.is_empty() && !ctx.probe.is_boot_file(Path::new(path), pattern) {
            return Err(ItemError::constraint(
                field,
                format!(
                    "current {path_field} '{path}' does not match '{}' of breed '{breed}'",
                    pattern.as_str()
                ),
            ));
        }
    }

    check_stored_boot_loaders(field, ctx, breed, ctx.arch())
}

fn validate_arch(field: &'static str, value: &Value, ctx: &FieldContext<'_>) -> ItemResult<()> {
    check_stored_boot_loaders(field, ctx, ctx.breed(), value.as_arch())
}

/// Stored explicit boot loaders must stay supported under a pending
/// breed/architecture change
fn check_stored_boot_loaders(
    field: &'static str,
    ctx: &FieldContext<'_>,
    breed: &str,
    arch: Option<Arch>,
) -> ItemResult<()> {
    let stored = ctx
        .fields
        .get("boot_loaders")
        .and_then(Value::to_string_list)
        .unwrap_or_default();
    let supported = ctx.catalog.supported_boot_loaders(breed, arch);
    let unsupported: Vec<&str> = stored
        .iter()
        .filter(|loader| !supported.contains(loader))
        .map(String::as_str)
        .collect();
    if !unsupported.is_empty() {
        return Err(ItemError::constraint(
            field,
            format!(
                "current boot loaders [{}] would be unsupported, supported are [{}]",
                unsupported.join(", "),
                supported.join(", ")
            ),
        ));
    }
    Ok(())
}

fn validate_os_version(
    field: &'static str,
    value: &Value,
    ctx: &FieldContext<'_>,
) -> ItemResult<()> {
    let version = value.as_str().unwrap_or("");
    if version.is_empty() {
        return Ok(());
    }
    match ctx.breed_signature() {
        Some(signature) if !signature.has_version(version) => Err(ItemError::constraint(
            field,
            format!(
                "'{version}' is not a known version of breed '{}'",
                signature.name()
            ),
        )),
        _ => Ok(()),
    }
}

fn validate_boot_loaders(
    field: &'static str,
    value: &Value,
    ctx: &FieldContext<'_>,
) -> ItemResult<()> {
    let requested = value.to_string_list().unwrap_or_default();
    if requested.is_empty() {
        return Ok(());
    }
    let supported = ctx.catalog.supported_boot_loaders(ctx.breed(), ctx.arch());
    let unsupported: Vec<&str> = requested
        .iter()
        .filter(|loader| !supported.contains(loader))
        .map(String::as_str)
        .collect();
    if !unsupported.is_empty() {
        return Err(ItemError::constraint(
            field,
            format!(
                "unsupported boot loaders [{}], supported are [{}]",
                unsupported.join(", "),
                supported.join(", ")
            ),
        ));
    }
    Ok(())
}

fn validate_boot_file(
    field: &'static str,
    value: &Value,
    ctx: &FieldContext<'_>,
    pattern: &regex::Regex,
) -> ItemResult<()> {
    let path = value.as_str().unwrap_or("");
    if path.is_empty() {
        return Err(ItemError::constraint(field, "path must not be empty"));
    }
    if !ctx.probe.is_boot_file(Path::new(path), pattern) {
        return Err(ItemError::constraint(
            field,
            format!(
                "'{path}' is not an existing file matching '{}'",
                pattern.as_str()
            ),
        ));
    }
    Ok(())
}

fn validate_kernel(field: &'static str, value: &Value, ctx: &FieldContext<'_>) -> ItemResult<()> {
    validate_boot_file(field, value, ctx, ctx.catalog.kernel_pattern(ctx.breed()))
}

fn validate_initrd(field: &'static str, value: &Value, ctx: &FieldContext<'_>) -> ItemResult<()> {
    validate_boot_file(field, value, ctx, ctx.catalog.initrd_pattern(ctx.breed()))
}

fn is_valid_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':' | '+'))
}

fn timestamp(time: &DateTime<Utc>) -> Value {
    Value::Float(time.timestamp_millis() as f64 / 1000.0)
}

fn from_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_f64()
        .and_then(|secs| DateTime::from_timestamp_millis((secs * 1000.0).round() as i64))
}

static NO_ENTRIES: BTreeMap<String, Value> = BTreeMap::new();

/// Bootable OS image configuration item
#[derive(Debug)]
pub struct Distro {
    uid: ItemId,
    name: String,
    parent: Option<String>,
    fields: FieldSet,
    services: ItemServices,
    ctime: DateTime<Utc>,
    mtime: DateTime<Utc>,
}

impl Distro {
    /// Create a distro with every field at its default
    pub fn new(services: &ItemServices) -> Self {
        let now = Utc::now();
        Self {
            uid: ItemId::new(),
            name: String::new(),
            parent: None,
            fields: FieldSet::new(DISTRO_FIELDS),
            services: services.clone(),
            ctime: now,
            mtime: now,
        }
    }

    /// Rebuild a distro from a serialized mapping
    ///
    /// Fields are assigned through their contracts in declaration order, so
    /// breed and architecture are in place before the fields validated
    /// against them. Values equal to a field's default are skipped. `ks_meta`
    /// is read as `autoinstall_meta` when the latter is absent; unknown keys
    /// are ignored.
    pub fn from_dict(
        services: &ItemServices,
        dict: &BTreeMap<String, Value>,
    ) -> ItemResult<Self> {
        let mut distro = Self::new(services);

        if let Some(uid) = dict
            .get("uid")
            .and_then(Value::as_str)
            .and_then(|s| ItemId::parse(s).ok())
        {
            distro.uid = uid;
        }
        if let Some(name) = dict.get("name") {
            distro.set_name(name.clone())?;
        }
        if let Some(parent) = dict.get("parent") {
            distro.set_parent(parent.clone())?;
        }

        for contract in DISTRO_FIELDS {
            let value = match dict.get(contract.name) {
                Some(value) => value,
                None if contract.name == AUTOINSTALL_META => match dict.get(KS_META) {
                    Some(value) => value,
                    None => continue,
                },
                None => continue,
            };
            if *value == (contract.default)() {
                continue;
            }
            distro.set(contract.name, value.clone())?;
        }

        for key in dict.keys() {
            let reserved = matches!(
                key.as_str(),
                "uid" | "name" | "parent" | "ctime" | "mtime" | KS_META
            );
            if !reserved && distro.fields.contract(key).is_none() {
                warn!("Ignoring unknown key '{}' while loading distro", key);
            }
        }

        if let Some(ctime) = dict.get("ctime").and_then(from_timestamp) {
            distro.ctime = ctime;
        }
        distro.mtime = dict
            .get("mtime")
            .and_then(from_timestamp)
            .unwrap_or(distro.ctime);

        Ok(distro)
    }

    /// Assign any field by name
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> ItemResult<()> {
        match field {
            "name" => self.set_name(value),
            "parent" => self.set_parent(value),
            "uid" | "ctime" | "mtime" | KS_META => Err(ItemError::constraint(
                field,
                "field cannot be assigned directly",
            )),
            _ => {
                self.fields.assign(
                    field,
                    value.into(),
                    self.services.catalog(),
                    self.services.probe(),
                )?;
                self.touch();
                Ok(())
            }
        }
    }

    /// Stored value of a contract field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn services(&self) -> &ItemServices {
        &self.services
    }

    pub fn ctime(&self) -> DateTime<Utc> {
        self.ctime
    }

    pub fn mtime(&self) -> DateTime<Utc> {
        self.mtime
    }

    fn touch(&mut self) {
        self.mtime = Utc::now();
    }

    fn str_field(&self, field: &str) -> &str {
        self.fields.str_value(field)
    }

    fn list_field(&self, field: &str) -> Vec<String> {
        self.get(field)
            .and_then(Value::to_string_list)
            .unwrap_or_default()
    }

    fn map_field(&self, field: &str) -> &BTreeMap<String, Value> {
        self.get(field).and_then(Value::as_map).unwrap_or(&NO_ENTRIES)
    }

    /// Set the name
    ///
    /// Names may be empty until [`check_if_valid`](Item::check_if_valid);
    /// otherwise they contain only ASCII alphanumerics and `_ - . : +`.
    pub fn set_name(&mut self, name: impl Into<Value>) -> ItemResult<()> {
        let name = match name.into() {
            Value::Str(name) => name,
            other => {
                return Err(ItemError::TypeMismatch {
                    field: "name".into(),
                    expected: "string".into(),
                    received: other.kind_name(),
                })
            }
        };
        if !is_valid_name(&name) {
            return Err(ItemError::constraint(
                "name",
                format!("'{name}' contains characters other than alphanumerics and _-.:+"),
            ));
        }
        if !name.is_empty() && self.parent.as_deref() == Some(name.as_str()) {
            return Err(ItemError::constraint("name", "an item cannot be its own parent"));
        }
        debug!(uid = %self.uid, name = %name, "Distro renamed");
        self.name = name;
        self.touch();
        Ok(())
    }

    /// Set the parent reference; an empty string or none clears it
    pub fn set_parent(&mut self, parent: impl Into<Value>) -> ItemResult<()> {
        let parent = match parent.into() {
            Value::None => None,
            Value::Str(name) if name.is_empty() => None,
            Value::Str(name) => Some(name),
            other => {
                return Err(ItemError::TypeMismatch {
                    field: "parent".into(),
                    expected: "string".into(),
                    received: other.kind_name(),
                })
            }
        };
        if parent.as_deref().is_some_and(|p| p == self.name) {
            return Err(ItemError::constraint("parent", "an item cannot be its own parent"));
        }
        self.parent = parent;
        self.touch();
        Ok(())
    }

    /// Resolve the parent through the owning collection
    pub fn parent_item<'l, L>(&self, lookup: &'l L) -> ItemResult<Option<&'l Distro>>
    where
        L: ItemLookup<Distro> + ?Sized,
    {
        super::InheritanceResolver::new(lookup).parent_of(self)
    }

    pub fn set_arch(&mut self, arch: impl Into<Value>) -> ItemResult<()> {
        self.set("arch", arch)
    }

    /// Architecture, `None` until set
    pub fn arch(&self) -> Option<Arch> {
        self.get("arch").and_then(Value::as_arch)
    }

    pub fn set_breed(&mut self, breed: impl Into<Value>) -> ItemResult<()> {
        self.set("breed", breed)
    }

    /// Breed, empty when unset
    pub fn breed(&self) -> &str {
        self.str_field("breed")
    }

    pub fn set_os_version(&mut self, os_version: impl Into<Value>) -> ItemResult<()> {
        self.set("os_version", os_version)
    }

    pub fn os_version(&self) -> &str {
        self.str_field("os_version")
    }

    /// Assign boot loaders; `""` (or an empty list) defers to resolution
    pub fn set_boot_loaders(&mut self, boot_loaders: impl Into<Value>) -> ItemResult<()> {
        self.set("boot_loaders", boot_loaders)
    }

    /// Stored boot loader list, empty when unresolved
    pub fn boot_loaders(&self) -> Vec<String> {
        self.list_field("boot_loaders")
    }

    pub fn boot_loaders_state(&self) -> BootLoaders {
        BootLoaders::from_stored(self.boot_loaders())
    }

    /// Boot loaders in effect: the explicit list, or the supported set
    pub fn resolved_boot_loaders(&self) -> Vec<String> {
        match self.boot_loaders_state() {
            BootLoaders::Explicit(list) => list,
            BootLoaders::Unresolved => self.supported_boot_loaders(),
        }
    }

    /// Boot loaders the catalog allows for this breed and architecture
    pub fn supported_boot_loaders(&self) -> Vec<String> {
        self.services
            .catalog()
            .supported_boot_loaders(self.breed(), self.arch())
    }

    pub fn set_kernel(&mut self, kernel: impl Into<Value>) -> ItemResult<()> {
        self.set("kernel", kernel)
    }

    pub fn kernel(&self) -> &str {
        self.str_field("kernel")
    }

    pub fn set_initrd(&mut self, initrd: impl Into<Value>) -> ItemResult<()> {
        self.set("initrd", initrd)
    }

    pub fn initrd(&self) -> &str {
        self.str_field("initrd")
    }

    pub fn set_remote_boot_kernel(&mut self, url: impl Into<Value>) -> ItemResult<()> {
        self.set("remote_boot_kernel", url)
    }

    pub fn remote_boot_kernel(&self) -> &str {
        self.str_field("remote_boot_kernel")
    }

    pub fn set_remote_boot_initrd(&mut self, url: impl Into<Value>) -> ItemResult<()> {
        self.set("remote_boot_initrd", url)
    }

    pub fn remote_boot_initrd(&self) -> &str {
        self.str_field("remote_boot_initrd")
    }

    pub fn set_remote_grub_kernel(&mut self, path: impl Into<Value>) -> ItemResult<()> {
        self.set("remote_grub_kernel", path)
    }

    pub fn remote_grub_kernel(&self) -> &str {
        self.str_field("remote_grub_kernel")
    }

    pub fn set_remote_grub_initrd(&mut self, path: impl Into<Value>) -> ItemResult<()> {
        self.set("remote_grub_initrd", path)
    }

    pub fn remote_grub_initrd(&self) -> &str {
        self.str_field("remote_grub_initrd")
    }

    pub fn set_fetchable_files(&mut self, files: impl Into<Value>) -> ItemResult<()> {
        self.set("fetchable_files", files)
    }

    pub fn fetchable_files(&self) -> &BTreeMap<String, Value> {
        self.map_field("fetchable_files")
    }

    pub fn set_boot_files(&mut self, files: impl Into<Value>) -> ItemResult<()> {
        self.set("boot_files", files)
    }

    pub fn boot_files(&self) -> &BTreeMap<String, Value> {
        self.map_field("boot_files")
    }

    pub fn template_files(&self) -> &BTreeMap<String, Value> {
        self.map_field("template_files")
    }

    pub fn set_kernel_options(&mut self, options: impl Into<Value>) -> ItemResult<()> {
        self.set("kernel_options", options)
    }

    pub fn kernel_options(&self) -> &BTreeMap<String, Value> {
        self.map_field("kernel_options")
    }

    pub fn kernel_options_post(&self) -> &BTreeMap<String, Value> {
        self.map_field("kernel_options_post")
    }

    pub fn set_autoinstall_meta(&mut self, meta: impl Into<Value>) -> ItemResult<()> {
        self.set(AUTOINSTALL_META, meta)
    }

    pub fn autoinstall_meta(&self) -> &BTreeMap<String, Value> {
        self.map_field(AUTOINSTALL_META)
    }

    pub fn mgmt_parameters(&self) -> &BTreeMap<String, Value> {
        self.map_field("mgmt_parameters")
    }

    pub fn set_mgmt_classes(&mut self, classes: impl Into<Value>) -> ItemResult<()> {
        self.set("mgmt_classes", classes)
    }

    pub fn mgmt_classes(&self) -> Vec<String> {
        self.list_field("mgmt_classes")
    }

    pub fn set_owners(&mut self, owners: impl Into<Value>) -> ItemResult<()> {
        self.set("owners", owners)
    }

    pub fn owners(&self) -> Vec<String> {
        self.list_field("owners")
    }

    pub fn set_source_repos(&mut self, repos: impl Into<Value>) -> ItemResult<()> {
        self.set("source_repos", repos)
    }

    pub fn source_repos(&self) -> Vec<String> {
        self.list_field("source_repos")
    }

    pub fn set_redhat_management_key(&mut self, key: impl Into<Value>) -> ItemResult<()> {
        self.set("redhat_management_key", key)
    }

    pub fn redhat_management_key(&self) -> &str {
        self.str_field("redhat_management_key")
    }

    pub fn set_tree_build_time(&mut self, time: impl Into<Value>) -> ItemResult<()> {
        self.set("tree_build_time", time)
    }

    /// Tree build time in seconds since the epoch
    pub fn tree_build_time(&self) -> f64 {
        self.get("tree_build_time")
            .and_then(Value::as_f64)
            .unwrap_or_default()
    }

    pub fn set_comment(&mut self, comment: impl Into<Value>) -> ItemResult<()> {
        self.set("comment", comment)
    }

    pub fn comment(&self) -> &str {
        self.str_field("comment")
    }

    /// Serialized mapping as JSON
    pub fn to_json(&self) -> serde_json::Value {
        Value::Map(self.to_dict()).to_json()
    }
}

impl Item for Distro {
    const KIND: &'static str = "distro";

    fn uid(&self) -> ItemId {
        self.uid
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    fn check_if_valid(&self) -> ItemResult<()> {
        if self.name.is_empty() {
            return Err(ItemError::Validation(format!(
                "{} {} has no name",
                Self::KIND,
                self.uid
            )));
        }
        Ok(())
    }

    fn to_dict(&self) -> BTreeMap<String, Value> {
        let mut dict: BTreeMap<String, Value> = self
            .fields
            .iter()
            .map(|(name, value)| (name.to_string(), value.flatten()))
            .collect();

        dict.insert("uid".into(), Value::from(self.uid.to_string()));
        dict.insert("name".into(), Value::from(self.name.clone()));
        dict.insert(
            "parent".into(),
            Value::from(self.parent.clone().unwrap_or_default()),
        );
        dict.insert("ctime".into(), timestamp(&self.ctime));
        dict.insert("mtime".into(), timestamp(&self.mtime));

        let meta = dict
            .get(AUTOINSTALL_META)
            .cloned()
            .unwrap_or_else(Value::empty_map);
        dict.insert(KS_META.into(), meta.clone());
        dict.insert(AUTOINSTALL_META.into(), meta);
        dict
    }

    fn make_clone(&self) -> Self {
        let now = Utc::now();
        let clone = Self {
            uid: ItemId::new(),
            name: self.name.clone(),
            parent: self.parent.clone(),
            fields: self.fields.clone(),
            services: self.services.clone(),
            ctime: now,
            mtime: now,
        };
        debug!(source = %self.uid, clone = %clone.uid, "Cloned distro");
        clone
    }
}

impl PartialEq for Distro {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
    }
}

impl Eq for Distro {}

impl Hash for Distro {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uid.hash(state);
    }
}

// Copyright (c) 2025 - Cowboy AI, Inc.
//! Signature Catalog
//!
//! Read-only table of per-breed capabilities: which OS versions a breed
//! knows, which boot loaders it supports on each architecture, and how its
//! kernel and initrd files are named.
//!
//! # Document Format
//!
//! ```json
//! {
//!   "suse": {
//!     "boot_loaders": { "default": ["grub", "pxe", "ipxe"], "ppc64le": ["grub"] },
//!     "versions": ["sles15generic", "opensuse15generic"],
//!     "kernel_file": "(linux|vmlinuz(.*))",
//!     "initrd_file": "initrd(.*)"
//!   }
//! }
//! ```
//!
//! # Lifecycle
//!
//! A catalog is loaded once at process start and then shared immutably
//! behind an `Arc`. Replacing it goes through [`CatalogStore::reload`], which
//! swaps the whole table under a write lock; items keep the snapshot they
//! were created with.

pub mod store;

use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::domain::Arch;
use crate::errors::{CatalogError, CatalogResult};

pub use store::CatalogStore;

/// Boot loaders assumed when the breed is unset or unknown
pub const FALLBACK_BOOT_LOADERS: [&str; 4] = ["grub", "pxe", "yaboot", "ipxe"];

/// Kernel file name pattern for breeds without their own
pub const DEFAULT_KERNEL_PATTERN: &str =
    r"(vmlinu[xz]|(kernel|linux(\.img)?)|pxeboot\.n12|wimboot|mboot\.c32|.+\.kernel)";

/// Initrd file name pattern for breeds without their own
pub const DEFAULT_INITRD_PATTERN: &str =
    r"(initrd(.*)\.img|ramdisk\.image\.gz|boot\.sdi|imgpayld\.tgz)";

/// Key under `boot_loaders` holding the breed-wide list
const DEFAULT_ARCH_KEY: &str = "default";

fn fallback_boot_loaders() -> Vec<String> {
    FALLBACK_BOOT_LOADERS.iter().map(|s| s.to_string()).collect()
}

/// Compile a file name pattern anchored at the start of the name
fn compile_file_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})"))
}

fn default_kernel_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        compile_file_pattern(DEFAULT_KERNEL_PATTERN).expect("default kernel pattern compiles")
    })
}

fn default_initrd_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        compile_file_pattern(DEFAULT_INITRD_PATTERN).expect("default initrd pattern compiles")
    })
}

/// Capabilities of a single OS family
#[derive(Debug, Clone)]
pub struct BreedSignature {
    name: String,
    os_versions: BTreeSet<String>,
    boot_loaders: BTreeMap<Arch, Vec<String>>,
    boot_loaders_default: Vec<String>,
    kernel_pattern: Option<Regex>,
    initrd_pattern: Option<Regex>,
}

impl BreedSignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            os_versions: BTreeSet::new(),
            boot_loaders: BTreeMap::new(),
            boot_loaders_default: Vec::new(),
            kernel_pattern: None,
            initrd_pattern: None,
        }
    }

    pub fn with_versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.os_versions.extend(versions.into_iter().map(Into::into));
        self
    }

    pub fn with_boot_loaders<I, S>(mut self, arch: Arch, loaders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.boot_loaders
            .insert(arch, loaders.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_default_boot_loaders<I, S>(mut self, loaders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.boot_loaders_default = loaders.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_kernel_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.kernel_pattern = Some(compile_file_pattern(pattern)?);
        Ok(self)
    }

    pub fn with_initrd_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.initrd_pattern = Some(compile_file_pattern(pattern)?);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn os_versions(&self) -> &BTreeSet<String> {
        &self.os_versions
    }

    pub fn has_version(&self, version: &str) -> bool {
        self.os_versions.contains(version)
    }

    /// Boot loaders for `arch`
    ///
    /// Uses the architecture-specific list when the breed declares one, then
    /// the breed-wide default list. A breed that declares neither falls back
    /// to [`FALLBACK_BOOT_LOADERS`].
    pub fn supported_boot_loaders(&self, arch: Option<Arch>) -> Vec<String> {
        if let Some(list) = arch.and_then(|arch| self.boot_loaders.get(&arch)) {
            return list.clone();
        }
        if !self.boot_loaders_default.is_empty() {
            return self.boot_loaders_default.clone();
        }
        fallback_boot_loaders()
    }

    pub fn kernel_pattern(&self) -> &Regex {
        self.kernel_pattern
            .as_ref()
            .unwrap_or_else(|| default_kernel_pattern())
    }

    pub fn initrd_pattern(&self) -> &Regex {
        self.initrd_pattern
            .as_ref()
            .unwrap_or_else(|| default_initrd_pattern())
    }

    fn from_document(name: &str, doc: BreedDocument) -> CatalogResult<Self> {
        let mut signature = Self::new(name).with_versions(doc.versions);
        for (key, loaders) in doc.boot_loaders {
            if key == DEFAULT_ARCH_KEY {
                signature.boot_loaders_default = loaders;
                continue;
            }
            let arch = Arch::from_label(&key).map_err(|_| CatalogError::UnknownArch {
                breed: name.to_string(),
                arch: key.clone(),
            })?;
            signature.boot_loaders.insert(arch, loaders);
        }
        let invalid = |source: regex::Error| CatalogError::InvalidPattern {
            breed: name.to_string(),
            source,
        };
        if let Some(pattern) = doc.kernel_file {
            signature = signature.with_kernel_pattern(&pattern).map_err(invalid)?;
        }
        if let Some(pattern) = doc.initrd_file {
            signature = signature.with_initrd_pattern(&pattern).map_err(invalid)?;
        }
        Ok(signature)
    }
}

/// Parsed form of one breed entry in the catalog document
#[derive(Debug, Deserialize)]
struct BreedDocument {
    #[serde(default)]
    boot_loaders: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    versions: Vec<String>,
    #[serde(default)]
    kernel_file: Option<String>,
    #[serde(default)]
    initrd_file: Option<String>,
}

/// Process-wide table of breed signatures
#[derive(Debug, Clone, Default)]
pub struct SignatureCatalog {
    breeds: BTreeMap<String, BreedSignature>,
}

impl SignatureCatalog {
    /// Catalog with no breeds: nothing has been loaded
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_breeds(breeds: impl IntoIterator<Item = BreedSignature>) -> Self {
        Self {
            breeds: breeds
                .into_iter()
                .map(|breed| (breed.name.clone(), breed))
                .collect(),
        }
    }

    /// Parse a catalog document
    pub fn from_json_str(document: &str) -> CatalogResult<Self> {
        let parsed: BTreeMap<String, BreedDocument> = serde_json::from_str(document)?;
        let breeds = parsed
            .into_iter()
            .map(|(name, doc)| BreedSignature::from_document(&name, doc))
            .collect::<CatalogResult<Vec<_>>>()?;
        Ok(Self::from_breeds(breeds))
    }

    /// Read and parse a catalog document from disk
    pub fn load(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&document)?;
        info!(
            "Loaded signature catalog from {} ({} breeds)",
            path.display(),
            catalog.len()
        );
        Ok(catalog)
    }

    pub fn is_loaded(&self) -> bool {
        !self.breeds.is_empty()
    }

    pub fn len(&self) -> usize {
        self.breeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breeds.is_empty()
    }

    pub fn breed(&self, name: &str) -> Option<&BreedSignature> {
        self.breeds.get(name)
    }

    pub fn breed_names(&self) -> impl Iterator<Item = &str> {
        self.breeds.keys().map(String::as_str)
    }

    /// Boot loaders legal for a breed/architecture pair
    ///
    /// An empty or unknown breed yields [`FALLBACK_BOOT_LOADERS`].
    pub fn supported_boot_loaders(&self, breed: &str, arch: Option<Arch>) -> Vec<String> {
        match self.breed(breed) {
            Some(signature) => {
                let loaders = signature.supported_boot_loaders(arch);
                debug!(breed, ?arch, ?loaders, "Resolved supported boot loaders");
                loaders
            }
            None => fallback_boot_loaders(),
        }
    }

    /// Kernel file pattern for a breed, or the default pattern
    pub fn kernel_pattern(&self, breed: &str) -> &Regex {
        self.breed(breed)
            .map_or_else(|| default_kernel_pattern(), BreedSignature::kernel_pattern)
    }

    /// Initrd file pattern for a breed, or the default pattern
    pub fn initrd_pattern(&self, breed: &str) -> &Regex {
        self.breed(breed)
            .map_or_else(|| default_initrd_pattern(), BreedSignature::initrd_pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "suse": {
            "boot_loaders": { "default": ["grub", "pxe", "ipxe"], "ppc64le": ["grub"] },
            "versions": ["sles15generic", "opensuse15generic"],
            "kernel_file": "(linux|vmlinuz(.*))",
            "initrd_file": "initrd(.*)"
        },
        "windows": {
            "versions": ["2019"]
        }
    }"#;

    #[test]
    fn test_empty_catalog_is_not_loaded() {
        let catalog = SignatureCatalog::empty();
        assert!(!catalog.is_loaded());
        assert_eq!(
            catalog.supported_boot_loaders("", None),
            vec!["grub", "pxe", "yaboot", "ipxe"]
        );
    }

    #[test]
    fn test_parse_document() {
        let catalog = SignatureCatalog::from_json_str(DOCUMENT).unwrap();
        assert!(catalog.is_loaded());
        assert_eq!(catalog.breed_names().collect::<Vec<_>>(), vec!["suse", "windows"]);

        let suse = catalog.breed("suse").unwrap();
        assert!(suse.has_version("sles15generic"));
        assert!(!suse.has_version("rhel9"));
    }

    #[test]
    fn test_arch_then_default_then_fallback() {
        let catalog = SignatureCatalog::from_json_str(DOCUMENT).unwrap();
        assert_eq!(
            catalog.supported_boot_loaders("suse", Some(Arch::Ppc64le)),
            vec!["grub"]
        );
        assert_eq!(
            catalog.supported_boot_loaders("suse", Some(Arch::X86_64)),
            vec!["grub", "pxe", "ipxe"]
        );
        assert_eq!(
            catalog.supported_boot_loaders("suse", None),
            vec!["grub", "pxe", "ipxe"]
        );
        assert_eq!(
            catalog.supported_boot_loaders("windows", Some(Arch::X86_64)),
            vec!["grub", "pxe", "yaboot", "ipxe"]
        );
        assert_eq!(
            catalog.supported_boot_loaders("nonexistent", Some(Arch::X86_64)),
            vec!["grub", "pxe", "yaboot", "ipxe"]
        );
    }

    #[test]
    fn test_file_patterns() {
        let catalog = SignatureCatalog::from_json_str(DOCUMENT).unwrap();
        assert!(catalog.kernel_pattern("suse").is_match("vmlinuz1"));
        assert!(catalog.kernel_pattern("suse").is_match("linux"));
        assert!(!catalog.kernel_pattern("suse").is_match("bzImage"));
        assert!(catalog.initrd_pattern("suse").is_match("initrd1.img"));

        assert!(catalog.kernel_pattern("windows").is_match("wimboot"));
        assert!(catalog.initrd_pattern("unknown").is_match("initrd.img"));
        assert!(!catalog.initrd_pattern("unknown").is_match("my-initrd.img"));
    }

    #[test]
    fn test_unknown_arch_key_is_rejected() {
        let err = SignatureCatalog::from_json_str(
            r#"{"suse": {"boot_loaders": {"amd64": ["grub"]}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownArch { ref arch, .. } if arch == "amd64"));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = SignatureCatalog::from_json_str(r#"{"suse": {"kernel_file": "(unclosed"}}"#)
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidPattern { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = SignatureCatalog::load("/nonexistent/distro_signatures.json").unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}

// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-provisioning
//!
//! Provides the signature catalog fixture, services bound to it and
//! kernel/initrd files on disk for the boot file checks.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

use cim_provisioning::item::ItemServices;
use cim_provisioning::{SignatureCatalog, Value};

/// Breeds declared by the fixture catalog
pub const BREEDS: [&str; 5] = ["redhat", "suse", "ubuntu", "windows", "unix"];

/// Kernel/initrd file names matching the suse patterns
pub const FK_KERNEL: &str = "vmlinuz1";
pub const FK_INITRD: &str = "initrd1.img";

/// Path of the fixture signature catalog
pub fn signatures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("distro_signatures.json")
}

/// Fixture catalog, parsed from disk
pub fn catalog() -> SignatureCatalog {
    SignatureCatalog::load(signatures_path()).expect("Invalid signature catalog fixture")
}

/// Services bound to the fixture catalog and the local filesystem
pub fn services() -> ItemServices {
    ItemServices::new(Arc::new(catalog()))
}

/// Services with no catalog loaded
pub fn bare_services() -> ItemServices {
    ItemServices::default()
}

/// Create a directory holding empty kernel and initrd files
pub fn create_kernel_initrd(kernel: &str, initrd: &str) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    File::create(dir.path().join(kernel)).expect("Failed to create kernel fixture");
    File::create(dir.path().join(initrd)).expect("Failed to create initrd fixture");
    dir
}

/// Serialized mapping without the identity and timestamp keys
pub fn content(mut dict: BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    for key in ["uid", "ctime", "mtime"] {
        dict.remove(key);
    }
    dict
}

/// Install a test subscriber once per test binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

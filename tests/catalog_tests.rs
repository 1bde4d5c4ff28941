// Copyright (c) 2025 - Cowboy AI, Inc.
//! Integration tests for loading and reloading the signature catalog

mod fixtures;

use pretty_assertions::assert_eq;
use std::sync::Arc;

use cim_provisioning::config::SIGNATURES_PATH_ENV;
use cim_provisioning::item::{Distro, ItemServices};
use cim_provisioning::{Arch, BreedSignature, CatalogConfig, CatalogError, CatalogStore, SignatureCatalog};

use fixtures::{catalog, init_tracing, signatures_path, BREEDS};

#[test]
fn test_fixture_catalog_breeds() {
    init_tracing();
    let catalog = catalog();
    let mut expected = BREEDS.to_vec();
    expected.sort_unstable();
    assert_eq!(catalog.breed_names().collect::<Vec<_>>(), expected);

    let redhat = catalog.breed("redhat").unwrap();
    assert!(redhat.has_version("rhel9"));
    assert_eq!(
        redhat.supported_boot_loaders(Some(Arch::Ppc64)),
        vec!["grub", "pxe", "yaboot"]
    );
    assert!(redhat.kernel_pattern().is_match("vmlinuz-5.14"));
    assert!(!redhat.initrd_pattern().is_match("initrd"));
}

#[test]
fn test_load_from_configured_path() -> anyhow::Result<()> {
    init_tracing();
    let config = CatalogConfig::from_vars(|name| {
        (name == SIGNATURES_PATH_ENV).then(|| signatures_path().to_string_lossy().into_owned())
    });

    assert_eq!(config.signature_path, signatures_path());

    let services = ItemServices::from_config(&config)?;
    assert_eq!(services.catalog().len(), BREEDS.len());

    let mut distro = Distro::new(&services);
    distro.set_breed("ubuntu")?;
    distro.set_os_version("jammy")?;
    Ok(())
}

#[test]
fn test_missing_catalog_file() {
    let config = CatalogConfig {
        signature_path: signatures_path().with_file_name("missing.json"),
    };
    let err = ItemServices::from_config(&config).unwrap_err();
    assert!(matches!(err, CatalogError::Io { .. }));
}

#[test]
fn test_malformed_catalog_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("distro_signatures.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = SignatureCatalog::load(&path).unwrap_err();
    assert!(matches!(err, CatalogError::Parse(_)));
}

#[test]
fn test_reload_affects_new_items_only() -> anyhow::Result<()> {
    init_tracing();
    let store = CatalogStore::new(catalog());
    let before = ItemServices::from_store(&store);

    let mut distro = Distro::new(&before);
    distro.set_breed("suse")?;

    let replacement = SignatureCatalog::from_breeds([BreedSignature::new("debian")
        .with_versions(["bookworm"])
        .with_default_boot_loaders(["grub"])]);
    let previous = store.reload(replacement);
    assert_eq!(previous.len(), BREEDS.len());

    // items created earlier keep their snapshot
    distro.set_breed("redhat")?;
    assert_eq!(distro.breed(), "redhat");

    let after = ItemServices::from_store(&store);
    let mut fresh = Distro::new(&after);
    assert!(fresh.set_breed("redhat").unwrap_err().is_constraint_violation());
    fresh.set_breed("debian")?;
    assert_eq!(fresh.supported_boot_loaders(), vec!["grub"]);
    Ok(())
}

#[test]
fn test_services_share_catalog() {
    let catalog = Arc::new(catalog());
    let services = ItemServices::new(Arc::clone(&catalog));
    let copy = services.clone();
    assert!(std::ptr::eq(services.catalog(), copy.catalog()));
    assert_eq!(Arc::strong_count(&catalog), 3);
}

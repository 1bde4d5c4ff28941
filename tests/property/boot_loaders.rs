// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Boot Loader Selection and Cloning

use cim_provisioning::item::{BootLoaders, Distro, Item, ItemServices};
use cim_provisioning::Arch;
use proptest::prelude::*;
use proptest::sample::{select, subsequence};

use crate::fixtures::{content, services, BREEDS};

// ============================================================================
// Strategies
// ============================================================================

fn breed_and_arch() -> impl Strategy<Value = (&'static str, Arch)> {
    (select(BREEDS.to_vec()), select(Arch::ALL.to_vec()))
}

/// Breed, architecture and a shuffled subset of the loaders they support
fn loader_selection(
    services: ItemServices,
) -> impl Strategy<Value = (&'static str, Arch, Vec<String>)> {
    breed_and_arch().prop_flat_map(move |(breed, arch)| {
        let supported = services
            .catalog()
            .supported_boot_loaders(breed, Some(arch));
        let len = supported.len();
        (
            Just(breed),
            Just(arch),
            subsequence(supported, 0..=len).prop_shuffle(),
        )
    })
}

/// One breed, architecture or boot loader write
#[derive(Debug, Clone)]
enum Write {
    Breed(&'static str),
    Arch(Arch),
    BootLoaders(Vec<&'static str>),
}

fn write() -> impl Strategy<Value = Write> {
    prop_oneof![
        select(BREEDS.to_vec()).prop_map(Write::Breed),
        select(Arch::ALL.to_vec()).prop_map(Write::Arch),
        subsequence(vec!["grub", "pxe", "yaboot", "ipxe"], 0..=4)
            .prop_shuffle()
            .prop_map(Write::BootLoaders),
    ]
}

fn configured(services: &ItemServices, breed: &str, arch: Arch) -> Distro {
    let mut distro = Distro::new(services);
    distro.set_breed(breed).unwrap();
    distro.set_arch(arch).unwrap();
    distro
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Any subset of the supported loaders is stored and read back verbatim
    #[test]
    fn prop_supported_subset_reads_back((breed, arch, loaders) in loader_selection(services())) {
        let services = services();
        let mut distro = configured(&services, breed, arch);

        prop_assert!(distro.set_boot_loaders(loaders.clone()).is_ok());
        prop_assert_eq!(distro.boot_loaders(), loaders);
    }

    /// A loader outside the supported set is rejected and nothing changes
    #[test]
    fn prop_unsupported_loader_rejected((breed, arch) in breed_and_arch(), loader in "[a-z]{3,8}") {
        let services = services();
        let mut distro = configured(&services, breed, arch);
        prop_assume!(!distro.supported_boot_loaders().contains(&loader));

        let err = distro.set_boot_loaders(vec![loader]).unwrap_err();
        prop_assert!(err.is_constraint_violation());
        prop_assert!(distro.boot_loaders().is_empty());
    }

    /// The empty string always resets to the supported set
    #[test]
    fn prop_empty_string_resets((breed, arch) in breed_and_arch()) {
        let services = services();
        let mut distro = configured(&services, breed, arch);

        prop_assert!(distro.set_boot_loaders("").is_ok());
        prop_assert!(distro.boot_loaders().is_empty());
        prop_assert_eq!(distro.resolved_boot_loaders(), distro.supported_boot_loaders());
    }

    /// A clone never equals its source while its content does
    #[test]
    fn prop_clone_is_distinct((breed, arch) in breed_and_arch(), name in "[a-z][a-z0-9_.-]{0,15}") {
        let services = services();
        let mut distro = configured(&services, breed, arch);
        distro.set_name(name.as_str()).unwrap();

        let clone = distro.make_clone();
        prop_assert_ne!(clone.uid(), distro.uid());
        prop_assert!(clone != distro);
        prop_assert!(!clone.is_same_as(&distro));
        prop_assert_eq!(content(clone.to_dict()), content(distro.to_dict()));
    }

    /// No sequence of writes leaves an explicit list outside the supported set
    #[test]
    fn prop_explicit_loaders_stay_supported(writes in prop::collection::vec(write(), 1..24)) {
        let services = services();
        let mut distro = Distro::new(&services);

        for write in writes {
            let result = match write {
                Write::Breed(breed) => distro.set_breed(breed),
                Write::Arch(arch) => distro.set_arch(arch),
                Write::BootLoaders(loaders) => distro.set_boot_loaders(loaders),
            };
            if let Err(err) = result {
                prop_assert!(err.is_constraint_violation());
            }

            if let BootLoaders::Explicit(loaders) = distro.boot_loaders_state() {
                let supported = distro.supported_boot_loaders();
                prop_assert!(
                    loaders.iter().all(|loader| supported.contains(loader)),
                    "{:?} not within {:?}", loaders, supported
                );
                prop_assert_eq!(distro.resolved_boot_loaders(), loaders);
            }
        }
    }
}

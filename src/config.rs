// Copyright (c) 2025 - Cowboy AI, Inc.
//! Configuration for the provisioning core

use std::path::PathBuf;

/// Environment variable overriding the signature catalog location
pub const SIGNATURES_PATH_ENV: &str = "CIM_SIGNATURES_PATH";

/// Configuration for loading the signature catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Path of the signature catalog document
    pub signature_path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            signature_path: PathBuf::from("/var/lib/cim/distro_signatures.json"),
        }
    }
}

impl CatalogConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    ///
    /// Unset and empty variables fall back to defaults.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        var(SIGNATURES_PATH_ENV)
            .filter(|path| !path.is_empty())
            .map(|path| Self {
                signature_path: PathBuf::from(path),
            })
            .unwrap_or_default()
    }
}

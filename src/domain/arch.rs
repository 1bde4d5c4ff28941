// Copyright (c) 2025 - Cowboy AI, Inc.
//! CPU Architecture Domain Model
//!
//! Defines the set of target architectures a bootable image can be built
//! for. Labels are the canonical lowercase strings used by the signature
//! catalog and by serialized items.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Unknown architecture label
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown architecture: '{0}'")]
pub struct UnknownArch(pub String);

/// Target CPU architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Arch {
    #[serde(rename = "i386")]
    I386,
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "ia64")]
    Ia64,
    #[serde(rename = "ppc")]
    Ppc,
    #[serde(rename = "ppc64")]
    Ppc64,
    #[serde(rename = "ppc64le")]
    Ppc64le,
    #[serde(rename = "ppc64el")]
    Ppc64el,
    #[serde(rename = "s390")]
    S390,
    #[serde(rename = "s390x")]
    S390x,
    #[serde(rename = "arm")]
    Arm,
    #[serde(rename = "aarch64")]
    Aarch64,
}

impl Arch {
    /// Every known architecture, in declaration order
    pub const ALL: [Arch; 11] = [
        Self::I386,
        Self::X86_64,
        Self::Ia64,
        Self::Ppc,
        Self::Ppc64,
        Self::Ppc64le,
        Self::Ppc64el,
        Self::S390,
        Self::S390x,
        Self::Arm,
        Self::Aarch64,
    ];

    /// Get the canonical label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::I386 => "i386",
            Self::X86_64 => "x86_64",
            Self::Ia64 => "ia64",
            Self::Ppc => "ppc",
            Self::Ppc64 => "ppc64",
            Self::Ppc64le => "ppc64le",
            Self::Ppc64el => "ppc64el",
            Self::S390 => "s390",
            Self::S390x => "s390x",
            Self::Arm => "arm",
            Self::Aarch64 => "aarch64",
        }
    }

    /// Look up an architecture by its canonical label
    ///
    /// Matching is exact: labels are case-sensitive and have no aliases, so
    /// what is stored always round-trips to the same label.
    pub fn from_label(label: &str) -> Result<Self, UnknownArch> {
        Self::ALL
            .iter()
            .copied()
            .find(|arch| arch.as_str() == label)
            .ok_or_else(|| UnknownArch(label.to_string()))
    }

    /// Check if this is a member of the x86 family
    pub fn is_x86(&self) -> bool {
        matches!(self, Self::I386 | Self::X86_64)
    }

    /// Check if this is a member of the POWER family
    pub fn is_ppc(&self) -> bool {
        matches!(self, Self::Ppc | Self::Ppc64 | Self::Ppc64le | Self::Ppc64el)
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Arch {
    type Err = UnknownArch;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s)
    }
}

impl TryFrom<&str> for Arch {
    type Error = UnknownArch;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_label(value)
    }
}

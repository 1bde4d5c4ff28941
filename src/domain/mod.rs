// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning Domain Models
//!
//! Value types shared by every configuration item:
//!
//! - [`Arch`] - target CPU architecture taxonomy
//! - [`Value`] - dynamic field value carrying unvalidated client input

pub mod arch;
pub mod value;

pub use arch::{Arch, UnknownArch};
pub use value::Value;

// Copyright (c) 2025 - Cowboy AI, Inc.

//! Collaborator adapters
//!
//! Items never touch the disk themselves; they consult the collaborators in
//! this module through narrow traits so that tests and alternative stores can
//! substitute their own implementations.

pub mod filesystem;

pub use filesystem::{BootFileProbe, LocalFileProbe};

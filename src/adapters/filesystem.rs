// Copyright (c) 2025 - Cowboy AI, Inc.
//! Boot file existence checks

use regex::Regex;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Predicate over kernel/initrd paths
///
/// Returns true when `path` names an existing regular file whose file name
/// matches `pattern`.
pub trait BootFileProbe: Send + Sync + fmt::Debug {
    fn is_boot_file(&self, path: &Path, pattern: &Regex) -> bool;
}

/// Probe backed by the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileProbe;

impl BootFileProbe for LocalFileProbe {
    fn is_boot_file(&self, path: &Path, pattern: &Regex) -> bool {
        let is_file = std::fs::metadata(path)
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !is_file {
            debug!("Boot file missing or not a regular file: {}", path.display());
            return false;
        }

        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| pattern.is_match(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_local_probe() {
        let dir = tempfile::tempdir().unwrap();
        let kernel = dir.path().join("vmlinuz1");
        File::create(&kernel).unwrap();
        let pattern = Regex::new("^(?:vmlinu[xz])").unwrap();

        assert!(LocalFileProbe.is_boot_file(&kernel, &pattern));
        assert!(!LocalFileProbe.is_boot_file(&dir.path().join("vmlinuz2"), &pattern));
        // directories are not boot files even when the name matches
        let subdir = dir.path().join("vmlinuz-dir");
        std::fs::create_dir(&subdir).unwrap();
        assert!(!LocalFileProbe.is_boot_file(&subdir, &pattern));

        let other = dir.path().join("bzImage");
        File::create(&other).unwrap();
        assert!(!LocalFileProbe.is_boot_file(&other, &pattern));
    }
}

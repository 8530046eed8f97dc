//! Stored bake result paths
//!
//! A result for address `a` lives at `{root}/{a.to_path()}.{extension}`.
//! [`BakeOutputIndex`] reads a result directory back and sorts each stored
//! file into valid (resolves against the current catalog) or stale.

use super::address::{AddressError, BakeTargetAddress, CatalogLayout};
use std::io;
use std::path::{Path, PathBuf};

/// Storage path of the result for `address`
pub fn result_path(root: &Path, address: &BakeTargetAddress, extension: &str) -> PathBuf {
    let mut path = root.join(address.to_path());
    path.set_extension(extension);
    path
}

/// Decode the address of a stored result from its path relative to the root
pub fn address_from_relative_path(relative: &Path) -> Result<BakeTargetAddress, AddressError> {
    let segments: Vec<String> = relative
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    segments.join("/").parse()
}

/// Stored results found under a root directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BakeOutputIndex {
    /// Results whose address resolves against the catalog, in enumeration order
    pub valid: Vec<(BakeTargetAddress, PathBuf)>,
    /// Results that do not decode or no longer resolve
    pub stale: Vec<PathBuf>,
}

impl BakeOutputIndex {
    /// Walk `root` and classify every file with the given extension
    ///
    /// A missing root yields an empty index.
    pub fn scan(root: &Path, extension: &str, layout: &CatalogLayout) -> io::Result<Self> {
        let mut index = Self::default();
        if !root.exists() {
            return Ok(index);
        }

        let mut files = Vec::new();
        collect_files(root, extension, &mut files)?;
        files.sort();

        for path in files {
            let Ok(relative) = path.strip_prefix(root) else { continue };
            match address_from_relative_path(relative) {
                Ok(address) if address.validate(layout) => index.valid.push((address, path)),
                _ => {
                    log::warn!("Stale bake result: {}", path.display());
                    index.stale.push(path);
                }
            }
        }

        let order = layout.addresses();
        index
            .valid
            .sort_by_key(|(address, _)| order.iter().position(|a| a == address));
        Ok(index)
    }

    /// Addresses of the layout with no stored result
    pub fn missing(&self, layout: &CatalogLayout) -> Vec<BakeTargetAddress> {
        layout
            .addresses()
            .into_iter()
            .filter(|address| !self.valid.iter().any(|(a, _)| a == address))
            .collect()
    }
}

fn collect_files(dir: &Path, extension: &str, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, extension, files)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some(extension) {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_path() {
        let path = result_path(Path::new("out"), &BakeTargetAddress::surface_slot(0, 1), "png");
        assert_eq!(path, Path::new("out/surface/0/1.png"));
        assert_eq!(
            address_from_relative_path(Path::new("surface/0/1.png")).unwrap(),
            BakeTargetAddress::surface_slot(0, 1)
        );
    }

    #[test]
    fn test_scan_partitions_results() {
        let root = std::env::temp_dir().join(format!("relight_output_{}", std::process::id()));
        let layout = CatalogLayout { emitter_count: 2, ..CatalogLayout::default() };

        for address in [BakeTargetAddress::emitter(1), BakeTargetAddress::emitter(5)] {
            let path = result_path(&root, &address, "png");
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, b"").unwrap();
        }
        std::fs::write(root.join("emitter").join("notes.txt"), b"").unwrap();
        std::fs::create_dir_all(root.join("light")).unwrap();
        std::fs::write(root.join("light").join("0.png"), b"").unwrap();

        let index = BakeOutputIndex::scan(&root, "png", &layout).unwrap();
        assert_eq!(index.valid, vec![(BakeTargetAddress::emitter(1), root.join("emitter/1.png"))]);
        assert_eq!(index.stale.len(), 2);
        assert_eq!(index.missing(&layout), vec![BakeTargetAddress::emitter(0)]);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_scan_missing_root() {
        let index = BakeOutputIndex::scan(Path::new("/nonexistent/relight"), "png", &CatalogLayout::default()).unwrap();
        assert_eq!(index, BakeOutputIndex::default());
    }
}

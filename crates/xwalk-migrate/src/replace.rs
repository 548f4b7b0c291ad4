//! CordovaLib replacement
//!
//! Three ordered steps, none of which is undone when a later one fails:
//! delete the project's library subtree, copy the bundle framework in its
//! place, then propagate the bundle VERSION marker.

use crate::error::{MigrateError, MigrateResult};
use crate::fetch::remove_tree;
use crate::layout::{BundleLayout, ProjectLayout};
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Swap the project's CordovaLib for the bundle framework
pub fn replace_framework(project: &ProjectLayout, bundle: &BundleLayout) -> MigrateResult<()> {
    let library_dir = project.library_dir();

    remove_tree(&library_dir).map_err(|e| MigrateError::filesystem(&library_dir, e))?;
    debug!(path = %library_dir.display(), "removed library subtree");

    let copied = copy_tree(&bundle.framework_dir(), &library_dir)?;
    debug!(files = copied, "copied bundle framework");

    let version_file = bundle.version_file();
    fs::copy(&version_file, project.bundle_version_marker())
        .map_err(|e| MigrateError::filesystem(&version_file, e))?;

    Ok(())
}

/// Recursively copy `src` to `dest`, returning the number of files copied
fn copy_tree(src: &Path, dest: &Path) -> MigrateResult<usize> {
    let mut copied = 0;

    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            MigrateError::filesystem(path, io::Error::from(e))
        })?;

        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| MigrateError::filesystem(entry.path(), io::Error::other(e)))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| MigrateError::filesystem(&target, e))?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| MigrateError::filesystem(&target, e))?;
            copied += 1;
        }
    }

    Ok(copied)
}

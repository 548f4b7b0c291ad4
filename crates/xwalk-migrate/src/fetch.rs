//! Bundle transport: HTTP download and zip extraction

use crate::artifact::DownloadTarget;
use crate::error::{MigrateError, MigrateResult};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Cursor, Read, Seek};
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// Fetch an archive and extract it into a directory
///
/// Implementations must be shareable across threads: multi-architecture
/// plans fetch every target concurrently.
pub trait Fetcher: Sync {
    fn fetch_and_extract(&self, url: &str, destination: &Path) -> MigrateResult<()>;
}

/// Fetcher backed by a blocking reqwest client
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    /// Downloads overlap; extraction into the shared tree does not
    extract_lock: Mutex<()>,
}

impl HttpFetcher {
    /// Create a fetcher with a per-request timeout
    pub fn new(timeout: Duration) -> MigrateResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("xwalkify/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MigrateError::transport("<client>", e))?;

        Ok(Self {
            client,
            extract_lock: Mutex::new(()),
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_and_extract(&self, url: &str, destination: &Path) -> MigrateResult<()> {
        debug!(url, "requesting bundle");
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|e| MigrateError::transport(url, e))?;

        let bytes = response
            .bytes()
            .map_err(|e| MigrateError::transport(url, e))?;
        debug!(url, size = bytes.len(), "bundle downloaded");

        let _guard = self
            .extract_lock
            .lock()
            .map_err(|_| MigrateError::transport(url, "extraction lock poisoned"))?;
        let count = extract_archive(Cursor::new(bytes.as_ref()), destination)
            .map_err(|e| MigrateError::transport(url, format!("extraction failed: {}", e)))?;
        debug!(url, files = count, "bundle extracted");
        Ok(())
    }
}

/// Fetch every target, waiting for all of them
///
/// Any failure fails the whole plan; the shared destination is then purged
/// so a half-extracted bundle is never picked up later.
pub fn fetch_all(fetcher: &dyn Fetcher, targets: &[DownloadTarget]) -> MigrateResult<()> {
    let results: Vec<MigrateResult<()>> = targets
        .par_iter()
        .map(|target| {
            info!(arch = %target.architecture, url = %target.url, "fetching bundle");
            fetcher.fetch_and_extract(&target.url, &target.destination)
        })
        .collect();

    let mut first_error = None;
    for (target, result) in targets.iter().zip(results) {
        if let Err(e) = result {
            warn!(arch = %target.architecture, error = %e, "bundle fetch failed");
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        None => Ok(()),
        Some(error) => {
            let destinations: HashSet<&PathBuf> = targets.iter().map(|t| &t.destination).collect();
            for dir in destinations {
                purge(dir);
            }
            Err(error)
        }
    }
}

/// Remove a directory tree, treating "already gone" as success
pub fn remove_tree(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn purge(dir: &Path) {
    if let Err(e) = remove_tree(dir) {
        warn!(path = %dir.display(), error = %e, "could not purge partial bundle");
    }
}

/// Extract a zip archive, stripping its single top-level directory
///
/// Returns the number of files written. Entries whose names would escape
/// `output_dir` are rejected.
pub fn extract_archive<R: Read + Seek>(reader: R, output_dir: &Path) -> io::Result<usize> {
    let mut archive = ZipArchive::new(reader).map_err(zip_error)?;
    let strip = has_single_root(&archive);

    fs::create_dir_all(output_dir)?;
    let mut written = 0;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(zip_error)?;
        let name = entry.name().to_owned();

        let enclosed = entry
            .enclosed_name()
            .filter(|p| !p.components().any(|c| c == Component::ParentDir))
            .map(|p| p.to_path_buf());
        let Some(path) = enclosed else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("path traversal detected: {}", name),
            ));
        };

        let relative: PathBuf = if strip {
            path.components().skip(1).collect()
        } else {
            path
        };
        if relative.as_os_str().is_empty() {
            continue;
        }

        let out_path = output_dir.join(&relative);
        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out_file = File::create(&out_path)?;
        io::copy(&mut entry, &mut out_file)?;

        // Owner keeps read/write so a later bundle can overwrite the same path
        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            let mode = (mode & 0o777) | 0o600;
            fs::set_permissions(&out_path, fs::Permissions::from_mode(mode))?;
        }

        written += 1;
    }

    Ok(written)
}

/// Whether every entry lives under one shared top-level directory
fn has_single_root<R: Read + Seek>(archive: &ZipArchive<R>) -> bool {
    let mut roots = HashSet::new();
    let mut nested = false;

    for name in archive.file_names() {
        let mut components = Path::new(name)
            .components()
            .filter(|c| matches!(c, Component::Normal(_)));
        if let Some(first) = components.next() {
            roots.insert(first.as_os_str().to_owned());
            nested |= components.next().is_some();
        }
    }

    roots.len() == 1 && nested
}

fn zip_error(error: zip::result::ZipError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use xwalk_config::Architecture;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn build_zip(entries: &[(&str, Option<&str>)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, contents) in entries {
            match contents {
                Some(body) => {
                    writer.start_file(*name, FileOptions::default()).unwrap();
                    writer.write_all(body.as_bytes()).unwrap();
                }
                None => writer.add_directory(*name, FileOptions::default()).unwrap(),
            }
        }
        writer.finish().unwrap().into_inner()
    }

    fn bundle_zip() -> Vec<u8> {
        build_zip(&[
            ("crosswalk-cordova-10.39.235.15-x86/", None),
            ("crosswalk-cordova-10.39.235.15-x86/VERSION", Some("10.39.235.15\n")),
            ("crosswalk-cordova-10.39.235.15-x86/framework/", None),
            (
                "crosswalk-cordova-10.39.235.15-x86/framework/project.properties",
                Some("target=android-19\n"),
            ),
        ])
    }

    #[test]
    fn test_extract_strips_top_level_directory() {
        let temp = TempDir::new().unwrap();
        let count = extract_archive(Cursor::new(bundle_zip()), temp.path()).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            fs::read_to_string(temp.path().join("VERSION")).unwrap(),
            "10.39.235.15\n"
        );
        assert!(temp.path().join("framework/project.properties").is_file());
        assert!(!temp.path().join("crosswalk-cordova-10.39.235.15-x86").exists());
    }

    #[test]
    fn test_extract_flat_archive_is_not_stripped() {
        let temp = TempDir::new().unwrap();
        let data = build_zip(&[("VERSION", Some("1")), ("framework/a.txt", Some("a"))]);
        extract_archive(Cursor::new(data), temp.path()).unwrap();

        assert!(temp.path().join("VERSION").is_file());
        assert!(temp.path().join("framework/a.txt").is_file());
    }

    #[test]
    fn test_extract_overwrites_existing_files() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("VERSION"), "old").unwrap();
        extract_archive(Cursor::new(bundle_zip()), temp.path()).unwrap();
        assert_eq!(
            fs::read_to_string(temp.path().join("VERSION")).unwrap(),
            "10.39.235.15\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_extract_read_only_entry_twice() {
        use std::os::unix::fs::PermissionsExt;

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(
                "bundle/framework/build.xml",
                FileOptions::default().unix_permissions(0o444),
            )
            .unwrap();
        writer.write_all(b"<project/>").unwrap();
        writer
            .start_file(
                "bundle/bin/build.sh",
                FileOptions::default().unix_permissions(0o555),
            )
            .unwrap();
        writer.write_all(b"#!/bin/sh\n").unwrap();
        let data = writer.finish().unwrap().into_inner();

        let temp = TempDir::new().unwrap();
        extract_archive(Cursor::new(data.clone()), temp.path()).unwrap();
        extract_archive(Cursor::new(data), temp.path()).unwrap();

        let mode = |rel: &str| {
            fs::metadata(temp.path().join(rel))
                .unwrap()
                .permissions()
                .mode()
                & 0o777
        };
        assert_eq!(mode("framework/build.xml"), 0o644);
        assert_eq!(mode("bin/build.sh"), 0o755);
    }

    #[test]
    fn test_extract_rejects_traversal() {
        let temp = TempDir::new().unwrap();
        let data = build_zip(&[("bundle/../../evil.txt", Some("x"))]);
        let err = extract_archive(Cursor::new(data), temp.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_extract_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let err = extract_archive(Cursor::new(b"not a zip".to_vec()), temp.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    /// Extracts a canned archive, failing for URLs that contain "arm"
    struct CannedFetcher;

    impl Fetcher for CannedFetcher {
        fn fetch_and_extract(&self, url: &str, destination: &Path) -> MigrateResult<()> {
            if url.contains("arm") {
                return Err(MigrateError::transport(url, "404 Not Found"));
            }
            extract_archive(Cursor::new(bundle_zip()), destination)
                .map(|_| ())
                .map_err(|e| MigrateError::transport(url, e))
        }
    }

    fn target(arch: Architecture, destination: &Path) -> DownloadTarget {
        DownloadTarget {
            architecture: arch,
            url: format!("https://example.com/{}.zip", arch),
            destination: destination.to_path_buf(),
        }
    }

    #[test]
    fn test_fetch_all_success() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("stable");
        fetch_all(&CannedFetcher, &[target(Architecture::X86, &dest)]).unwrap();
        assert!(dest.join("framework").is_dir());
    }

    #[test]
    fn test_fetch_all_partial_failure_purges_destination() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("stable");
        let targets = [target(Architecture::X86, &dest), target(Architecture::Arm, &dest)];

        let err = fetch_all(&CannedFetcher, &targets).unwrap_err();
        assert!(matches!(err, MigrateError::Transport { ref url, .. } if url.contains("arm")));
        assert!(!dest.exists());
    }

    #[test]
    fn test_remove_tree_missing_is_ok() {
        let temp = TempDir::new().unwrap();
        remove_tree(&temp.path().join("nope")).unwrap();
    }
}

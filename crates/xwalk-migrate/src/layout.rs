//! Fixed paths inside a Cordova Android project and a Crosswalk bundle

use std::path::{Path, PathBuf};

/// Paths of a Cordova project with the Android platform added
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `platforms/android`
    pub fn platform_dir(&self) -> PathBuf {
        self.root.join("platforms").join("android")
    }

    /// Native library subtree replaced by the bundle framework
    pub fn library_dir(&self) -> PathBuf {
        self.platform_dir().join("CordovaLib")
    }

    /// Version script written by `cordova platform add android`
    pub fn platform_version_marker(&self) -> PathBuf {
        self.platform_dir().join("cordova").join("version")
    }

    /// Where the bundle's VERSION file is propagated to
    pub fn bundle_version_marker(&self) -> PathBuf {
        self.platform_dir().join("VERSION")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.platform_dir().join("AndroidManifest.xml")
    }
}

/// Paths inside an extracted Crosswalk Cordova bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLayout {
    root: PathBuf,
}

impl BundleLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn framework_dir(&self) -> PathBuf {
        self.root.join("framework")
    }

    pub fn version_file(&self) -> PathBuf {
        self.root.join("VERSION")
    }
}

//! Shared fixtures for tsbuild-core integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tsbuild_core::{BuildConfig, Pipeline};

/// Throwaway workspace: `packages/<entry>/...` sources, `build/` output
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp workspace"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn package_dir(&self, entry: &str) -> PathBuf {
        self.root().join("packages").join(entry)
    }

    /// Write `content` at `<package>/<relative>`
    pub fn write(&self, entry: &str, relative: &str, content: &str) -> PathBuf {
        let path = self.package_dir(entry).join(relative);
        fs::create_dir_all(path.parent().expect("parent dir")).expect("create dirs");
        fs::write(&path, content).expect("write fixture");
        path
    }

    pub fn config(&self) -> BuildConfig {
        let mut config = BuildConfig::default();
        config.package_roots = vec![self.root().join("packages")];
        config.output.root = self.root().join("build");
        config
    }

    pub fn pipeline(&self) -> Pipeline {
        Pipeline::from_config(&self.config()).expect("valid config")
    }

    pub fn output_root(&self) -> PathBuf {
        self.root().join("build")
    }

    /// Every file under the output root, `/`-separated and sorted
    pub fn outputs(&self) -> Vec<String> {
        let root = self.output_root();
        if !root.exists() {
            return Vec::new();
        }
        let mut files: Vec<String> = walkdir::WalkDir::new(&root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                e.path()
                    .strip_prefix(&root)
                    .expect("under output root")
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .collect();
        files.sort();
        files
    }

    pub fn read_output(&self, relative: &str) -> String {
        fs::read_to_string(self.output_root().join(relative)).expect("output exists")
    }
}

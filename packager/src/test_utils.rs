//! Shared test utilities for the packager crate.

use crate::archive::MANIFEST_PATH;
use packwright_common::manifest::{MANIFEST_VERSION, Manifest};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

#[derive(Debug, Clone)]
enum Entry {
    Directory(String),
    File(String, Vec<u8>),
}

/// Builder for throwaway jar files.
///
/// Entries are written in the order they are added; a manifest, when
/// requested, is always written first as jar tools do.
#[derive(Debug, Default)]
pub struct JarFixture {
    name: Option<String>,
    manifest: Option<Manifest>,
    entries: Vec<Entry>,
    temp_dir: Option<TempDir>,
    path: Option<PathBuf>,
}

impl JarFixture {
    /// Starts an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the file name of the jar (defaults to `fixture.jar`).
    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }

    /// Adds a manifest with `Manifest-Version: 1.0` and the given headers.
    #[must_use]
    pub fn manifest(mut self, headers: &[(&str, &str)]) -> Self {
        let mut manifest = Manifest::new();
        manifest.main_mut().insert(MANIFEST_VERSION, "1.0");
        for (name, value) in headers {
            manifest.main_mut().insert(*name, *value);
        }
        self.manifest = Some(manifest);
        self
    }

    /// Adds an empty class file entry.
    #[must_use]
    pub fn class(self, path: &str) -> Self {
        self.file(path, "\u{cafe}")
    }

    /// Adds a file entry with the given contents.
    #[must_use]
    pub fn file(mut self, path: &str, contents: &str) -> Self {
        self.entries
            .push(Entry::File(path.to_owned(), contents.as_bytes().to_vec()));
        self
    }

    /// Adds an explicit directory entry; `path` must end with `/`.
    #[must_use]
    pub fn directory(mut self, path: &str) -> Self {
        self.entries.push(Entry::Directory(path.to_owned()));
        self
    }

    /// Writes the jar into a fresh temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the jar cannot be written; fixtures are for tests only.
    #[must_use]
    pub fn build(mut self) -> Self {
        let temp_dir = TempDir::new().unwrap_or_else(|e| panic!("temp dir: {e}"));
        let name = self.name.clone().unwrap_or_else(|| "fixture.jar".to_owned());
        let path = temp_dir.path().join(name);
        self.write_to(&path);
        self.temp_dir = Some(temp_dir);
        self.path = Some(path);
        self
    }

    /// Writes the jar to an explicit location.
    ///
    /// # Panics
    ///
    /// Panics if the jar cannot be written.
    pub fn write_to(&self, path: &Path) {
        let file = File::create(path).unwrap_or_else(|e| panic!("create {}: {e}", path.display()));
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        if let Some(manifest) = &self.manifest {
            writer
                .start_file(MANIFEST_PATH, options)
                .unwrap_or_else(|e| panic!("start manifest: {e}"));
            writer
                .write_all(&manifest.to_bytes())
                .unwrap_or_else(|e| panic!("write manifest: {e}"));
        }

        for entry in &self.entries {
            match entry {
                Entry::Directory(name) => writer
                    .add_directory(name.as_str(), options)
                    .unwrap_or_else(|e| panic!("add directory {name}: {e}")),
                Entry::File(name, contents) => {
                    writer
                        .start_file(name.as_str(), options)
                        .unwrap_or_else(|e| panic!("start {name}: {e}"));
                    writer
                        .write_all(contents)
                        .unwrap_or_else(|e| panic!("write {name}: {e}"));
                }
            }
        }

        writer
            .finish()
            .unwrap_or_else(|e| panic!("finish {}: {e}", path.display()));
    }

    /// Location of the built jar.
    ///
    /// # Panics
    ///
    /// Panics if [`Self::build`] has not been called.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path
            .as_deref()
            .unwrap_or_else(|| panic!("JarFixture::build must be called before path"))
    }

    /// Directory holding the built jar.
    ///
    /// # Panics
    ///
    /// Panics if [`Self::build`] has not been called.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.temp_dir
            .as_ref()
            .map(TempDir::path)
            .unwrap_or_else(|| panic!("JarFixture::build must be called before dir"))
    }
}

//! Read access to jar archives.
//!
//! A [`JarFile`] wraps an open zip archive and exposes the two things the
//! merger needs: the manifest's `Export-Package` header and the list of
//! packages the jar contains. Dropping the value closes the file.

use packwright_common::export::EXPORT_PACKAGE;
use packwright_common::manifest::{Manifest, ManifestError};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::ZipArchive;
use zip::result::ZipError;

/// Location of the manifest inside a jar.
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// Package prefixes that never hold exportable code.
const NON_CODE_PREFIXES: [&str; 2] = ["META-INF", "OSGI-INF"];

/// What went wrong while reading a jar.
#[derive(Debug, Error)]
pub enum JarErrorKind {
    /// The file could not be opened or read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a readable zip archive.
    #[error("invalid archive: {0}")]
    Zip(#[from] ZipError),

    /// The manifest exists but cannot be parsed.
    #[error("invalid manifest: {0}")]
    Manifest(#[from] ManifestError),
}

/// A failure reading the jar at `path`.
#[derive(Debug, Error)]
#[error("cannot read jar {}: {kind}", .path.display())]
pub struct JarError {
    /// The jar that failed.
    pub path: PathBuf,
    /// The underlying cause.
    #[source]
    pub kind: JarErrorKind,
}

impl JarError {
    fn new(path: &Path, kind: impl Into<JarErrorKind>) -> Self {
        Self {
            path: path.to_path_buf(),
            kind: kind.into(),
        }
    }
}

/// An open jar archive.
pub struct JarFile {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
}

impl JarFile {
    /// Opens the jar at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`JarError`] if the file cannot be opened or is not a zip
    /// archive.
    pub fn open(path: &Path) -> Result<Self, JarError> {
        let file = File::open(path).map_err(|e| JarError::new(path, e))?;
        let archive = ZipArchive::new(BufReader::new(file)).map_err(|e| JarError::new(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    /// Path the jar was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the manifest entry, matched case-insensitively.
    #[must_use]
    pub fn manifest_entry(&self) -> Option<String> {
        self.archive
            .file_names()
            .find(|name| name.eq_ignore_ascii_case(MANIFEST_PATH))
            .map(str::to_owned)
    }

    /// Parses the jar manifest, or returns `None` when the jar has none.
    ///
    /// # Errors
    ///
    /// Returns a [`JarError`] if the entry cannot be read or parsed.
    pub fn manifest(&mut self) -> Result<Option<Manifest>, JarError> {
        let Some(entry) = self.manifest_entry() else {
            return Ok(None);
        };

        let mut bytes = Vec::new();
        {
            let mut file = self
                .archive
                .by_name(&entry)
                .map_err(|e| JarError::new(&self.path, e))?;
            file.read_to_end(&mut bytes)
                .map_err(|e| JarError::new(&self.path, e))?;
        }

        Manifest::parse(&bytes)
            .map(Some)
            .map_err(|e| JarError::new(&self.path, e))
    }

    /// Returns the main-section `Export-Package` header, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`JarError`] if the manifest cannot be read or parsed.
    pub fn export_package(&mut self) -> Result<Option<String>, JarError> {
        Ok(self
            .manifest()?
            .and_then(|manifest| manifest.main().get(EXPORT_PACKAGE).map(str::to_owned)))
    }

    /// Lists every package that directly contains at least one file.
    ///
    /// Packages are returned as dotted names, ordered by their path inside
    /// the archive. Files at the archive root belong to the empty package.
    #[must_use]
    pub fn packages(&self) -> Vec<String> {
        let directories: BTreeSet<&str> = self
            .archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(|name| name.rsplit_once('/').map_or("", |(dir, _)| dir))
            .collect();

        directories
            .into_iter()
            .map(|dir| dir.replace('/', "."))
            .collect()
    }

    /// Lists the packages that can be exported, see [`is_exportable`].
    #[must_use]
    pub fn exportable_packages(&self) -> Vec<String> {
        self.packages()
            .into_iter()
            .filter(|package| is_exportable(package))
            .collect()
    }

    pub(crate) fn archive_mut(&mut self) -> &mut ZipArchive<BufReader<File>> {
        &mut self.archive
    }
}

/// Returns `false` for the root package and metadata directories.
///
/// # Examples
///
/// ```
/// use packwright_packager::archive::is_exportable;
///
/// assert!(is_exportable("com.acme.core"));
/// assert!(!is_exportable("META-INF.services"));
/// assert!(!is_exportable(""));
/// ```
#[must_use]
pub fn is_exportable(package: &str) -> bool {
    !package.is_empty()
        && !NON_CODE_PREFIXES
            .iter()
            .any(|prefix| package.starts_with(prefix))
}

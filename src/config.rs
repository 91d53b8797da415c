//! Packaging descriptor loader.
//!
//! A packaging run is described by a `packwright.toml` file: the bundling
//! instructions the author wants, the relocations applied while shading, and
//! the artifacts that were packaged into the jar. `PackagingConfig` captures
//! that descriptor. Relative artifact paths are resolved against the
//! directory holding the descriptor so that runs behave the same from any
//! working directory.

use camino::{Utf8Path, Utf8PathBuf};
use packwright_common::version::{BUNDLE_VERSION, OsgiVersion};
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Default descriptor file name.
pub const DEFAULT_CONFIG_FILE: &str = "packwright.toml";

/// Errors raised while loading a packaging descriptor.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The descriptor could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// Descriptor path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The descriptor is not valid TOML or does not match the schema.
    #[error("invalid packaging descriptor: {0}")]
    Parse(#[from] toml::de::Error),

    /// An artifact declares both a module coordinate and a project path.
    #[error("artifact {path} declares both `module` and `project`")]
    ConflictingIdentity {
        /// The artifact's declared path.
        path: Utf8PathBuf,
    },
}

/// A packaging descriptor.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PackagingConfig {
    /// When `false` the bundle step is skipped.
    #[serde(default = "PackagingConfig::default_enabled")]
    pub enabled: bool,
    /// Maven version of the packaged component.
    #[serde(default)]
    pub version: Option<String>,
    /// Bundling instructions, keyed by header name.
    #[serde(default)]
    pub instructions: BTreeMap<String, String>,
    /// Relocations applied while packaging, in declaration order.
    #[serde(default)]
    pub relocate: Vec<RelocationSpec>,
    /// Artifacts packaged into the jar.
    #[serde(default)]
    pub artifact: Vec<ArtifactSpec>,
}

/// A `[[relocate]]` entry.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RelocationSpec {
    /// Dotted prefix to rewrite, for example `com.acme.`.
    pub pattern: String,
    /// Replacement prefix.
    pub shaded: String,
    /// Glob patterns on class names the rule is limited to.
    #[serde(default)]
    pub include: Vec<String>,
    /// Glob patterns on class names the rule never touches.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// An `[[artifact]]` entry.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ArtifactSpec {
    /// Location of the jar.
    pub path: Utf8PathBuf,
    /// `group:name:version` coordinate of an external module.
    #[serde(default)]
    pub module: Option<String>,
    /// Path of a project in the same build, such as `:core`.
    #[serde(default)]
    pub project: Option<String>,
}

/// How an artifact identifies itself.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeclaredIdentity<'a> {
    /// An external module coordinate.
    Module(&'a str),
    /// A project in the same build.
    Project(&'a str),
    /// Neither was declared.
    Undeclared,
}

impl ArtifactSpec {
    /// Returns the declared identity of the artifact.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ConflictingIdentity`] when both `module` and
    /// `project` are set.
    pub fn identity(&self) -> Result<DeclaredIdentity<'_>, ConfigError> {
        match (self.module.as_deref(), self.project.as_deref()) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingIdentity {
                path: self.path.clone(),
            }),
            (Some(module), None) => Ok(DeclaredIdentity::Module(module)),
            (None, Some(project)) => Ok(DeclaredIdentity::Project(project)),
            (None, None) => Ok(DeclaredIdentity::Undeclared),
        }
    }
}

impl Default for PackagingConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            version: None,
            instructions: BTreeMap::new(),
            relocate: Vec::new(),
            artifact: Vec::new(),
        }
    }
}

impl PackagingConfig {
    const fn default_enabled() -> bool {
        true
    }

    /// Reads and parses the descriptor at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, does not parse,
    /// or declares conflicting artifact identities.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use camino::Utf8Path;
    /// use packwright::PackagingConfig;
    ///
    /// let config = PackagingConfig::load(Utf8Path::new("packwright.toml"))?;
    /// println!("{} artifacts", config.artifact.len());
    /// # Ok::<(), packwright::ConfigError>(())
    /// ```
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        Self::load_with(path, |path| std::fs::read_to_string(path))
    }

    /// Loads the descriptor using the supplied reader.
    ///
    /// The reader stands in for the file system so tests can feed descriptor
    /// text directly.
    ///
    /// # Errors
    ///
    /// As for [`Self::load`].
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use packwright::PackagingConfig;
    ///
    /// let config = PackagingConfig::load_with(Utf8Path::new("build/packwright.toml"), |_| {
    ///     Ok("[[artifact]]\npath = \"libs/a.jar\"\n".to_owned())
    /// })?;
    /// assert_eq!(config.artifact[0].path, "build/libs/a.jar");
    /// # Ok::<(), packwright::ConfigError>(())
    /// ```
    pub fn load_with<F>(path: &Utf8Path, reader: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(&Utf8Path) -> std::io::Result<String>,
    {
        let source = reader(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = source.parse()?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Utf8Path) {
        for artifact in &mut self.artifact {
            if artifact.path.is_relative() {
                artifact.path = base.join(&artifact.path);
            }
        }
    }

    /// Instructions with a `Bundle-Version` derived from [`Self::version`]
    /// unless the author set one.
    ///
    /// # Examples
    ///
    /// ```
    /// use packwright::PackagingConfig;
    ///
    /// let config: PackagingConfig = "version = \"1.2.3-SNAPSHOT\"".parse()?;
    /// let instructions = config.effective_instructions();
    /// assert_eq!(instructions["Bundle-Version"], "1.2.3.SNAPSHOT");
    /// # Ok::<(), packwright::ConfigError>(())
    /// ```
    #[must_use]
    pub fn effective_instructions(&self) -> BTreeMap<String, String> {
        let mut instructions = self.instructions.clone();
        if let Some(version) = self.bundle_version() {
            instructions
                .entry(BUNDLE_VERSION.to_owned())
                .or_insert_with(|| version.to_string());
        }
        instructions
    }

    /// The OSGi form of [`Self::version`], if one is configured.
    #[must_use]
    pub fn bundle_version(&self) -> Option<OsgiVersion> {
        self.version
            .as_deref()
            .map(str::trim)
            .filter(|version| !version.is_empty())
            .map(OsgiVersion::from_maven)
    }
}

impl std::str::FromStr for PackagingConfig {
    type Err = ConfigError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(source)?;
        for artifact in &config.artifact {
            artifact.identity()?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_enable_bundling_with_nothing_configured() {
        let config: PackagingConfig = "".parse().expect("empty descriptor parses");

        assert_eq!(config, PackagingConfig::default());
        assert!(config.enabled);
        assert!(config.effective_instructions().is_empty());
    }

    #[rstest]
    fn parses_a_full_descriptor() {
        let source = concat!(
            "enabled = false\n",
            "version = \"2.0.0\"\n",
            "[instructions]\n",
            "Bundle-SymbolicName = \"org.acme\"\n",
            "Export-Package = \"!com.acme.internal.*\"\n",
            "[[relocate]]\n",
            "pattern = \"com.acme.\"\n",
            "shaded = \"shaded.com.acme.\"\n",
            "exclude = [\"com.acme.Keep*\"]\n",
            "[[artifact]]\n",
            "path = \"libs/acme.jar\"\n",
            "module = \"com.acme:acme:1.2.3\"\n",
            "[[artifact]]\n",
            "path = \"libs/core.jar\"\n",
            "project = \":core\"\n",
        );

        let config: PackagingConfig = source.parse().expect("descriptor parses");

        assert!(!config.enabled);
        assert_eq!(config.instructions.len(), 2);
        assert_eq!(config.relocate.len(), 1);
        assert_eq!(config.relocate[0].exclude, vec!["com.acme.Keep*"]);
        assert_eq!(
            config.artifact[0].identity().expect("identity"),
            DeclaredIdentity::Module("com.acme:acme:1.2.3")
        );
        assert_eq!(
            config.artifact[1].identity().expect("identity"),
            DeclaredIdentity::Project(":core")
        );
    }

    #[rstest]
    #[case::unknown_top_level("unexpected = true\n")]
    #[case::unknown_artifact_field("[[artifact]]\npath = \"a.jar\"\nsha = \"x\"\n")]
    #[case::missing_shaded("[[relocate]]\npattern = \"com.acme.\"\n")]
    #[case::wrong_type("enabled = \"yes\"\n")]
    fn rejects_invalid_descriptors(#[case] source: &str) {
        let outcome: Result<PackagingConfig, _> = source.parse();

        assert!(matches!(outcome, Err(ConfigError::Parse(_))));
    }

    #[rstest]
    fn rejects_conflicting_identities() {
        let source = "[[artifact]]\npath = \"a.jar\"\nmodule = \"g:n:1\"\nproject = \":a\"\n";

        let outcome: Result<PackagingConfig, _> = source.parse();

        assert!(matches!(
            outcome,
            Err(ConfigError::ConflictingIdentity { path }) if path == "a.jar"
        ));
    }

    #[rstest]
    fn resolves_relative_paths_against_the_descriptor() {
        let source = "[[artifact]]\npath = \"libs/a.jar\"\n[[artifact]]\npath = \"/opt/b.jar\"\n";

        let config = PackagingConfig::load_with(Utf8Path::new("build/packwright.toml"), |_| {
            Ok(source.to_owned())
        })
        .expect("descriptor loads");

        assert_eq!(config.artifact[0].path, "build/libs/a.jar");
        assert_eq!(config.artifact[1].path, "/opt/b.jar");
    }

    #[rstest]
    fn reports_unreadable_descriptors() {
        let outcome = PackagingConfig::load_with(Utf8Path::new("missing.toml"), |_| {
            Err(std::io::Error::from(std::io::ErrorKind::NotFound))
        });

        assert!(matches!(outcome, Err(ConfigError::Io { path, .. }) if path == "missing.toml"));
    }

    #[rstest]
    #[case::derived("version = \"1.2.3-SNAPSHOT\"\n", "1.2.3.SNAPSHOT")]
    #[case::author_wins(
        "version = \"1.2.3\"\n[instructions]\nBundle-Version = \"9.9.9\"\n",
        "9.9.9"
    )]
    fn derives_bundle_version(#[case] source: &str, #[case] expected: &str) {
        let config: PackagingConfig = source.parse().expect("descriptor parses");

        assert_eq!(
            config
                .effective_instructions()
                .get(BUNDLE_VERSION)
                .map(String::as_str),
            Some(expected)
        );
    }

    #[rstest]
    fn blank_versions_derive_nothing() {
        let config: PackagingConfig = "version = \"  \"\n".parse().expect("descriptor parses");

        assert!(config.bundle_version().is_none());
    }
}

//! `Export-Package` instruction merging.
//!
//! A packaged jar bundles classes from several input artifacts, some of which
//! are OSGi bundles already and some of which are plain jars. The merger
//! builds the `Export-Package` instruction for the packaged jar from three
//! sources, in priority order:
//!
//! 1. the packaging author's own `Export-Package` value, normally negations
//!    such as `!com.acme.internal.*`;
//! 2. the `Export-Package` header of every input bundle, with `uses`
//!    directives removed so the bundling tool recomputes them;
//! 3. the package list of every plain input jar, relocated the way the
//!    packaged jar relocates its classes and versioned after the artifact.
//!
//! Every derived instruction carries the [`NO_OP_MARKER`] prefix so the
//! bundling tool treats it as a pattern and earlier negations still apply.

use crate::archive::{JarError, JarFile};
use crate::identity::ComponentIdentity;
use crate::relocation::Relocations;
use log::{debug, trace};
use packwright_common::export::{
    EXPORT_PACKAGE, ExportInstruction, NO_OP_MARKER, split_export_header, strip_uses, with_marker,
};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Bundling instructions keyed by header name.
pub type Instructions = BTreeMap<String, String>;

/// Separator placed between merged instructions.
const EXPORT_SEPARATOR: &str = ", ";

/// Errors arising from instruction merging.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A contributing jar could not be read.
    #[error(transparent)]
    Jar(#[from] JarError),

    /// A plain jar came from a component with no version policy.
    #[error("unhandled component identifier: {identity} (artifact {})", .artifact.display())]
    UnsupportedIdentity {
        /// The offending identity.
        identity: ComponentIdentity,
        /// The artifact it was attached to.
        artifact: PathBuf,
    },
}

/// A resolved input artifact: a readable jar and the component behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceArtifact {
    path: PathBuf,
    identity: ComponentIdentity,
}

impl SourceArtifact {
    /// Pairs a jar file with its component identity.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, identity: ComponentIdentity) -> Self {
        Self {
            path: path.into(),
            identity,
        }
    }

    /// Location of the jar.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identity of the producing component.
    #[must_use]
    pub fn identity(&self) -> &ComponentIdentity {
        &self.identity
    }
}

/// Merges `Export-Package` for a packaged jar.
///
/// Returns a copy of `user_instructions` whose `Export-Package` entry holds
/// the user's own value followed by everything derived from `artifacts`,
/// deduplicated and joined with `", "`.
///
/// # Errors
///
/// Returns [`MergeError::Jar`] if any artifact cannot be read and
/// [`MergeError::UnsupportedIdentity`] if a plain jar with exportable packages
/// has an opaque identity.
/// No partial result is produced.
///
/// # Examples
///
/// ```no_run
/// use packwright_packager::identity::{ComponentIdentity, ModuleCoordinate};
/// use packwright_packager::merge::{Instructions, SourceArtifact, merge_instructions};
/// use packwright_packager::relocation::Relocations;
///
/// let coordinate = ModuleCoordinate::try_from("com.acme:core:1.2.3").expect("valid");
/// let artifacts = [SourceArtifact::new("libs/core.jar", ComponentIdentity::Module(coordinate))];
/// let merged = merge_instructions(&Instructions::new(), &artifacts, &Relocations::new())
///     .expect("readable jars");
/// println!("{}", merged["Export-Package"]);
/// ```
pub fn merge_instructions(
    user_instructions: &Instructions,
    artifacts: &[SourceArtifact],
    relocations: &Relocations,
) -> Result<Instructions, MergeError> {
    let mut merged = user_instructions.clone();
    let user_export_package = merged.remove(EXPORT_PACKAGE);

    // User negations go first so they win over every derived pattern.
    let mut exports: Vec<String> = user_export_package
        .filter(|value| !value.trim().is_empty())
        .into_iter()
        .collect();

    for artifact in artifacts {
        exports.extend(artifact_exports(artifact, relocations)?);
    }

    let value = join_distinct(exports);
    debug!("merged {EXPORT_PACKAGE}: {value}");
    merged.insert(EXPORT_PACKAGE.to_owned(), value);
    Ok(merged)
}

/// Derives the marker-prefixed export instructions of a single artifact.
fn artifact_exports(
    artifact: &SourceArtifact,
    relocations: &Relocations,
) -> Result<Vec<String>, MergeError> {
    let mut jar = JarFile::open(artifact.path())?;

    match jar.export_package()? {
        Some(header) => {
            trace!(
                "{} is a bundle; reusing its {EXPORT_PACKAGE} header",
                artifact.path().display()
            );
            Ok(bundle_exports(&header))
        }
        None => {
            let packages = jar.exportable_packages();
            if packages.is_empty() {
                trace!("{} has no exportable packages", artifact.path().display());
                return Ok(Vec::new());
            }
            let version = artifact.identity().export_version().map_err(|identity| {
                MergeError::UnsupportedIdentity {
                    identity: identity.clone(),
                    artifact: artifact.path().to_path_buf(),
                }
            })?;
            trace!(
                "{} is a plain jar; deriving exports from its packages",
                artifact.path().display()
            );
            Ok(packages
                .iter()
                .map(|package| package_export(&relocations.relocate_package(package), version))
                .collect())
        }
    }
}

/// Splits an existing bundle header and drops its `uses` directives.
fn bundle_exports(header: &str) -> Vec<String> {
    split_export_header(header)
        .into_iter()
        .map(strip_uses)
        .filter(|fragment| !fragment.trim().is_empty())
        .map(|fragment| with_marker(fragment.trim()))
        .collect()
}

fn package_export(package: &str, version: Option<&str>) -> String {
    let instruction = ExportInstruction::new(package);
    let instruction = match version {
        Some(version) => instruction.with_attribute("version", version),
        None => instruction,
    };
    format!("{NO_OP_MARKER}{instruction}")
}

fn join_distinct(exports: Vec<String>) -> String {
    let mut seen = HashSet::new();
    exports
        .into_iter()
        .filter(|export| seen.insert(export.clone()))
        .collect::<Vec<_>>()
        .join(EXPORT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{ModuleCoordinate, ProjectPath};
    use crate::relocation::RelocationRule;
    use crate::test_utils::JarFixture;
    use rstest::{fixture, rstest};

    fn module(coordinate: &str) -> ComponentIdentity {
        ComponentIdentity::Module(ModuleCoordinate::try_from(coordinate).expect("valid coordinate"))
    }

    fn project(path: &str) -> ComponentIdentity {
        ComponentIdentity::Project(ProjectPath::try_from(path).expect("valid project path"))
    }

    fn instructions(entries: &[(&str, &str)]) -> Instructions {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    fn acme_relocations() -> Relocations {
        [RelocationRule::new("com.acme.", "shaded.com.acme.")]
            .into_iter()
            .collect()
    }

    #[fixture]
    fn acme_jar() -> JarFixture {
        JarFixture::new()
            .class("com/acme/core/Engine.class")
            .class("com/acme/util/Strings.class")
            .file("META-INF/services/com.acme.Spi", "com.acme.core.Engine")
            .build()
    }

    #[fixture]
    fn bundle_jar() -> JarFixture {
        JarFixture::new()
            .manifest(&[("Export-Package", r#"com.foo;uses:="com.bar",com.baz"#)])
            .class("com/foo/Foo.class")
            .class("com/baz/Baz.class")
            .build()
    }

    fn export_package(merged: &Instructions) -> &str {
        merged
            .get(EXPORT_PACKAGE)
            .map(String::as_str)
            .expect("Export-Package is always set")
    }

    #[rstest]
    fn plain_jar_exports_relocated_versioned_packages(acme_jar: JarFixture) {
        let artifacts = [SourceArtifact::new(acme_jar.path(), module("com.acme:acme:1.2.3"))];

        let merged =
            merge_instructions(&Instructions::new(), &artifacts, &acme_relocations()).expect("merge");

        assert_eq!(
            export_package(&merged),
            r#"[0-9]?shaded.com.acme.core;version="1.2.3", [0-9]?shaded.com.acme.util;version="1.2.3""#
        );
    }

    #[rstest]
    fn project_artifacts_export_without_version(acme_jar: JarFixture) {
        let artifacts = [SourceArtifact::new(acme_jar.path(), project(":acme"))];

        let merged =
            merge_instructions(&Instructions::new(), &artifacts, &Relocations::new()).expect("merge");

        assert_eq!(
            export_package(&merged),
            "[0-9]?com.acme.core, [0-9]?com.acme.util"
        );
    }

    #[rstest]
    fn bundle_headers_lose_uses_clauses(bundle_jar: JarFixture) {
        let artifacts = [SourceArtifact::new(bundle_jar.path(), module("com.foo:foo:9.9"))];

        let merged =
            merge_instructions(&Instructions::new(), &artifacts, &acme_relocations()).expect("merge");

        let value = export_package(&merged);
        assert_eq!(value, "[0-9]?com.foo, [0-9]?com.baz");
        assert!(!value.contains("uses:="));
    }

    #[test]
    fn bundle_fragments_are_trimmed() {
        let spaced = JarFixture::new()
            .manifest(&[("Export-Package", r#"com.foo;version="1.0", com.bar"#)])
            .build();
        let artifacts = [SourceArtifact::new(spaced.path(), module("com.foo:foo:1.0"))];

        let merged =
            merge_instructions(&Instructions::new(), &artifacts, &Relocations::new()).expect("merge");

        assert_eq!(
            export_package(&merged),
            r#"[0-9]?com.foo;version="1.0", [0-9]?com.bar"#
        );
    }

    #[rstest]
    fn user_negations_come_first(acme_jar: JarFixture) {
        let user = instructions(&[
            ("Export-Package", "!com.acme.internal.*"),
            ("Bundle-SymbolicName", "org.acme.packaged"),
        ]);
        let artifacts = [SourceArtifact::new(acme_jar.path(), module("com.acme:acme:1.2.3"))];

        let merged = merge_instructions(&user, &artifacts, &acme_relocations()).expect("merge");

        assert!(export_package(&merged).starts_with("!com.acme.internal.*, [0-9]?shaded.com.acme.core"));
        assert_eq!(
            merged.get("Bundle-SymbolicName").map(String::as_str),
            Some("org.acme.packaged")
        );
    }

    #[test]
    fn identical_fragments_appear_once() {
        let first = JarFixture::new().class("com/shared/A.class").build();
        let second = JarFixture::new().class("com/shared/B.class").build();
        let artifacts = [
            SourceArtifact::new(first.path(), module("com.shared:a:1.0")),
            SourceArtifact::new(second.path(), module("com.shared:b:1.0")),
        ];

        let merged =
            merge_instructions(&Instructions::new(), &artifacts, &Relocations::new()).expect("merge");

        assert_eq!(export_package(&merged), r#"[0-9]?com.shared;version="1.0""#);
    }

    #[rstest]
    fn opaque_identity_is_rejected(acme_jar: JarFixture) {
        let artifacts = [SourceArtifact::new(
            acme_jar.path(),
            ComponentIdentity::Opaque("acme.jar".to_owned()),
        )];

        let result = merge_instructions(&Instructions::new(), &artifacts, &Relocations::new());

        assert!(matches!(result, Err(MergeError::UnsupportedIdentity { .. })));
    }

    #[test]
    fn opaque_identity_without_packages_contributes_nothing() {
        let empty = JarFixture::new().file("META-INF/LICENSE", "ASL 2.0").build();
        let artifacts = [SourceArtifact::new(
            empty.path(),
            ComponentIdentity::Opaque("empty.jar".to_owned()),
        )];

        let merged =
            merge_instructions(&Instructions::new(), &artifacts, &Relocations::new()).expect("merge");

        assert_eq!(export_package(&merged), "");
    }

    #[rstest]
    fn opaque_bundles_are_accepted(bundle_jar: JarFixture) {
        let artifacts = [SourceArtifact::new(
            bundle_jar.path(),
            ComponentIdentity::Opaque("foo.jar".to_owned()),
        )];

        let merged =
            merge_instructions(&Instructions::new(), &artifacts, &Relocations::new()).expect("merge");

        assert_eq!(export_package(&merged), "[0-9]?com.foo, [0-9]?com.baz");
    }

    #[test]
    fn metadata_only_jar_contributes_nothing() {
        let empty = JarFixture::new().file("META-INF/LICENSE", "ASL 2.0").build();
        let artifacts = [SourceArtifact::new(empty.path(), module("com.acme:empty:1.0"))];

        let merged =
            merge_instructions(&Instructions::new(), &artifacts, &Relocations::new()).expect("merge");

        assert_eq!(export_package(&merged), "");
    }

    #[rstest]
    fn unreadable_jar_aborts_the_merge(acme_jar: JarFixture) {
        let dir = tempfile::tempdir().expect("temp dir");
        let broken = dir.path().join("broken.jar");
        std::fs::write(&broken, b"not a jar").expect("write");
        let artifacts = [
            SourceArtifact::new(acme_jar.path(), module("com.acme:acme:1.2.3")),
            SourceArtifact::new(&broken, module("com.acme:broken:1.0")),
        ];

        let result = merge_instructions(&Instructions::new(), &artifacts, &Relocations::new());

        assert!(matches!(result, Err(MergeError::Jar(error)) if error.path == broken));
    }

    #[rstest]
    fn merging_is_deterministic(acme_jar: JarFixture, bundle_jar: JarFixture) {
        let user = instructions(&[("Export-Package", "!com.acme.internal.*")]);
        let artifacts = [
            SourceArtifact::new(acme_jar.path(), module("com.acme:acme:1.2.3")),
            SourceArtifact::new(bundle_jar.path(), module("com.foo:foo:9.9")),
        ];

        let first = merge_instructions(&user, &artifacts, &acme_relocations()).expect("merge");
        let second = merge_instructions(&user, &artifacts, &acme_relocations()).expect("merge");

        assert_eq!(first, second);
    }

    #[rstest]
    fn remerging_output_only_doubles_the_marker(acme_jar: JarFixture) {
        let artifacts = [SourceArtifact::new(acme_jar.path(), module("com.acme:acme:1.2.3"))];
        let merged =
            merge_instructions(&Instructions::new(), &artifacts, &acme_relocations()).expect("merge");
        let header = export_package(&merged).replace(EXPORT_SEPARATOR, ",");
        let rebundled = JarFixture::new()
            .manifest(&[("Export-Package", header.as_str())])
            .build();

        let remerged = merge_instructions(
            &Instructions::new(),
            &[SourceArtifact::new(rebundled.path(), module("com.acme:acme:1.2.3"))],
            &Relocations::new(),
        )
        .expect("merge");

        assert_eq!(
            export_package(&remerged),
            export_package(&merged).replace("[0-9]?", "[0-9]?[0-9]?")
        );
    }
}

//! Component identities of contributing artifacts.
//!
//! Dependency resolution hands every artifact over together with the
//! identity of the component that produced it. Only two kinds matter when
//! deriving export versions: external modules, which carry a version, and
//! projects of the same build, which do not. Anything else (a bare file
//! dependency, for instance) is kept as [`ComponentIdentity::Opaque`] and
//! rejected once a version has to be derived from it.

use std::fmt;
use thiserror::Error;

/// Errors arising from identity parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// A module coordinate is not `group:name:version`.
    #[error("invalid module coordinate '{value}': {reason}")]
    InvalidCoordinate {
        /// The rejected value.
        value: String,
        /// Description of the problem.
        reason: String,
    },

    /// A project path does not start with `:`.
    #[error("invalid project path '{value}': project paths start with ':'")]
    InvalidProjectPath {
        /// The rejected value.
        value: String,
    },
}

/// A validated `group:name:version` module coordinate.
///
/// # Examples
///
/// ```
/// use packwright_packager::identity::ModuleCoordinate;
///
/// let coordinate = ModuleCoordinate::try_from("com.acme:acme-core:1.2.3").expect("valid");
/// assert_eq!(coordinate.version(), "1.2.3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleCoordinate {
    group: String,
    name: String,
    version: String,
}

impl ModuleCoordinate {
    /// The module group.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// The module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The module version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl TryFrom<&str> for ModuleCoordinate {
    type Error = IdentityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let invalid = |reason: &str| IdentityError::InvalidCoordinate {
            value: value.to_owned(),
            reason: reason.to_owned(),
        };

        let parts: Vec<&str> = value.split(':').collect();
        let [group, name, version] = parts.as_slice() else {
            return Err(invalid("expected exactly three ':'-separated parts"));
        };
        if [group, name, version].iter().any(|part| part.trim().is_empty()) {
            return Err(invalid("parts must not be blank"));
        }
        if version.contains(char::is_whitespace) {
            return Err(invalid("version must not contain whitespace"));
        }

        Ok(Self {
            group: (*group).to_owned(),
            name: (*name).to_owned(),
            version: (*version).to_owned(),
        })
    }
}

impl fmt::Display for ModuleCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

/// A reference to another project of the same build, such as `:core`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectPath(String);

impl ProjectPath {
    /// Return the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for ProjectPath {
    type Error = IdentityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.starts_with(':') {
            Ok(Self(value.to_owned()))
        } else {
            Err(IdentityError::InvalidProjectPath {
                value: value.to_owned(),
            })
        }
    }
}

impl fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The component an artifact was resolved from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComponentIdentity {
    /// An external module with a version.
    Module(ModuleCoordinate),
    /// A project of the same build.
    Project(ProjectPath),
    /// Any other kind of component, described by its display name.
    Opaque(String),
}

impl ComponentIdentity {
    /// The version to attach to exports derived from this component.
    ///
    /// Returns `Some(version)` for modules, `None` for projects, and an
    /// error for opaque identities.
    ///
    /// # Errors
    ///
    /// Returns the identity itself when no version policy applies to it.
    pub fn export_version(&self) -> Result<Option<&str>, &Self> {
        match self {
            Self::Module(coordinate) => Ok(Some(coordinate.version())),
            Self::Project(_) => Ok(None),
            Self::Opaque(_) => Err(self),
        }
    }
}

impl fmt::Display for ComponentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module(coordinate) => write!(f, "module {coordinate}"),
            Self::Project(path) => write!(f, "project {path}"),
            Self::Opaque(name) => write!(f, "{name}"),
        }
    }
}

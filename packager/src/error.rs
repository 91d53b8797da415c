//! Error types for the `packwright` CLI.
//!
//! Each library error converts into [`PackagerError`] so the binary can
//! report any failure with a single message and exit code.

use crate::archive::JarError;
use crate::bundle::BundleError;
use crate::identity::IdentityError;
use crate::merge::MergeError;
use crate::relocation::RelocationError;
use packwright::ConfigError;
use thiserror::Error;

/// Errors that can occur during a packaging run.
#[derive(Debug, Error)]
pub enum PackagerError {
    /// The packaging descriptor could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An artifact declares an invalid identity.
    #[error("invalid artifact identity: {0}")]
    Identity(#[from] IdentityError),

    /// A relocation rule is invalid.
    #[error("invalid relocation: {0}")]
    Relocation(#[from] RelocationError),

    /// Instruction merging failed.
    #[error("cannot merge instructions: {0}")]
    Merge(#[from] MergeError),

    /// The bundle step failed.
    #[error(transparent)]
    Bundle(#[from] BundleError),

    /// A jar could not be read.
    #[error(transparent)]
    Jar(#[from] JarError),

    /// Failed to write output.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using [`PackagerError`].
pub type Result<T> = std::result::Result<T, PackagerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn merge_errors_name_the_artifact() {
        let err = PackagerError::from(MergeError::UnsupportedIdentity {
            identity: crate::identity::ComponentIdentity::Opaque("libs/x.jar".to_owned()),
            artifact: PathBuf::from("libs/x.jar"),
        });

        let msg = err.to_string();
        assert!(msg.starts_with("cannot merge instructions"));
        assert!(msg.contains("libs/x.jar"));
    }

    #[test]
    fn bundle_errors_keep_their_message() {
        let err = PackagerError::from(BundleError::Invalid {
            name: "acme.jar".to_owned(),
            errors: Vec::new(),
        });

        assert_eq!(err.to_string(), "Bundle acme.jar has errors");
    }
}

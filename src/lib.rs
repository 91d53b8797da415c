//! Packaging descriptor shared by the `packwright` CLI and library callers.

pub mod config;

pub use config::{
    ArtifactSpec, ConfigError, DEFAULT_CONFIG_FILE, DeclaredIdentity, PackagingConfig,
    RelocationSpec,
};

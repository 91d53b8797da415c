//! Shared packaging building blocks: the JAR manifest codec, `Export-Package`
//! instruction helpers, and Maven to OSGi version conversion.
//!
//! Nothing in this crate touches the file system; archive access lives in
//! `packwright-packager`.

pub mod export;
pub mod manifest;
pub mod version;

pub use export::{
    Clause, EXPORT_PACKAGE, ExportError, ExportInstruction, NO_OP_MARKER, split_export_header,
    strip_uses, with_marker,
};
pub use manifest::{Attributes, MANIFEST_VERSION, Manifest, ManifestError, Section, is_valid_header_name};
pub use version::{BUNDLE_VERSION, OsgiVersion};

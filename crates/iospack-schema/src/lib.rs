//! Web manifest model and iOS package option derivation for iospack.
//!
//! This crate defines the schema layer: JSON web manifest parsing (`Manifest`),
//! the pure derivation of default iOS package options from a manifest
//! (`derive_package_options`), and the identifier newtypes shared by the
//! remote client and the generation orchestrator (`RequestId`, `ArchiveRef`).

pub mod manifest;
pub mod options;
pub mod types;

pub use manifest::{parse_manifest_file, parse_manifest_str, Manifest, ManifestError, ManifestIcon};
pub use options::{
    derive_package_options, PackageOptions, PackageOverrides, DEFAULT_COLOR, PLACEHOLDER_APP_NAME,
    PLACEHOLDER_ICON_URL,
};
pub use types::{ArchiveRef, RequestId};

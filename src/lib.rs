//! octpkg: package management for GNU Octave
//!
//! This crate holds the resolver, registry, load-order engine and install
//! transactions, re-exporting the shared types from `octpkg-core`.

pub use octpkg_core::{format_error_with_help, DependencyConstraint, ErrorHelp, OctpkgError, OctpkgResult, PackageId};

/// Core module re-exported from octpkg-core.
pub mod core {
    pub use octpkg_core::core::*;
    pub use octpkg_core::{format_error_with_help, ErrorHelp, OctpkgError, OctpkgResult};
}

/// Configuration management.
pub mod config;

/// Source and index caching.
pub mod cache;

/// Package index adapter and client.
pub mod index;

/// "Did you mean" suggestions for package names.
pub mod suggest;

/// Installed-package registry.
pub mod registry;

/// Load order and search path.
pub mod loader;

/// Dependency resolution.
pub mod resolver;

/// Install and uninstall transactions and their collaborators.
pub mod package;

/// Dependency injection infrastructure.
pub mod di;

//! Core types shared by the octpkg binary and library.
//!
//! Holds the error taxonomy, filesystem layout helpers, the version
//! comparator and the package id / dependency constraint model.

pub mod core;
pub mod package;

pub use core::error::{OctpkgError, OctpkgResult};
pub use core::error_help::{format_error_with_help, ErrorHelp};
pub use package::{DependencyConstraint, Operator, PackageId};

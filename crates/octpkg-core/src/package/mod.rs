//! Package identity and dependency constraints.

pub mod constraint;
pub mod id;

pub use constraint::{DependencyConstraint, Operator};
pub use id::PackageId;

/// Name of the host interpreter when it appears as a dependency.
pub const HOST_RUNTIME: &str = "octave";

/// Self-referential dependency emitted by some index entries; always ignored.
pub const BOOTSTRAP_DEPENDENCY: &str = "pkg";

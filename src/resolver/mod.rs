//! Dependency resolution

pub mod dependency_graph;
pub mod dependency_resolver;
pub mod item;

pub use dependency_graph::DependencyGraph;
pub use dependency_resolver::{DependencyResolver, Resolution, ResolveOptions, MAX_ROUNDS};
pub use item::{PlanItem, ResolutionItem};

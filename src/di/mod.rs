//! Dependency injection infrastructure
//!
//! # Example (Testing)
//! ```ignore
//! use octpkg::di::{ServiceContainer, mocks::*};
//! use std::sync::Arc;
//!
//! let container = ServiceContainer::with_providers(
//!     Arc::new(MockSourceFetcher::new()),
//!     Arc::new(MockNativeBuilder::new()),
//!     Arc::new(MockHookRunner::new()),
//! );
//! ```

pub mod container;
#[cfg(test)]
pub mod mocks;
pub mod traits;

pub use container::ServiceContainer;
pub use traits::{BuildOutput, HookRunner, NativeBuilder, SourceFetcher};

//! Integration tests for the `octpkg` binary
//!
//! Each test gets its own home directory, prefixes and a `file://` index.

mod common;
mod install;
mod lifecycle;

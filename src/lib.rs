//! docsrv - Versioned documentation builder
//!
//! Resolves `(project, version)` requests against published releases,
//! builds each version's documentation at most once at a time and serves
//! the built tree from a local docs root.

pub mod build;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod latest;
pub mod release;
pub mod resolver;
pub mod store;
pub mod ui;
pub mod version;

pub use error::{DocError, DocResult};
pub use resolver::{Artifact, DocResolver, ResolverSettings, LATEST};

//! Core types and shared functionality for docstash.
//!
//! This crate provides:
//! - Descriptor-keyed blob store on the local filesystem
//! - Write-through fingerprint cache
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod metadata;

pub use cache::{BlobStore, FingerprintCache, PayloadKind};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use metadata::Metadata;

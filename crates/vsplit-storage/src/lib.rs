//! Cloudflare R2 storage client.
//!
//! This crate provides:
//! - File upload to R2
//! - Public or presigned object URLs
//! - The [`ArtifactUploader`] seam used to publish split outputs

pub mod client;
pub mod error;
pub mod operations;

pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use operations::{content_type_for, split_key, ArtifactUploader, SPLIT_PREFIX};

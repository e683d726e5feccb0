//! Common utilities and shared types for pantry.
//!
//! This crate provides foundational components used across all pantry crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Storage**: Local file storage for uploaded images
//! - **Image payloads**: Base64 data-URL decoding via [`decode_image_payload`]

pub mod config;
pub mod data_url;
pub mod error;
pub mod id;
pub mod storage;

pub use config::Config;
pub use data_url::{decode_image_payload, ImagePayload};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use storage::{generate_storage_key, LocalStorage, StorageBackend, StoredFile};

//! Local storage for uploaded images and their cropped derivatives.
//!
//! This crate provides:
//! - Opaque storage keys generated per upload (`StorageKey`)
//! - Path resolution under a single upload root (`StorageRoot`)
//! - Atomic temp-file-then-rename writes

pub mod error;
pub mod fs_utils;
pub mod key;
pub mod root;

pub use error::{StorageError, StorageResult};
pub use fs_utils::write_atomic;
pub use key::{StorageKey, DERIVED_PREFIX};
pub use root::{StorageRoot, StoredUpload};

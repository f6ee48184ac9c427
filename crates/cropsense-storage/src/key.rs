//! Opaque storage keys.
//!
//! Client filenames never become paths. Every upload gets a fresh
//! `<32 hex chars>[.<ext>]` key, and its derivative lives at `cropped_<key>`.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

/// Prefix that marks a derived (cropped) object.
pub const DERIVED_PREFIX: &str = "cropped_";

const TOKEN_LEN: usize = 32;
const MAX_EXTENSION_LEN: usize = 8;

/// Name of a stored object inside the upload root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    /// Generate a fresh key, keeping the extension of `original_filename`
    /// when it is a plausible one.
    pub fn generate(original_filename: &str) -> Self {
        let token = Uuid::new_v4().simple().to_string();
        match sanitized_extension(original_filename) {
            Some(ext) => Self(format!("{token}.{ext}")),
            None => Self(token),
        }
    }

    /// Validate a key received from a client (e.g. in a download URL).
    pub fn parse(raw: &str) -> StorageResult<Self> {
        let body = raw.strip_prefix(DERIVED_PREFIX).unwrap_or(raw);
        let (token, ext) = match body.split_once('.') {
            Some((token, ext)) => (token, Some(ext)),
            None => (body, None),
        };

        let token_ok = token.len() == TOKEN_LEN
            && token
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        let ext_ok = ext.map_or(true, |ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext
                    .bytes()
                    .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
        });

        if token_ok && ext_ok {
            Ok(Self(raw.to_string()))
        } else {
            Err(StorageError::invalid_key(raw))
        }
    }

    /// Key of the cropped derivative. A derived key maps to itself.
    pub fn derived(&self) -> Self {
        if self.is_derived() {
            self.clone()
        } else {
            Self(format!("{DERIVED_PREFIX}{}", self.0))
        }
    }

    pub fn is_derived(&self) -> bool {
        self.0.starts_with(DERIVED_PREFIX)
    }

    pub fn extension(&self) -> Option<&str> {
        self.0.split_once('.').map(|(_, ext)| ext)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// MIME type guessed from the extension.
    pub fn content_type(&self) -> &'static str {
        match self.extension() {
            Some("png") => "image/png",
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("bmp") => "image/bmp",
            Some("webp") => "image/webp",
            Some("tif" | "tiff") => "image/tiff",
            _ => "application/octet-stream",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lowercased alphanumeric extension of the last path component, if any.
fn sanitized_extension(filename: &str) -> Option<String> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        // dotfile such as ".png"
        return None;
    }

    let ext: String = ext
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if ext.is_empty() || ext.len() > MAX_EXTENSION_LEN {
        None
    } else {
        Some(ext)
    }
}

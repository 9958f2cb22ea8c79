//! Font families available to the text tool, including user-imported fonts.

use crate::storage::{Storage, StorageError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Families every installation offers.
pub const BUILTIN_FONTS: &[&str] = &[
    "Arial",
    "Times New Roman",
    "Courier New",
    "Garamond",
    "Comic Sans MS",
    "Arial Black",
    "Impact",
];

/// Storage key suffix for saved fonts.
const SAVED_FONT_SUFFIX: &str = ".ttf";

/// Font import errors.
#[derive(Debug, Error)]
pub enum FontError {
    #[error("Unsupported font format: {0}")]
    UnsupportedFormat(String),
    #[error("Font file has no usable name: {0}")]
    InvalidName(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Recognised font containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFormat {
    TrueType,
    OpenType,
    Woff,
    Woff2,
}

impl FontFormat {
    /// Detect the container from the first four bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        let magic = data.get(..4)?;
        if magic == [0x00, 0x01, 0x00, 0x00] || magic == b"true" {
            Some(FontFormat::TrueType)
        } else if magic == b"OTTO" {
            Some(FontFormat::OpenType)
        } else if magic == b"wOFF" {
            Some(FontFormat::Woff)
        } else if magic == b"wOF2" {
            Some(FontFormat::Woff2)
        } else {
            None
        }
    }
}

/// How a font is stored: the raw bytes as a JSON number array.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SavedFont {
    data: Vec<u8>,
    name: String,
}

/// Known font families.
#[derive(Debug, Clone)]
pub struct FontLibrary {
    families: Vec<String>,
    imported: HashMap<String, Vec<u8>>,
}

impl Default for FontLibrary {
    fn default() -> Self {
        Self {
            families: BUILTIN_FONTS.iter().map(|f| f.to_string()).collect(),
            imported: HashMap::new(),
        }
    }
}

impl FontLibrary {
    /// Library with the built-in families only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Family names in the order they are offered.
    pub fn families(&self) -> &[String] {
        &self.families
    }

    /// Whether text in `family` can be placed without waiting.
    pub fn is_available(&self, family: &str) -> bool {
        self.families.iter().any(|f| f == family)
    }

    /// Bytes of an imported family.
    pub fn data(&self, family: &str) -> Option<&[u8]> {
        self.imported.get(family).map(Vec::as_slice)
    }

    fn register(&mut self, name: String, data: Vec<u8>) {
        if !self.is_available(&name) {
            self.families.push(name.clone());
        }
        self.imported.insert(name, data);
    }

    /// Import a font file, register its family and save it to storage.
    ///
    /// The family name is the file stem. Returns the family name.
    pub fn import(
        &mut self,
        file_name: &str,
        data: Vec<u8>,
        storage: &dyn Storage,
    ) -> Result<String, FontError> {
        if FontFormat::from_magic_bytes(&data).is_none() {
            return Err(FontError::UnsupportedFormat(file_name.to_string()));
        }
        let name = std::path::Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| FontError::InvalidName(file_name.to_string()))?
            .to_string();

        let saved = SavedFont {
            data,
            name: name.clone(),
        };
        storage.set(
            &format!("{}{}", name, SAVED_FONT_SUFFIX),
            &serde_json::to_string(&saved)?,
        )?;
        log::info!("Imported font {}", name);
        self.register(name.clone(), saved.data);
        Ok(name)
    }

    /// Register every font saved in storage. Unreadable entries are logged
    /// and skipped. Returns how many fonts were loaded.
    pub fn load_saved(&mut self, storage: &dyn Storage) -> Result<usize, FontError> {
        let mut loaded = 0;
        for key in storage.keys()? {
            if !key.ends_with(SAVED_FONT_SUFFIX) {
                continue;
            }
            let Some(value) = storage.get(&key)? else {
                continue;
            };
            match serde_json::from_str::<SavedFont>(&value) {
                Ok(saved) => {
                    self.register(saved.name, saved.data);
                    loaded += 1;
                }
                Err(e) => log::warn!("Failed to load saved font {}: {}", key, e),
            }
        }
        Ok(loaded)
    }
}

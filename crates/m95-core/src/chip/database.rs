//! Part database for runtime loading and lookup
//!
//! This module provides the `PartDatabase` type for adding part
//! definitions from RON on top of the built-in table.

use std::string::String;
use std::vec::Vec;

use super::types::{Geometry, PARTS};
use thiserror::Error;

/// Error type for part database operations
#[derive(Debug, Error)]
pub enum PartDbError {
    /// RON parsing error
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

// ============================================================================
// RON deserialization types (intermediate format)
// ============================================================================

/// Size specification with human-readable units (for RON parsing)
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub enum Size {
    /// Size in bytes
    B(u32),
    /// Size in kibibytes (1024 bytes)
    KiB(u32),
}

impl Size {
    /// Convert to bytes, or `None` if the size does not fit in 32 bits
    pub fn to_bytes(self) -> Option<u32> {
        match self {
            Size::B(n) => Some(n),
            Size::KiB(n) => n.checked_mul(1024),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct PartDef {
    name: String,
    total_size: Size,
    page_size: u32,
    address_bytes: u8,
    #[serde(default)]
    id_page: bool,
    #[serde(default = "default_max_clock")]
    max_clock_hz: u32,
}

fn default_max_clock() -> u32 {
    crate::bus::DEFAULT_CLOCK_HZ
}

#[derive(Debug, serde::Deserialize)]
struct PartFile {
    parts: Vec<PartDef>,
}

/// A part loaded at runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartEntry {
    /// Part name
    pub name: String,
    /// Part geometry
    pub geometry: Geometry,
}

/// Built-in parts plus parts loaded from RON
#[derive(Debug, Clone)]
pub struct PartDatabase {
    parts: Vec<PartEntry>,
}

impl Default for PartDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl PartDatabase {
    /// Create a database seeded with the built-in table
    pub fn new() -> Self {
        let parts = PARTS
            .iter()
            .map(|p| PartEntry {
                name: p.name.into(),
                geometry: p.geometry,
            })
            .collect();
        Self { parts }
    }

    /// Load part definitions from a RON string
    ///
    /// Parts whose name already exists replace the earlier definition.
    /// Returns the number of parts loaded.
    pub fn load_ron(&mut self, ron_str: &str) -> Result<usize, PartDbError> {
        let file: PartFile = ron::from_str(ron_str)?;
        let count = file.parts.len();

        for def in file.parts {
            let total_size = def.total_size.to_bytes().ok_or_else(|| {
                PartDbError::Validation(std::format!("{}: total size too large", def.name))
            })?;
            let geometry = Geometry {
                total_size,
                page_size: def.page_size,
                address_bytes: def.address_bytes,
                id_page: def.id_page,
                max_clock_hz: def.max_clock_hz,
            };
            validate(&def.name, &geometry)?;

            log::debug!(
                "m95: loaded part {} ({} bytes, {}-byte pages)",
                def.name,
                geometry.total_size,
                geometry.page_size
            );
            self.parts.retain(|p| !p.name.eq_ignore_ascii_case(&def.name));
            self.parts.push(PartEntry {
                name: def.name,
                geometry,
            });
        }

        Ok(count)
    }

    /// Find a part by name (case-insensitive)
    pub fn find(&self, name: &str) -> Option<&PartEntry> {
        self.parts.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Get the number of parts
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Check if the database is empty
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Iterate over all parts
    pub fn iter(&self) -> impl Iterator<Item = &PartEntry> {
        self.parts.iter()
    }
}

fn validate(name: &str, g: &Geometry) -> Result<(), PartDbError> {
    if !(1..=3).contains(&g.address_bytes) {
        return Err(PartDbError::Validation(std::format!(
            "{}: address_bytes must be 1, 2 or 3, got {}",
            name, g.address_bytes
        )));
    }
    if g.page_size == 0 || g.total_size % g.page_size != 0 {
        return Err(PartDbError::Validation(std::format!(
            "{}: page size {} does not divide total size {}",
            name, g.page_size, g.total_size
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_ron() {
        let ron = r#"
        (
            parts: [
                (
                    name: "CAT25256",
                    total_size: KiB(32),
                    page_size: 64,
                    address_bytes: 2,
                ),
                (
                    name: "M95256-D",
                    total_size: KiB(32),
                    page_size: 64,
                    address_bytes: 2,
                    id_page: true,
                    max_clock_hz: 5000000,
                ),
            ],
        )
        "#;

        let mut db = PartDatabase::new();
        let builtin = db.len();
        let count = db.load_ron(ron).unwrap();

        assert_eq!(count, 2);
        assert_eq!(db.len(), builtin + 1);

        let cat = db.find("cat25256").unwrap();
        assert_eq!(cat.geometry.total_size, 32 * 1024);
        assert!(!cat.geometry.id_page);
        assert_eq!(cat.geometry.max_clock_hz, crate::bus::DEFAULT_CLOCK_HZ);

        let m95 = db.find("M95256-D").unwrap();
        assert_eq!(m95.geometry.max_clock_hz, 5_000_000);
    }

    #[test]
    fn test_reject_bad_width() {
        let ron = r#"(parts: [(name: "X", total_size: B(256), page_size: 16, address_bytes: 4)])"#;
        let mut db = PartDatabase::new();
        assert!(matches!(db.load_ron(ron), Err(PartDbError::Validation(_))));
    }

    #[test]
    fn test_size_conversion() {
        assert_eq!(Size::B(256).to_bytes(), Some(256));
        assert_eq!(Size::KiB(4).to_bytes(), Some(4096));
        assert_eq!(Size::KiB(u32::MAX).to_bytes(), None);
    }

    #[test]
    fn test_reject_oversized_part() {
        let ron = r#"(parts: [(name: "X", total_size: KiB(4294967295), page_size: 16, address_bytes: 3)])"#;
        let mut db = PartDatabase::new();
        let builtin = db.len();
        assert!(matches!(db.load_ron(ron), Err(PartDbError::Validation(_))));
        assert_eq!(db.len(), builtin);
    }
}

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::ApiError;

/// Record identifier: 24 lowercase hexadecimal characters, stored as TEXT.
///
/// The wire format is preserved from the original document-database ids so
/// existing clients keep working. Validation is purely syntactic and happens
/// before any database lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub const LEN: usize = 24;

    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        ObjectId(hex[..Self::LEN].to_string())
    }

    /// Syntactic validation: exactly 24 hex characters.
    pub fn is_valid(s: &str) -> bool {
        s.len() == Self::LEN && s.chars().all(|c| c.is_ascii_hexdigit())
    }

    pub fn parse(s: &str) -> Result<Self, ApiError> {
        if Self::is_valid(s) {
            Ok(ObjectId(s.to_lowercase()))
        } else {
            Err(ApiError::validation("Invalid ID format"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if ObjectId::is_valid(&s) {
            Ok(ObjectId(s.to_lowercase()))
        } else {
            Err(serde::de::Error::custom(format!("invalid object id: {s}")))
        }
    }
}

/// The six ability scores shared by characters, races, and features.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatBlock {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

/// Coinage carried by a character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Currency {
    pub platinum: i64,
    pub gold: i64,
    pub electrum: i64,
    pub silver: i64,
    pub copper: i64,
}

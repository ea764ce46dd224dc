//! Layer 1: Identity atoms
//!
//! SectorPrefix: 3-letter namespace a sector stamps onto its assets
//! AssetId: prefix + zero-padded sequence, minted once, never reused
//! BlockId/SectorId/RoomId/EntryId: store-style random identifiers

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{CoreError, InvalidId};

/// Sector abbreviation used as the asset ID namespace.
///
/// Exactly 3 ASCII letters, uppercased on parse. Sectors store the raw
/// string; parsing happens at allocation so a malformed legacy
/// abbreviation fails the mint, not the record decode.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SectorPrefix(String);

impl SectorPrefix {
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if s.chars().count() != 3 {
            return Err(InvalidId::Prefix {
                raw: s.to_string(),
                reason: "must be exactly 3 letters".into(),
            }
            .into());
        }
        if !s.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(InvalidId::Prefix {
                raw: s.to_string(),
                reason: "must contain only ASCII letters".into(),
            }
            .into());
        }
        Ok(Self(s.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric sequence of an asset id under this prefix.
    ///
    /// `None` for ids that do not belong to the prefix or whose suffix is
    /// not a plain decimal number (foreign/legacy ids the allocator skips).
    pub fn sequence_of(&self, raw: &str) -> Option<u64> {
        let rest = raw.strip_prefix(self.as_str())?;
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        rest.parse().ok()
    }
}

impl fmt::Debug for SectorPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SectorPrefix({:?})", self.0)
    }
}

impl fmt::Display for SectorPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SectorPrefix {
    type Error = CoreError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        SectorPrefix::parse(&s)
    }
}

impl From<SectorPrefix> for String {
    fn from(p: SectorPrefix) -> String {
        p.0
    }
}

/// Asset identifier - `{PREFIX}{SEQ}` format.
///
/// Prefix is 3 uppercase letters, sequence is 3+ decimal digits. Only the
/// allocator mints new ids; a minted id never changes and never comes back
/// after deletion.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Parse and validate an asset ID string.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let b = s.as_bytes();
        if b.len() < 3 || !b[..3].iter().all(u8::is_ascii_uppercase) {
            return Err(InvalidId::Asset {
                raw: s.to_string(),
                reason: "must start with three uppercase letters".into(),
            }
            .into());
        }
        let digits = &b[3..];
        if digits.len() < 3 || !digits.iter().all(u8::is_ascii_digit) {
            return Err(InvalidId::Asset {
                raw: s.to_string(),
                reason: "sequence must be at least three decimal digits".into(),
            }
            .into());
        }
        Ok(Self(s.to_string()))
    }

    /// Mint the id for a claimed sequence. Width grows past 999 naturally.
    ///
    /// Only the allocator should call this.
    pub(crate) fn mint(prefix: &SectorPrefix, seq: u64) -> Self {
        Self(format!("{}{:03}", prefix.as_str(), seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({:?})", self.0)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Block identifier - random, store-style.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        if s.is_empty() {
            Err(InvalidId::Block {
                raw: s,
                reason: "empty".into(),
            }
            .into())
        } else {
            Ok(Self(s))
        }
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({:?})", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sector identifier - random, store-style.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectorId(String);

impl SectorId {
    pub fn new(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        if s.is_empty() {
            Err(InvalidId::Sector {
                raw: s,
                reason: "empty".into(),
            }
            .into())
        } else {
            Ok(Self(s))
        }
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SectorId({:?})", self.0)
    }
}

impl fmt::Display for SectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Room identifier - random, store-style.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        if s.is_empty() {
            Err(InvalidId::Room {
                raw: s,
                reason: "empty".into(),
            }
            .into())
        } else {
            Ok(Self(s))
        }
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoomId({:?})", self.0)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Audit/activity entry identifier - random, store-style.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        if s.is_empty() {
            Err(InvalidId::Entry {
                raw: s,
                reason: "empty".into(),
            }
            .into())
        } else {
            Ok(Self(s))
        }
    }

    /// Generate a new entry ID.
    ///
    /// Only mutation planning should call this.
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId({:?})", self.0)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

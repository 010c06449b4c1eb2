use derive_more::{AsRef, Deref, Display, From, Into};
use palette::Srgb;
use palette::rgb::FromHexError;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Catalog identifier. The draw service may report it as a number or as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrizeId {
    Number(i64),
    Text(String),
}

impl PrizeId {
    /// Numeric strings collapse onto the integer they name, so equal keys mean `matches`.
    pub fn key(&self) -> PrizeId {
        match self {
            PrizeId::Text(s) => match s.trim().parse::<i64>() {
                Ok(n) => PrizeId::Number(n),
                Err(_) => self.clone(),
            },
            PrizeId::Number(_) => self.clone(),
        }
    }

    /// Same value, or a numeric string naming the same integer.
    pub fn matches(&self, other: &PrizeId) -> bool {
        match (self, other) {
            (PrizeId::Number(a), PrizeId::Number(b)) => a == b,
            (PrizeId::Text(a), PrizeId::Text(b)) => a == b,
            (PrizeId::Number(n), PrizeId::Text(s)) | (PrizeId::Text(s), PrizeId::Number(n)) => {
                s.trim().parse::<i64>() == Ok(*n)
            }
        }
    }
}

impl fmt::Display for PrizeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrizeId::Number(n) => write!(f, "{}", n),
            PrizeId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for PrizeId {
    fn from(n: i64) -> Self {
        PrizeId::Number(n)
    }
}

impl From<&str> for PrizeId {
    fn from(s: &str) -> Self {
        PrizeId::Text(s.to_string())
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct PrizeName(String);

drawctl::impl_string_newtype!(PrizeName);

/// Card color, written as `#RRGGBB` or `#RGB`.
#[derive(Debug, Clone, Copy, PartialEq, SerializeDisplay, DeserializeFromStr)]
pub struct PrizeColor(Srgb<u8>);

impl PrizeColor {
    pub fn rgb(&self) -> (u8, u8, u8) {
        (self.0.red, self.0.green, self.0.blue)
    }
}

impl FromStr for PrizeColor {
    type Err = FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Srgb::<u8>::from_str(s.trim()).map(PrizeColor)
    }
}

impl fmt::Display for PrizeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (r, g, b) = self.rgb();
        write!(f, "#{:02X}{:02X}{:02X}", r, g, b)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrizeSpec {
    pub id: PrizeId,
    pub name: PrizeName,
    #[serde(default)]
    pub description: String,
    pub color: PrizeColor,
    #[serde(default)]
    pub image: Option<String>,
}

/// Identifies one card in the pool: the prize it shows plus which copy it is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayId {
    pub source: PrizeId,
    pub duplicate: usize,
}

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.duplicate)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoolEntry {
    pub display_id: DisplayId,
    pub duplicate_index: usize,
    pub prize: PrizeSpec,
}

impl PoolEntry {
    pub fn source_id(&self) -> &PrizeId {
        &self.prize.id
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExpandError {
    #[error("No prizes available")]
    EmptyCatalog,
    #[error("Pool length must be at least 1")]
    ZeroLength,
    #[error("Prize id '{0}' appears more than once in the catalog")]
    DuplicateId(PrizeId),
}

/// Fills `pool_length` slots round-robin from `catalog`.
///
/// Slot `i` shows `catalog[i % len]` and is copy number `i / len` of that prize, so every prize
/// appears at least `pool_length / len` times and each run of `len` consecutive slots covers
/// the catalog once.
pub fn expand(catalog: &[PrizeSpec], pool_length: usize) -> Result<Vec<PoolEntry>, ExpandError> {
    if catalog.is_empty() {
        return Err(ExpandError::EmptyCatalog);
    }
    if pool_length == 0 {
        return Err(ExpandError::ZeroLength);
    }

    let mut seen = HashSet::with_capacity(catalog.len());
    if let Some(dup) = catalog.iter().find(|p| !seen.insert(p.id.key())) {
        return Err(ExpandError::DuplicateId(dup.id.clone()));
    }

    let pool = (0..pool_length)
        .map(|slot| {
            let prize = &catalog[slot % catalog.len()];
            let duplicate_index = slot / catalog.len();
            PoolEntry {
                display_id: DisplayId {
                    source: prize.id.clone(),
                    duplicate: duplicate_index,
                },
                duplicate_index,
                prize: prize.clone(),
            }
        })
        .collect();

    Ok(pool)
}

use crate::sphere::pool::{PoolEntry, PrizeId, PrizeSpec};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What the draw service decided for a code.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawOutcome {
    pub is_winner: bool,
    #[serde(default)]
    pub prize_id: Option<PrizeId>,
    #[serde(default)]
    pub message: Option<String>,
}

impl DrawOutcome {
    pub fn winner(prize_id: impl Into<PrizeId>) -> Self {
        Self {
            is_winner: true,
            prize_id: Some(prize_id.into()),
            message: None,
        }
    }

    pub fn no_win() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// First slot showing the won prize.
    Matched(usize),
    /// No win, or the won prize is not in the active pool.
    Random(usize),
}

impl Resolution {
    pub fn index(&self) -> usize {
        match *self {
            Resolution::Matched(i) | Resolution::Random(i) => i,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Cannot pick a target in an empty pool")]
    EmptyPool,
}

/// Maps a draw outcome to the slot the spin has to stop on.
pub fn resolve<R: Rng>(
    outcome: &DrawOutcome,
    catalog: &[PrizeSpec],
    pool: &[PoolEntry],
    rng: &mut R,
) -> Result<Resolution, ResolveError> {
    if pool.is_empty() {
        return Err(ResolveError::EmptyPool);
    }

    if let Some(prize_id) = outcome.prize_id.as_ref().filter(|_| outcome.is_winner) {
        let slot = catalog
            .iter()
            .find(|prize| prize.id.matches(prize_id))
            .and_then(|prize| pool.iter().position(|e| e.source_id() == &prize.id));

        match slot {
            Some(index) => return Ok(Resolution::Matched(index)),
            None => log::warn!(
                "Won prize '{}' is not on the sphere, picking a random slot",
                prize_id
            ),
        }
    }

    Ok(Resolution::Random(rng.gen_range(0..pool.len())))
}

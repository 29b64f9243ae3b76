//! Claim and clear legality.
//!
//! Rule failures are ordinary return values: the caller gets a
//! [`RuleViolation`] whose `Display` is the message shown to the player.

use std::collections::BTreeSet;

use claimboard_protocol::{AllianceId, ClaimMap, TileId, TileLabels};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::adjacency::AdjacencyGraph;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Numbered tiles an alliance may hold at once (exempt number excluded).
    pub max_numbered_tiles: usize,
    /// The one tile number that never counts toward the cap.
    pub exempt_tile_number: u32,
    /// Whether the exempt tile still needs `number - 1` owned first.
    pub exempt_tile_requires_prerequisite: bool,
    /// Planned claims per alliance per simulated day before flagging.
    pub daily_claim_quota: u32,
    /// Confirmed moves an alliance gets each day.
    pub moves_per_day: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            max_numbered_tiles: 6,
            exempt_tile_number: 7,
            exempt_tile_requires_prerequisite: false,
            daily_claim_quota: 3,
            moves_per_day: 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RuleViolation {
    #[error("No moves remaining for today")]
    NoMovesRemaining,
    #[error("Tile already claimed by {alliance_name}")]
    AlreadyClaimed { alliance_name: String },
    #[error("Maximum of {max} numbered tiles reached (tile #{exempt} doesn't count)")]
    NumberedTileCap { max: usize, exempt: u32 },
    #[error("Must own a tile numbered {required} before claiming tile #{target}")]
    MissingPrerequisite { required: u32, target: u32 },
    #[error("Tile must be adjacent to an existing territory")]
    NotAdjacent,
    #[error("Tile is not claimed")]
    NotClaimed,
    #[error("Can only clear tiles belonging to your alliance")]
    NotOwner,
}

/// `{ valid, error }` shape for callers that want a flat verdict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub error: Option<String>,
}

impl From<Result<(), RuleViolation>> for ValidationReport {
    fn from(result: Result<(), RuleViolation>) -> Self {
        match result {
            Ok(()) => Self {
                valid: true,
                error: None,
            },
            Err(violation) => Self {
                valid: false,
                error: Some(violation.to_string()),
            },
        }
    }
}

/// Daily move budget for one alliance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyMoves {
    pub max: u32,
    pub used: u32,
}

impl DailyMoves {
    pub fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.used)
    }
}

/// Everything a claim check reads besides the candidate tile.
#[derive(Clone, Copy, Debug)]
pub struct ClaimContext<'a> {
    /// Tiles the claiming alliance holds right now.
    pub owned: &'a BTreeSet<TileId>,
    pub labels: &'a TileLabels,
    pub claims: &'a ClaimMap,
    pub adjacency: &'a AdjacencyGraph,
    pub moves_remaining: u32,
    pub is_admin: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ClaimRules {
    config: RulesConfig,
}

impl ClaimRules {
    pub fn new(config: RulesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    /// Check a claim. Rules run in a fixed order and the first failure wins:
    /// admin override, move budget, existing owner, numbered-tile cap,
    /// number progression, adjacency.
    pub fn validate_claim(
        &self,
        ctx: &ClaimContext<'_>,
        tile: TileId,
    ) -> Result<(), RuleViolation> {
        if ctx.is_admin {
            return Ok(());
        }

        if ctx.moves_remaining == 0 {
            return Err(RuleViolation::NoMovesRemaining);
        }

        if let Some(existing) = ctx.claims.get(tile) {
            return Err(RuleViolation::AlreadyClaimed {
                alliance_name: existing.alliance_name.clone(),
            });
        }

        if let Some(number) = ctx.labels.number_of(tile) {
            let exempt = number == self.config.exempt_tile_number;

            if !exempt && self.counted_numbered_tiles(ctx) >= self.config.max_numbered_tiles {
                return Err(RuleViolation::NumberedTileCap {
                    max: self.config.max_numbered_tiles,
                    exempt: self.config.exempt_tile_number,
                });
            }

            let needs_prerequisite = !exempt || self.config.exempt_tile_requires_prerequisite;
            if number > 1 && needs_prerequisite {
                let required = number - 1;
                let has_required = ctx
                    .owned
                    .iter()
                    .any(|owned| ctx.labels.number_of(*owned) == Some(required));
                if !has_required {
                    return Err(RuleViolation::MissingPrerequisite {
                        required,
                        target: number,
                    });
                }
            }
        }

        if !ctx.owned.is_empty() && !ctx.adjacency.is_adjacent_to_any(tile, ctx.owned) {
            return Err(RuleViolation::NotAdjacent);
        }

        Ok(())
    }

    /// Only the holder may clear a tile; admins may clear anything.
    pub fn validate_clear(
        &self,
        claims: &ClaimMap,
        tile: TileId,
        alliance: Option<&AllianceId>,
        is_admin: bool,
    ) -> Result<(), RuleViolation> {
        if is_admin {
            return Ok(());
        }

        let claim = claims.get(tile).ok_or(RuleViolation::NotClaimed)?;
        if Some(&claim.alliance_id) != alliance {
            return Err(RuleViolation::NotOwner);
        }
        Ok(())
    }

    /// Every tile in `tiles` that [`Self::validate_claim`] accepts.
    pub fn claimable_tiles(
        &self,
        ctx: &ClaimContext<'_>,
        tiles: impl IntoIterator<Item = TileId>,
    ) -> BTreeSet<TileId> {
        let claimable: BTreeSet<TileId> = tiles
            .into_iter()
            .filter(|tile| self.validate_claim(ctx, *tile).is_ok())
            .collect();
        debug!(
            owned = ctx.owned.len(),
            claimable = claimable.len(),
            "computed claimable tiles"
        );
        claimable
    }

    fn counted_numbered_tiles(&self, ctx: &ClaimContext<'_>) -> usize {
        ctx.owned
            .iter()
            .filter_map(|tile| ctx.labels.number_of(*tile))
            .filter(|n| *n != self.config.exempt_tile_number)
            .count()
    }
}

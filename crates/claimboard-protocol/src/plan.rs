use serde::{Deserialize, Serialize};

use crate::{AllianceId, SequenceItemId, TileId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveAction {
    Claim,
    Clear,
}

/// Payload of one planning-sequence entry. Order in the sequence is the
/// simulated chronology; `NewDay` splits it into day segments.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanStep {
    Move {
        action: MoveAction,
        tile: TileId,
        alliance: AllianceId,
    },
    NewDay,
}

impl PlanStep {
    pub fn claim(tile: TileId, alliance: AllianceId) -> Self {
        Self::Move {
            action: MoveAction::Claim,
            tile,
            alliance,
        }
    }

    pub fn clear(tile: TileId, alliance: AllianceId) -> Self {
        Self::Move {
            action: MoveAction::Clear,
            tile,
            alliance,
        }
    }

    pub fn tile(&self) -> Option<TileId> {
        match self {
            Self::Move { tile, .. } => Some(*tile),
            Self::NewDay => None,
        }
    }

    pub fn is_claim(&self) -> bool {
        matches!(
            self,
            Self::Move {
                action: MoveAction::Claim,
                ..
            }
        )
    }

    pub fn is_day_marker(&self) -> bool {
        matches!(self, Self::NewDay)
    }
}

/// A step plus the local id used to remove it again.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanItem {
    pub id: SequenceItemId,
    #[serde(flatten)]
    pub step: PlanStep,
}

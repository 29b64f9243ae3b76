use serde::{Deserialize, Serialize};

use crate::{AllianceRoster, ClaimMap, TileLabels};

/// Confirmed game state as handed over by the persistence layer: roster,
/// current claims, and tile labels. The engine reads it and never mutates it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardState {
    #[serde(default)]
    pub alliances: AllianceRoster,
    #[serde(default)]
    pub claims: ClaimMap,
    #[serde(default)]
    pub labels: TileLabels,
}

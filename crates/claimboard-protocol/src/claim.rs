use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{Alliance, AllianceId, TileId};

/// Who holds a tile, denormalised for rendering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimInfo {
    pub alliance_id: AllianceId,
    pub alliance_name: String,
    pub color: String,
    /// Set on claims produced by replaying a plan rather than confirmed play.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub planned: bool,
}

impl ClaimInfo {
    pub fn confirmed(alliance: &Alliance) -> Self {
        Self {
            alliance_id: alliance.id.clone(),
            alliance_name: alliance.name.clone(),
            color: alliance.color.clone(),
            planned: false,
        }
    }

    pub fn planned(alliance: &Alliance) -> Self {
        Self {
            planned: true,
            ..Self::confirmed(alliance)
        }
    }
}

/// Partial function tile -> claim. At most one alliance holds a tile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimMap(BTreeMap<TileId, ClaimInfo>);

impl ClaimMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tile: TileId) -> Option<&ClaimInfo> {
        self.0.get(&tile)
    }

    pub fn contains(&self, tile: TileId) -> bool {
        self.0.contains_key(&tile)
    }

    /// Replaces any previous holder.
    pub fn insert(&mut self, tile: TileId, claim: ClaimInfo) -> Option<ClaimInfo> {
        self.0.insert(tile, claim)
    }

    pub fn remove(&mut self, tile: TileId) -> Option<ClaimInfo> {
        self.0.remove(&tile)
    }

    pub fn owner_of(&self, tile: TileId) -> Option<&AllianceId> {
        self.get(tile).map(|c| &c.alliance_id)
    }

    /// Tiles currently held by `alliance`.
    pub fn owned_by(&self, alliance: &AllianceId) -> BTreeSet<TileId> {
        self.0
            .iter()
            .filter(|(_, claim)| &claim.alliance_id == alliance)
            .map(|(tile, _)| *tile)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TileId, &ClaimInfo)> {
        self.0.iter().map(|(tile, claim)| (*tile, claim))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(TileId, ClaimInfo)> for ClaimMap {
    fn from_iter<I: IntoIterator<Item = (TileId, ClaimInfo)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

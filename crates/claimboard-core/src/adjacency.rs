//! Tile adjacency inferred from raw polygon geometry.
//!
//! Two tiles are neighbours when some edge of one lies on top of some edge of
//! the other: at least two of the four endpoint-to-endpoint distances fall
//! under the proximity threshold. Hand-traced map polygons never line up
//! exactly, so this is a tolerance match rather than an exact shared-edge
//! lookup.

use std::collections::{BTreeMap, BTreeSet};

use claimboard_protocol::geometry::polygon_edges;
use claimboard_protocol::{BoundingBox, Point, TileGeometry, TileId};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjacencyConfig {
    /// Endpoints closer than this (map units) count as coincident.
    pub proximity_threshold: f64,
    /// Bounding boxes further apart than this are never compared edge by edge.
    pub bbox_slack: f64,
}

impl Default for AdjacencyConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: 5.0,
            bbox_slack: 10.0,
        }
    }
}

/// Symmetric tile -> neighbours index. Built once per geometry load.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AdjacencyGraph {
    neighbors: BTreeMap<TileId, BTreeSet<TileId>>,
}

struct PreparedTile<'a> {
    id: TileId,
    bounds: BoundingBox,
    polygon: &'a [Point],
}

impl AdjacencyGraph {
    pub fn build(tiles: &[TileGeometry]) -> Self {
        Self::build_with(tiles, &AdjacencyConfig::default())
    }

    /// Compare every unordered tile pair. Degenerate polygons (fewer than
    /// three vertices) get an entry but never any neighbours.
    pub fn build_with(tiles: &[TileGeometry], config: &AdjacencyConfig) -> Self {
        let mut graph = Self::default();
        for tile in tiles {
            graph.neighbors.entry(tile.id).or_default();
        }

        let prepared: Vec<PreparedTile<'_>> = tiles
            .iter()
            .filter(|t| !t.is_degenerate())
            .filter_map(|t| {
                Some(PreparedTile {
                    id: t.id,
                    bounds: t.bounds()?,
                    polygon: &t.polygon,
                })
            })
            .collect();

        let mut pairs_tested = 0usize;
        for (i, a) in prepared.iter().enumerate() {
            for b in &prepared[i + 1..] {
                if a.id == b.id || !a.bounds.overlaps_within(&b.bounds, config.bbox_slack) {
                    continue;
                }
                pairs_tested += 1;
                if polygons_share_edge(a.polygon, b.polygon, config.proximity_threshold) {
                    graph.link(a.id, b.id);
                }
            }
        }

        debug!(
            tiles = tiles.len(),
            degenerate = tiles.len() - prepared.len(),
            pairs_tested,
            edges = graph.edge_count(),
            "built adjacency graph"
        );
        graph
    }

    /// Build from explicit neighbour pairs (both directions are recorded).
    pub fn from_pairs(pairs: impl IntoIterator<Item = (TileId, TileId)>) -> Self {
        let mut graph = Self::default();
        for (a, b) in pairs {
            if a != b {
                graph.link(a, b);
            }
        }
        graph
    }

    fn link(&mut self, a: TileId, b: TileId) {
        self.neighbors.entry(a).or_default().insert(b);
        self.neighbors.entry(b).or_default().insert(a);
    }

    pub fn neighbors(&self, tile: TileId) -> impl Iterator<Item = TileId> + '_ {
        self.neighbors
            .get(&tile)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    pub fn are_adjacent(&self, a: TileId, b: TileId) -> bool {
        self.neighbors.get(&a).is_some_and(|set| set.contains(&b))
    }

    /// True if `tile` touches any tile in `owned`.
    pub fn is_adjacent_to_any(&self, tile: TileId, owned: &BTreeSet<TileId>) -> bool {
        self.neighbors(tile).any(|n| owned.contains(&n))
    }

    pub fn tile_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Number of undirected neighbour pairs.
    pub fn edge_count(&self) -> usize {
        self.neighbors.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    pub fn is_symmetric(&self) -> bool {
        self.neighbors
            .iter()
            .all(|(a, set)| set.iter().all(|b| self.are_adjacent(*b, *a)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (TileId, &BTreeSet<TileId>)> {
        self.neighbors.iter().map(|(id, set)| (*id, set))
    }
}

/// Two segments coincide when at least two endpoint pairs are within
/// `threshold` of each other.
pub fn segments_adjacent(a: (Point, Point), b: (Point, Point), threshold: f64) -> bool {
    let close = [
        a.0.distance(b.0),
        a.0.distance(b.1),
        a.1.distance(b.0),
        a.1.distance(b.1),
    ]
    .into_iter()
    .filter(|d| *d < threshold)
    .count();
    close >= 2
}

pub fn polygons_share_edge(a: &[Point], b: &[Point], threshold: f64) -> bool {
    polygon_edges(a).any(|ea| polygon_edges(b).any(|eb| segments_adjacent(ea, eb, threshold)))
}

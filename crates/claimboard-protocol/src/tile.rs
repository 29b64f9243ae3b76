use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::TileId;

/// Editable text fields attached to a tile.
///
/// `number` arrives verbatim from a text input, so it may be empty or junk.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLabel {
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub name: String,
}

impl TileLabel {
    pub fn numbered(number: u32) -> Self {
        Self {
            number: number.to_string(),
            name: String::new(),
        }
    }

    /// The tile's progression number, if it has a usable one.
    ///
    /// Reads the leading integer after any whitespace and ignores the rest,
    /// so `"5a"` is 5 and `"2.5"` is 2. Zero, negatives, and text without
    /// leading digits mean "no number".
    pub fn parsed_number(&self) -> Option<u32> {
        parse_tile_number(&self.number)
    }
}

pub fn parse_tile_number(raw: &str) -> Option<u32> {
    let rest = raw.trim_start();
    let (negative, rest) = match rest.as_bytes().first() {
        Some(b'-') => (true, &rest[1..]),
        Some(b'+') => (false, &rest[1..]),
        _ => (false, rest),
    };
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 || negative {
        return None;
    }
    let value: u32 = rest[..digits].parse().ok()?;
    (value > 0).then_some(value)
}

/// Labels for every tile that has any, keyed by tile id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileLabels(BTreeMap<TileId, TileLabel>);

impl TileLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tile: TileId) -> Option<&TileLabel> {
        self.0.get(&tile)
    }

    pub fn insert(&mut self, tile: TileId, label: TileLabel) -> Option<TileLabel> {
        self.0.insert(tile, label)
    }

    pub fn remove(&mut self, tile: TileId) -> Option<TileLabel> {
        self.0.remove(&tile)
    }

    pub fn number_of(&self, tile: TileId) -> Option<u32> {
        self.get(tile).and_then(TileLabel::parsed_number)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TileId, &TileLabel)> {
        self.0.iter().map(|(id, label)| (*id, label))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(TileId, TileLabel)> for TileLabels {
    fn from_iter<I: IntoIterator<Item = (TileId, TileLabel)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_parsing_accepts_positive_integers_only() {
        assert_eq!(parse_tile_number("3"), Some(3));
        assert_eq!(parse_tile_number(" 7 "), Some(7));
        assert_eq!(parse_tile_number("+2"), Some(2));
        assert_eq!(parse_tile_number(""), None);
        assert_eq!(parse_tile_number("0"), None);
        assert_eq!(parse_tile_number("-4"), None);
        assert_eq!(parse_tile_number("-0"), None);
        assert_eq!(parse_tile_number("abc"), None);
        assert_eq!(parse_tile_number("+"), None);
        assert_eq!(parse_tile_number("99999999999"), None);
    }

    #[test]
    fn number_parsing_reads_the_leading_integer() {
        assert_eq!(parse_tile_number("5a"), Some(5));
        assert_eq!(parse_tile_number("3rd"), Some(3));
        assert_eq!(parse_tile_number("2.5"), Some(2));
        assert_eq!(parse_tile_number("\t12 north"), Some(12));
        assert_eq!(parse_tile_number("007"), Some(7));
        assert_eq!(parse_tile_number("a5"), None);
        assert_eq!(parse_tile_number("- 5"), None);
    }

    #[test]
    fn labels_resolve_numbers_by_tile() {
        let labels: TileLabels = [
            (TileId(1), TileLabel::numbered(1)),
            (
                TileId(2),
                TileLabel {
                    number: String::new(),
                    name: "Harbor".to_string(),
                },
            ),
        ]
        .into_iter()
        .collect();

        assert_eq!(labels.number_of(TileId(1)), Some(1));
        assert_eq!(labels.number_of(TileId(2)), None);
        assert_eq!(labels.number_of(TileId(3)), None);
    }
}

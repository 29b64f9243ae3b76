use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::AllianceId;

/// Colours handed to alliances in creation order.
pub const ALLIANCE_COLORS: [&str; 20] = [
    "#E74C3C", "#3498DB", "#2ECC71", "#F39C12", "#9B59B6", "#1ABC9C", "#E91E63", "#00BCD4",
    "#FF5722", "#8BC34A", "#673AB7", "#FFC107", "#795548", "#607D8B", "#CDDC39", "#FF9800",
    "#03A9F4", "#4CAF50", "#F44336", "#00E676",
];

/// Fill used for tiles nobody has claimed.
pub const UNCLAIMED_COLOR: &str = "#f8f9fa";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alliance {
    pub id: AllianceId,
    pub name: String,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("alliance name must not be empty")]
    EmptyName,
    #[error("alliance name already taken: {0}")]
    DuplicateName(String),
    #[error("alliance id already registered: {0}")]
    DuplicateId(AllianceId),
}

/// Every alliance known to the session, in creation order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllianceRoster {
    alliances: Vec<Alliance>,
}

impl AllianceRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap alliances that already carry their colours (e.g. from a backend).
    pub fn from_alliances(alliances: Vec<Alliance>) -> Self {
        Self { alliances }
    }

    /// Create a new alliance. Names are trimmed and unique ignoring case; the
    /// colour is the next palette entry, wrapping once the palette runs out.
    pub fn register(&mut self, id: AllianceId, name: &str) -> Result<&Alliance, RosterError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RosterError::EmptyName);
        }
        if self.find_by_name(name).is_some() {
            return Err(RosterError::DuplicateName(name.to_string()));
        }
        if self.get(&id).is_some() {
            return Err(RosterError::DuplicateId(id));
        }

        let color = ALLIANCE_COLORS[self.alliances.len() % ALLIANCE_COLORS.len()].to_string();
        let index = self.alliances.len();
        self.alliances.push(Alliance {
            id,
            name: name.to_string(),
            color,
        });
        Ok(&self.alliances[index])
    }

    pub fn get(&self, id: &AllianceId) -> Option<&Alliance> {
        self.alliances.iter().find(|a| &a.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Alliance> {
        let needle = name.trim().to_lowercase();
        self.alliances
            .iter()
            .find(|a| a.name.to_lowercase() == needle)
    }

    /// Display colour for an alliance, or the unclaimed fill when unknown.
    pub fn color_of(&self, id: &AllianceId) -> &str {
        self.get(id).map_or(UNCLAIMED_COLOR, |a| a.color.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alliance> {
        self.alliances.iter()
    }

    pub fn len(&self) -> usize {
        self.alliances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alliances.is_empty()
    }
}

/// Pick a readable label colour for text drawn on `background`.
///
/// Uses WCAG relative luminance; light text goes on dark fills.
pub fn contrasting_text_color(background: &str) -> &'static str {
    const ON_UNCLAIMED: &str = "#1e40af";
    const ON_LIGHT: &str = "#1e3a5f";
    const ON_DARK: &str = "#ffffff";

    if background.is_empty() || background.eq_ignore_ascii_case(UNCLAIMED_COLOR) {
        return ON_UNCLAIMED;
    }

    let hex = background.trim_start_matches('#');
    let channel = |offset: usize| {
        hex.get(offset..offset + 2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .map(|v| f64::from(v) / 255.0)
    };
    let (Some(r), Some(g), Some(b)) = (channel(0), channel(2), channel(4)) else {
        return ON_UNCLAIMED;
    };

    let to_linear = |c: f64| {
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    let luminance = 0.2126 * to_linear(r) + 0.7152 * to_linear(g) + 0.0722 * to_linear(b);

    if luminance > 0.4 {
        ON_LIGHT
    } else {
        ON_DARK
    }
}

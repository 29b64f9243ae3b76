//! Claimboard Core - territory-claim rules engine
//!
//! This crate infers tile adjacency from map polygons, validates claim and
//! clear actions, builds and replays what-if plans across simulated days,
//! and drives plan playback against an injectable clock.

pub mod adjacency;
pub mod config;
pub mod planner;
pub mod playback;
pub mod replay;
pub mod rules;
pub mod season;

pub use adjacency::{AdjacencyConfig, AdjacencyGraph};
pub use config::ClaimboardConfig;
pub use planner::{DayBreakdown, Planner, ShareSink};
pub use playback::{Clock, Frame, PlaybackController, PlaybackSpeed, PlaybackState, VirtualClock};
pub use replay::replay;
pub use rules::{ClaimContext, ClaimRules, DailyMoves, RuleViolation, RulesConfig, ValidationReport};
pub use season::{DaySelection, SeasonCalendar};

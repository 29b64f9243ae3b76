//! What-if planning: an ordered log of hypothetical claims, clears and day
//! markers, replayable to any prefix and shareable as a URL parameter.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use claimboard_protocol::wire::{self, WireError};
use claimboard_protocol::{
    AllianceId, AllianceRoster, ClaimMap, MoveAction, PlanItem, PlanStep, SequenceIdGenerator,
    SequenceItemId, TileId,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::replay::replay;

/// Receives the encoded plan after every sequence change, e.g. to keep the
/// browser address bar current. `None` means the plan is empty.
pub trait ShareSink {
    fn publish(&mut self, plan_param: Option<&str>);
}

pub struct Planner {
    items: Vec<PlanItem>,
    ids: SequenceIdGenerator,
    home_alliance: Option<AllianceId>,
    selected_alliance: Option<AllianceId>,
    active: bool,
    sink: Option<Box<dyn ShareSink>>,
}

impl fmt::Debug for Planner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Planner")
            .field("items", &self.items)
            .field("home_alliance", &self.home_alliance)
            .field("selected_alliance", &self.selected_alliance)
            .field("active", &self.active)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl Planner {
    /// `home_alliance` is the signed-in user's alliance, if any.
    pub fn new(home_alliance: Option<AllianceId>) -> Self {
        Self {
            items: Vec::new(),
            ids: SequenceIdGenerator::new(),
            home_alliance,
            selected_alliance: None,
            active: false,
            sink: None,
        }
    }

    /// Restore a plan from a share parameter. A missing parameter is an empty
    /// plan; a malformed one is logged and also yields an empty plan.
    pub fn from_share_param(home_alliance: Option<AllianceId>, plan_param: Option<&str>) -> Self {
        let mut planner = Self::new(home_alliance);
        let Some(encoded) = plan_param.filter(|p| !p.is_empty()) else {
            return planner;
        };

        match wire::decode_plan(encoded) {
            Ok(steps) if !steps.is_empty() => {
                info!(steps = steps.len(), "restored shared plan");
                planner.items = steps
                    .into_iter()
                    .map(|step| PlanItem {
                        id: planner.ids.next_id(),
                        step,
                    })
                    .collect();
                planner.active = true;
            }
            Ok(_) => {}
            Err(error) => warn!(%error, "ignoring malformed shared plan"),
        }
        planner
    }

    pub fn with_share_sink(mut self, sink: impl ShareSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start planning from an empty sequence for the home alliance.
    pub fn enter(&mut self) {
        info!("entering planning mode");
        self.active = true;
        self.reset();
    }

    /// Leave planning mode, discarding the plan.
    pub fn exit(&mut self) {
        info!(discarded = self.items.len(), "leaving planning mode");
        self.active = false;
        self.reset();
    }

    fn reset(&mut self) {
        self.items.clear();
        self.selected_alliance = None;
        self.sync_share();
    }

    /// Plan on behalf of another alliance. Unknown ids (or `None`) fall back
    /// to the home alliance.
    pub fn select_alliance(&mut self, alliance: Option<AllianceId>, roster: &AllianceRoster) {
        self.selected_alliance = alliance.filter(|id| roster.get(id).is_some());
    }

    pub fn planning_alliance(&self) -> Option<&AllianceId> {
        self.selected_alliance
            .as_ref()
            .or(self.home_alliance.as_ref())
    }

    /// Append a claim for the planning alliance. Legality is not checked here;
    /// over-quota claims surface through [`Self::day_breakdown`].
    pub fn plan_claim(&mut self, tile: TileId) -> Option<SequenceItemId> {
        let alliance = self.planning_alliance()?.clone();
        Some(self.push(PlanStep::claim(tile, alliance)))
    }

    /// Append a clear aimed at whoever holds `tile` after the plan so far.
    /// Does nothing if nobody holds it.
    pub fn plan_clear(
        &mut self,
        tile: TileId,
        baseline: &ClaimMap,
        roster: &AllianceRoster,
    ) -> Option<SequenceItemId> {
        let holder = self
            .planned_claims(baseline, roster)
            .owner_of(tile)
            .cloned()?;
        Some(self.push(PlanStep::clear(tile, holder)))
    }

    pub fn add_new_day(&mut self) -> SequenceItemId {
        self.push(PlanStep::NewDay)
    }

    fn push(&mut self, step: PlanStep) -> SequenceItemId {
        let id = self.ids.next_id();
        self.items.push(PlanItem { id, step });
        self.sync_share();
        id
    }

    /// Remove one item, keeping the others in order. False if `id` is unknown.
    pub fn remove(&mut self, id: SequenceItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        let removed = self.items.len() != before;
        if removed {
            self.sync_share();
        }
        removed
    }

    pub fn undo_last(&mut self) -> Option<PlanItem> {
        let popped = self.items.pop();
        if popped.is_some() {
            self.sync_share();
        }
        popped
    }

    pub fn clear_all(&mut self) {
        self.items.clear();
        self.sync_share();
    }

    pub fn items(&self) -> &[PlanItem] {
        &self.items
    }

    pub fn steps(&self) -> impl Iterator<Item = &PlanStep> {
        self.items.iter().map(|item| &item.step)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Baseline claims with the whole plan applied.
    pub fn planned_claims(&self, baseline: &ClaimMap, roster: &AllianceRoster) -> ClaimMap {
        replay(baseline, self.steps(), roster)
    }

    /// Baseline claims with the plan applied up to and including `cursor`.
    /// `None` is the untouched baseline.
    pub fn claims_at(
        &self,
        cursor: Option<usize>,
        baseline: &ClaimMap,
        roster: &AllianceRoster,
    ) -> ClaimMap {
        let upto = cursor.map_or(0, |c| (c + 1).min(self.items.len()));
        replay(baseline, self.items[..upto].iter().map(|i| &i.step), roster)
    }

    /// Tile touched by the step at `cursor`; `None` for day markers and
    /// out-of-range cursors.
    pub fn highlight_at(&self, cursor: Option<usize>) -> Option<TileId> {
        cursor
            .and_then(|c| self.items.get(c))
            .and_then(|item| item.step.tile())
    }

    pub fn is_planned_tile(&self, tile: TileId) -> bool {
        self.steps().any(|step| step.tile() == Some(tile))
    }

    pub fn planned_tiles(&self) -> BTreeSet<TileId> {
        self.steps().filter_map(PlanStep::tile).collect()
    }

    pub fn day_breakdown(&self, start_day: i64, quota: u32) -> DayBreakdown {
        day_breakdown(&self.items, start_day, quota)
    }

    /// Encoded plan for the share parameter; `None` when empty.
    pub fn share_param(&self) -> Result<Option<String>, WireError> {
        let steps: Vec<PlanStep> = self.steps().cloned().collect();
        let encoded = wire::encode_plan(&steps)?;
        Ok(Some(encoded).filter(|e| !e.is_empty()))
    }

    pub fn share_url(&self, base: &str) -> Result<String, WireError> {
        let steps: Vec<PlanStep> = self.steps().cloned().collect();
        wire::share_url(base, &steps)
    }

    fn sync_share(&mut self) {
        if self.sink.is_none() {
            return;
        }
        // An unencodable plan clears the parameter rather than leave a stale one.
        let param = self.share_param().unwrap_or_else(|error| {
            warn!(%error, "plan cannot be shared");
            None
        });
        if let Some(sink) = self.sink.as_mut() {
            sink.publish(param.as_deref());
        }
    }
}

/// One plan item with its simulated day and quota flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnnotatedItem {
    pub id: SequenceItemId,
    /// 1-based position in the sequence.
    pub step_number: usize,
    /// Day the item belongs to; a day marker carries the day it starts.
    pub day: i64,
    pub is_over_limit: bool,
}

/// Claim totals per alliance for one day segment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DaySegment {
    pub day: i64,
    pub claims: BTreeMap<AllianceId, u32>,
}

impl DaySegment {
    pub fn over_quota(&self, quota: u32) -> impl Iterator<Item = &AllianceId> {
        self.claims
            .iter()
            .filter(move |(_, count)| **count > quota)
            .map(|(id, _)| id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DayBreakdown {
    pub quota: u32,
    pub items: Vec<AnnotatedItem>,
    /// Segment 0 is everything before the first day marker.
    pub days: Vec<DaySegment>,
}

impl DayBreakdown {
    pub fn over_limit_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_over_limit).count()
    }
}

/// Split `items` into day segments at each marker and flag every claim past
/// `quota` for its alliance within its segment. Advisory only.
pub fn day_breakdown(items: &[PlanItem], start_day: i64, quota: u32) -> DayBreakdown {
    let mut days = vec![DaySegment {
        day: start_day,
        claims: BTreeMap::new(),
    }];
    let mut annotated = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let mut is_over_limit = false;
        match &item.step {
            PlanStep::NewDay => {
                let next_day = start_day + days.len() as i64;
                days.push(DaySegment {
                    day: next_day,
                    claims: BTreeMap::new(),
                });
            }
            PlanStep::Move {
                action: MoveAction::Claim,
                alliance,
                ..
            } => {
                if let Some(segment) = days.last_mut() {
                    let count = segment.claims.entry(alliance.clone()).or_insert(0);
                    *count += 1;
                    is_over_limit = *count > quota;
                }
            }
            PlanStep::Move {
                action: MoveAction::Clear,
                ..
            } => {}
        }

        annotated.push(AnnotatedItem {
            id: item.id,
            step_number: index + 1,
            day: start_day + days.len() as i64 - 1,
            is_over_limit,
        });
    }

    DayBreakdown {
        quota,
        items: annotated,
        days,
    }
}

use std::cell::RefCell;
use std::rc::Rc;

use claimboard_core::planner::day_breakdown;
use claimboard_core::{Planner, ShareSink};
use claimboard_protocol::wire::{decode_plan, encode_plan};
use claimboard_protocol::{
    Alliance, AllianceId, AllianceRoster, ClaimInfo, ClaimMap, PlanStep, TileId,
};

fn roster() -> AllianceRoster {
    AllianceRoster::from_alliances(vec![
        Alliance {
            id: "home".into(),
            name: "Owls".to_string(),
            color: "#E74C3C".to_string(),
        },
        Alliance {
            id: "rival".into(),
            name: "Stags".to_string(),
            color: "#3498DB".to_string(),
        },
    ])
}

fn planner() -> Planner {
    let mut planner = Planner::new(Some("home".into()));
    planner.enter();
    planner
}

#[derive(Clone, Default)]
struct RecordingSink(Rc<RefCell<Vec<Option<String>>>>);

impl ShareSink for RecordingSink {
    fn publish(&mut self, plan_param: Option<&str>) {
        self.0.borrow_mut().push(plan_param.map(str::to_string));
    }
}

#[test]
fn claims_use_the_planning_alliance() {
    let roster = roster();
    let mut planner = planner();
    planner.plan_claim(TileId(1));
    planner.select_alliance(Some("rival".into()), &roster);
    planner.plan_claim(TileId(2));
    planner.select_alliance(Some("nobody".into()), &roster);
    planner.plan_claim(TileId(3));

    let claims = planner.planned_claims(&ClaimMap::new(), &roster);
    assert_eq!(claims.owner_of(TileId(1)), Some(&"home".into()));
    assert_eq!(claims.owner_of(TileId(2)), Some(&"rival".into()));
    assert_eq!(claims.owner_of(TileId(3)), Some(&"home".into()));
}

#[test]
fn claim_without_any_alliance_is_ignored() {
    let mut planner = Planner::new(None);
    planner.enter();
    assert_eq!(planner.plan_claim(TileId(1)), None);
    assert!(planner.is_empty());
}

#[test]
fn clear_targets_the_planned_owner() {
    let roster = roster();
    let rival = roster.get(&"rival".into()).expect("rival");
    let baseline: ClaimMap = [(TileId(4), ClaimInfo::confirmed(rival))].into_iter().collect();

    let mut planner = planner();
    assert!(planner.plan_clear(TileId(9), &baseline, &roster).is_none());
    assert!(planner.is_empty());

    planner.plan_clear(TileId(4), &baseline, &roster);
    planner.plan_claim(TileId(4));
    planner.plan_clear(TileId(4), &baseline, &roster);

    let steps: Vec<&PlanStep> = planner.steps().collect();
    assert_eq!(steps[0], &PlanStep::clear(TileId(4), "rival".into()));
    assert_eq!(steps[2], &PlanStep::clear(TileId(4), "home".into()));
    assert!(!planner.planned_claims(&baseline, &roster).contains(TileId(4)));
    assert!(baseline.contains(TileId(4)));
}

#[test]
fn remove_keeps_relative_order() {
    let mut planner = planner();
    let a = planner.plan_claim(TileId(1)).expect("claim");
    let day = planner.add_new_day();
    let b = planner.plan_claim(TileId(2)).expect("claim");

    assert!(planner.remove(day));
    assert!(!planner.remove(day));
    let ids: Vec<_> = planner.items().iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![a, b]);

    let undone = planner.undo_last().expect("item");
    assert_eq!(undone.id, b);
    planner.clear_all();
    assert!(planner.undo_last().is_none());
}

#[test]
fn exit_discards_the_plan_and_override() {
    let roster = roster();
    let mut planner = planner();
    planner.select_alliance(Some("rival".into()), &roster);
    planner.plan_claim(TileId(1));
    planner.exit();

    assert!(!planner.is_active());
    assert!(planner.is_empty());
    assert_eq!(planner.planning_alliance(), Some(&AllianceId::from("home")));
}

#[test]
fn cursor_prefix_replay() {
    let roster = roster();
    let mut planner = planner();
    planner.plan_claim(TileId(1));
    planner.add_new_day();
    planner.plan_claim(TileId(2));
    let baseline = ClaimMap::new();

    assert!(planner.claims_at(None, &baseline, &roster).is_empty());
    assert_eq!(planner.claims_at(Some(0), &baseline, &roster).len(), 1);
    assert_eq!(planner.claims_at(Some(1), &baseline, &roster).len(), 1);
    assert_eq!(planner.claims_at(Some(2), &baseline, &roster).len(), 2);
    assert_eq!(planner.claims_at(Some(50), &baseline, &roster).len(), 2);

    assert_eq!(planner.highlight_at(Some(0)), Some(TileId(1)));
    assert_eq!(planner.highlight_at(Some(1)), None);
    assert_eq!(planner.highlight_at(Some(9)), None);
    assert_eq!(planner.highlight_at(None), None);
}

#[test]
fn planned_tiles_cover_claims_and_clears() {
    let roster = roster();
    let mut planner = planner();
    planner.plan_claim(TileId(3));
    planner.plan_clear(TileId(3), &ClaimMap::new(), &roster);
    planner.add_new_day();
    planner.plan_claim(TileId(8));

    assert!(planner.is_planned_tile(TileId(8)));
    assert!(!planner.is_planned_tile(TileId(5)));
    assert_eq!(planner.planned_tiles().len(), 2);
}

#[test]
fn fourth_claim_in_a_day_is_over_limit() {
    let roster = roster();
    let mut planner = planner();
    for tile in 1..=4 {
        planner.plan_claim(TileId(tile));
    }
    planner.select_alliance(Some("rival".into()), &roster);
    planner.plan_claim(TileId(10));
    planner.add_new_day();
    planner.select_alliance(None, &roster);
    planner.plan_claim(TileId(5));

    let breakdown = planner.day_breakdown(12, 3);
    let flags: Vec<bool> = breakdown.items.iter().map(|i| i.is_over_limit).collect();
    assert_eq!(flags, vec![false, false, false, true, false, false, false]);
    assert_eq!(breakdown.over_limit_count(), 1);

    let days: Vec<i64> = breakdown.items.iter().map(|i| i.day).collect();
    assert_eq!(days, vec![12, 12, 12, 12, 12, 13, 13]);
    let steps: Vec<usize> = breakdown.items.iter().map(|i| i.step_number).collect();
    assert_eq!(steps, (1..=7).collect::<Vec<_>>());

    assert_eq!(breakdown.days.len(), 2);
    assert_eq!(breakdown.days[0].claims.get(&"home".into()), Some(&4));
    assert_eq!(breakdown.days[0].claims.get(&"rival".into()), Some(&1));
    let over: Vec<_> = breakdown.days[0].over_quota(3).collect();
    assert_eq!(over, vec![&AllianceId::from("home")]);
    assert_eq!(breakdown.days[1].day, 13);
}

#[test]
fn clears_do_not_use_quota() {
    let steps: Vec<_> = [
        PlanStep::clear(TileId(1), "a".into()),
        PlanStep::clear(TileId(2), "a".into()),
        PlanStep::clear(TileId(3), "a".into()),
        PlanStep::clear(TileId(4), "a".into()),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, step)| claimboard_protocol::PlanItem {
        id: claimboard_protocol::SequenceItemId(i as u64),
        step,
    })
    .collect();
    assert_eq!(day_breakdown(&steps, 1, 3).over_limit_count(), 0);
}

#[test]
fn share_param_restores_the_same_steps() {
    let roster = roster();
    let mut planner = planner();
    planner.plan_claim(TileId(1));
    planner.add_new_day();
    planner.select_alliance(Some("rival".into()), &roster);
    planner.plan_claim(TileId(2));

    let param = planner.share_param().expect("encode").expect("non-empty");
    let restored = Planner::from_share_param(Some("home".into()), Some(&param));
    assert!(restored.is_active());
    assert!(restored.steps().eq(planner.steps()));
}

#[test]
fn malformed_or_missing_share_param_is_an_empty_plan() {
    for param in [None, Some(""), Some("%%%not-base64"), Some("eA")] {
        let planner = Planner::from_share_param(None, param);
        assert!(planner.is_empty(), "{param:?}");
        assert!(!planner.is_active());
    }
}

#[test]
fn every_mutation_publishes_the_share_param() {
    let sink = RecordingSink::default();
    let log = sink.0.clone();
    let mut planner = Planner::new(Some("home".into())).with_share_sink(sink);

    planner.enter();
    let id = planner.plan_claim(TileId(6)).expect("claim");
    planner.add_new_day();
    planner.remove(id);
    planner.undo_last();

    let published = log.borrow();
    assert_eq!(published.len(), 5);
    assert_eq!(published[0], None);
    let after_claim = published[1].as_deref().expect("param");
    assert_eq!(
        decode_plan(after_claim).expect("decode"),
        vec![PlanStep::claim(TileId(6), "home".into())]
    );
    assert_eq!(
        published[3].as_deref(),
        Some(encode_plan(&[PlanStep::NewDay]).expect("encode").as_str())
    );
    assert_eq!(published[4], None);
}

#[test]
fn alliance_ids_with_delimiters_stay_in_the_share_param() {
    let roster = AllianceRoster::from_alliances(vec![
        Alliance {
            id: "a".into(),
            name: "Owls".to_string(),
            color: "#E74C3C".to_string(),
        },
        Alliance {
            id: "team:x".into(),
            name: "Stags".to_string(),
            color: "#3498DB".to_string(),
        },
    ]);
    let sink = RecordingSink::default();
    let log = sink.0.clone();
    let mut planner = Planner::new(Some("a".into())).with_share_sink(sink);
    planner.enter();
    planner.plan_claim(TileId(1));
    planner.select_alliance(Some("team:x".into()), &roster);
    planner.plan_claim(TileId(2));
    planner.plan_claim(TileId(3));

    let published = log.borrow();
    assert_eq!(published.len(), 4);
    let latest = published[3].as_deref().expect("param");
    let decoded = decode_plan(latest).expect("decode");
    assert_eq!(decoded.len(), 3);
    assert!(decoded.iter().eq(planner.steps()));
    assert_eq!(decoded[2], PlanStep::claim(TileId(3), "team:x".into()));
}

#[test]
fn unshareable_plan_publishes_no_param() {
    let roster = AllianceRoster::from_alliances(vec![Alliance {
        id: "".into(),
        name: "Nameless".to_string(),
        color: "#E74C3C".to_string(),
    }]);
    let sink = RecordingSink::default();
    let log = sink.0.clone();
    let mut planner = Planner::new(Some("home".into())).with_share_sink(sink);
    planner.enter();
    planner.plan_claim(TileId(1));
    assert!(log.borrow().last().is_some_and(Option::is_some));

    planner.select_alliance(Some("".into()), &roster);
    planner.plan_claim(TileId(2));
    assert!(planner.share_param().is_err());
    assert_eq!(log.borrow().last(), Some(&None));
}

use claimboard_protocol::wire::{decode_plan, encode_plan, plan_param, share_url};
use claimboard_protocol::{AllianceId, MoveAction, PlanStep, TileId};
use proptest::prelude::*;

fn step_strategy() -> impl Strategy<Value = PlanStep> {
    prop_oneof![
        Just(PlanStep::NewDay),
        (any::<bool>(), 0u32..5_000, "[A-Za-z0-9_:,%-]{1,12}").prop_map(|(claim, tile, id)| {
            PlanStep::Move {
                action: if claim {
                    MoveAction::Claim
                } else {
                    MoveAction::Clear
                },
                tile: TileId(tile),
                alliance: AllianceId::new(id),
            }
        }),
    ]
}

proptest! {
    #[test]
    fn plan_survives_share_string(steps in prop::collection::vec(step_strategy(), 0..40)) {
        let encoded = encode_plan(&steps).expect("encode");
        prop_assert!(encoded
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        let decoded = decode_plan(&encoded).expect("decode");
        prop_assert_eq!(decoded, steps);
    }

    #[test]
    fn plan_survives_share_url(steps in prop::collection::vec(step_strategy(), 1..20)) {
        let url = share_url("https://claims.example/map?season=4", &steps).expect("url");
        let param = plan_param(&url).expect("plan param present");
        prop_assert_eq!(decode_plan(&param).expect("decode"), steps);
    }
}

#[test]
fn uuid_style_alliance_ids_roundtrip() {
    let steps = vec![
        PlanStep::claim(TileId(7), "3f2b9c1e-8d44-4c1a-9a51-0c6a8e7d2f10".into()),
        PlanStep::NewDay,
        PlanStep::NewDay,
        PlanStep::clear(TileId(7), "3f2b9c1e-8d44-4c1a-9a51-0c6a8e7d2f10".into()),
    ];
    let encoded = encode_plan(&steps).expect("encode");
    assert_eq!(decode_plan(&encoded).expect("decode"), steps);
}

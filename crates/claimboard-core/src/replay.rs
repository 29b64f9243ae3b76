use claimboard_protocol::{AllianceRoster, ClaimInfo, ClaimMap, MoveAction, PlanStep};
use tracing::warn;

/// Apply `steps` in order on top of a copy of `baseline`.
///
/// Claims overwrite whoever holds the tile, clears drop it no matter who
/// holds it, and day markers do nothing. A claim by an alliance missing from
/// `roster` is skipped; the remaining steps still apply.
pub fn replay<'a>(
    baseline: &ClaimMap,
    steps: impl IntoIterator<Item = &'a PlanStep>,
    roster: &AllianceRoster,
) -> ClaimMap {
    let mut claims = baseline.clone();
    for step in steps {
        apply_step(&mut claims, step, roster);
    }
    claims
}

pub(crate) fn apply_step(claims: &mut ClaimMap, step: &PlanStep, roster: &AllianceRoster) {
    match step {
        PlanStep::NewDay => {}
        PlanStep::Move {
            action: MoveAction::Claim,
            tile,
            alliance,
        } => match roster.get(alliance) {
            Some(found) => {
                claims.insert(*tile, ClaimInfo::planned(found));
            }
            None => warn!(%tile, %alliance, "skipping planned claim by unknown alliance"),
        },
        PlanStep::Move {
            action: MoveAction::Clear,
            tile,
            ..
        } => {
            claims.remove(*tile);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    use claimboard_protocol::{Alliance, TileId};

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("log buffer").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn roster() -> AllianceRoster {
        AllianceRoster::from_alliances(vec![
            Alliance {
                id: "a".into(),
                name: "Wolves".to_string(),
                color: "#E74C3C".to_string(),
            },
            Alliance {
                id: "b".into(),
                name: "Bears".to_string(),
                color: "#3498DB".to_string(),
            },
        ])
    }

    #[test]
    fn later_steps_win_for_the_same_tile() {
        let steps = [
            PlanStep::claim(TileId(1), "a".into()),
            PlanStep::claim(TileId(1), "b".into()),
        ];
        let claims = replay(&ClaimMap::new(), &steps, &roster());
        assert_eq!(claims.owner_of(TileId(1)), Some(&"b".into()));
        assert!(claims.get(TileId(1)).is_some_and(|c| c.planned));
    }

    #[test]
    fn clear_removes_whoever_holds_the_tile() {
        // The clear names "a" but "b" holds the tile by then; it still empties it.
        let steps = [
            PlanStep::claim(TileId(1), "a".into()),
            PlanStep::claim(TileId(1), "b".into()),
            PlanStep::clear(TileId(1), "a".into()),
        ];
        let claims = replay(&ClaimMap::new(), &steps, &roster());
        assert!(!claims.contains(TileId(1)));
    }

    #[test]
    fn unknown_alliance_is_skipped_without_stopping_replay() {
        let steps = [
            PlanStep::claim(TileId(1), "ghost".into()),
            PlanStep::NewDay,
            PlanStep::claim(TileId(2), "a".into()),
        ];
        let claims = replay(&ClaimMap::new(), &steps, &roster());
        assert!(!claims.contains(TileId(1)));
        assert_eq!(claims.owner_of(TileId(2)), Some(&"a".into()));
    }

    #[test]
    fn skipped_claims_are_logged_as_warnings() {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();

        let steps = [PlanStep::claim(TileId(9), "ghost".into())];
        tracing::subscriber::with_default(subscriber, || {
            replay(&ClaimMap::new(), &steps, &roster());
        });

        let bytes = buffer.0.lock().expect("log buffer").clone();
        let output = String::from_utf8(bytes).expect("utf-8 log");
        assert!(output.contains("WARN"), "{output}");
        assert!(output.contains("unknown alliance"), "{output}");
    }

    #[test]
    fn baseline_is_left_untouched() {
        let roster = roster();
        let wolves = roster.get(&"a".into()).expect("wolves");
        let mut baseline = ClaimMap::new();
        baseline.insert(TileId(5), ClaimInfo::confirmed(wolves));
        let steps = [PlanStep::clear(TileId(5), "a".into())];
        let claims = replay(&baseline, &steps, &roster);
        assert!(baseline.contains(TileId(5)));
        assert!(!claims.contains(TileId(5)));
    }
}

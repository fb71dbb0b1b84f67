//! Property tests for settlement guarantees over random event sequences.

use proptest::prelude::*;
use raycast_core::{
    ManualClock, NativeVector, PlayerId, QueuedHost, RayCallbacks, RayCastConfig, RayCastRegistry,
    RayId, Settlement,
};
use std::cell::Cell;
use std::rc::Rc;

type Registry = RayCastRegistry<QueuedHost, ManualClock>;

#[derive(Debug, Clone)]
enum Op {
    Cast { player: i64, length: f64 },
    Hit { player: i64, distance: f64 },
    Miss { player: i64 },
    Advance { ms: u64 },
    Prune,
    Leave { player: i64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0i64..3, 1.0f64..100.0).prop_map(|(player, length)| Op::Cast { player, length }),
        2 => (0i64..3, 0.0f64..120.0).prop_map(|(player, distance)| Op::Hit { player, distance }),
        3 => (0i64..3).prop_map(|player| Op::Miss { player }),
        2 => (0u64..3_000).prop_map(|ms| Op::Advance { ms }),
        1 => Just(Op::Prune),
        1 => (0i64..3).prop_map(|player| Op::Leave { player }),
    ]
}

#[derive(Default)]
struct Outcome {
    hits: Cell<u32>,
    misses: Cell<u32>,
}

fn registry() -> Registry {
    RayCastRegistry::with_clock(QueuedHost::new(), ManualClock::new(), RayCastConfig::default())
}

fn cast_tracked(reg: &mut Registry, player: i64, length: f64) -> Rc<Outcome> {
    let outcome = Rc::new(Outcome::default());
    let (on_hit, on_miss) = (outcome.clone(), outcome.clone());
    reg.cast(
        PlayerId(player),
        NativeVector::zeros(),
        NativeVector::new(length, 0.0, 0.0),
        RayCallbacks::both(
            move |_, _| on_hit.hits.set(on_hit.hits.get() + 1),
            move || on_miss.misses.set(on_miss.misses.get() + 1),
        ),
    )
    .unwrap();
    outcome
}

fn assert_miss_invariant(reg: &Registry) {
    for player in 0..3 {
        let p = PlayerId(player);
        let (pending, active) = (reg.pending_misses(p), reg.active_count(p));
        assert!(
            pending < active || (pending == 0 && active == 0),
            "{p}: {pending} unattributed misses vs {active} active casts"
        );
    }
}

proptest! {
    /// Every cast settles at most once, through exactly one callback, and
    /// after a TTL-sized quiet period every cast has settled.
    #[test]
    fn prop_at_most_once_then_eventually_settled(ops in prop::collection::vec(op_strategy(), 0..80)) {
        let mut reg = registry();
        let mut outcomes: Vec<Rc<Outcome>> = Vec::new();

        for op in ops {
            match op {
                Op::Cast { player, length } => outcomes.push(cast_tracked(&mut reg, player, length)),
                Op::Hit { player, distance } => {
                    reg.handle_hit(PlayerId(player), NativeVector::new(distance, 0.0, 0.0), NativeVector::y());
                }
                Op::Miss { player } => {
                    reg.handle_miss(PlayerId(player));
                }
                Op::Advance { ms } => reg.clock().advance_ms(ms),
                Op::Prune => {
                    reg.prune_all_states();
                }
                Op::Leave { player } => {
                    reg.remove_player(PlayerId(player));
                }
            }
            assert_miss_invariant(&reg);
            for o in &outcomes {
                prop_assert!(o.hits.get() + o.misses.get() <= 1);
            }
        }

        reg.clock().advance_ms(reg.config().ttl_ms + 1);
        reg.prune_all_states();

        prop_assert_eq!(reg.total_active(), 0);
        for o in &outcomes {
            prop_assert_eq!(o.hits.get() + o.misses.get(), 1);
        }
        let stats = reg.stats();
        prop_assert_eq!(stats.settled(), outcomes.len() as u64);
        prop_assert_eq!(stats.issued, outcomes.len() as u64);
    }

    /// k outstanding casts and k misses with no intervening hit settle all k.
    #[test]
    fn prop_k_misses_settle_k_casts(k in 1usize..12, lengths in prop::collection::vec(1.0f64..50.0, 12)) {
        let mut reg = registry();
        let outcomes: Vec<_> = lengths.iter().take(k).map(|&l| cast_tracked(&mut reg, 0, l)).collect();

        for i in 0..k {
            let report = reg.handle_miss(PlayerId(0));
            if i + 1 < k {
                prop_assert!(report.is_empty());
            } else {
                prop_assert_eq!(report.ids(Settlement::Miss).len(), k);
            }
        }
        for o in &outcomes {
            prop_assert_eq!(o.misses.get(), 1);
            prop_assert_eq!(o.hits.get(), 0);
        }
    }

    /// With two distinct lengths, the one closer to the hit distance settles.
    #[test]
    fn prop_hit_prefers_closer_length(a in 1.0f64..100.0, b in 1.0f64..100.0, d in 0.0f64..120.0) {
        prop_assume!(((a - d).abs() - (b - d).abs()).abs() > 1e-9);

        let mut reg = registry();
        let first = cast_tracked(&mut reg, 0, a);
        let second = cast_tracked(&mut reg, 0, b);

        reg.handle_hit(PlayerId(0), NativeVector::new(d, 0.0, 0.0), NativeVector::y());

        let first_closer = (a - d).abs() < (b - d).abs();
        prop_assert_eq!(first.hits.get() == 1, first_closer);
        prop_assert_eq!(second.hits.get() == 1, !first_closer);
    }

    /// Pruning before anything has expired never fires a callback.
    #[test]
    fn prop_prune_idempotent_before_ttl(n in 1usize..10, elapsed in 0u64..=5_000) {
        let mut reg = registry();
        let outcomes: Vec<_> = (0..n).map(|i| cast_tracked(&mut reg, (i % 3) as i64, 10.0)).collect();
        reg.clock().advance_ms(elapsed);

        prop_assert!(reg.prune_all_states().is_empty());
        prop_assert!(reg.prune_all_states().is_empty());
        for o in &outcomes {
            prop_assert_eq!(o.hits.get() + o.misses.get(), 0);
        }
    }
}

#[test]
fn equal_closeness_settles_lower_id() {
    let mut reg = registry();
    let older = cast_tracked(&mut reg, 0, 30.0);
    let newer = cast_tracked(&mut reg, 0, 30.0);

    let report = reg.handle_hit(PlayerId(0), NativeVector::new(29.0, 0.0, 0.0), NativeVector::y());

    assert_eq!(report.ids(Settlement::Hit), vec![RayId(1)]);
    assert_eq!(older.hits.get(), 1);
    assert_eq!(newer.hits.get(), 0);
}

#[test]
fn orphan_events_fire_nothing() {
    let mut reg = registry();
    assert!(reg.handle_hit(PlayerId(0), NativeVector::zeros(), NativeVector::y()).is_empty());
    assert!(reg.handle_miss(PlayerId(0)).is_empty());
    assert_eq!(reg.stats().settled(), 0);
}

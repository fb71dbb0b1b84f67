//! Correlation Resolver
//!
//! The host reports `OnRayCastHit(player, point, normal)` and
//! `OnRayCastMissed(player)` with no request id. Hits are matched by
//! distance; misses are counted and only attributed once the count proves
//! every live cast of that player missed.
//!
//! Same-player races between a hit and an already counted miss cannot be told
//! apart from the payloads. The policy below is deterministic, not a
//! guarantee of picking the ray the host actually meant.

use crate::clock::Clock;
use crate::host::RayCastHost;
use crate::registry::{
    PendingCast, PlayerId, PlayerState, RayCastRegistry, RayId, Settlement, SettlementReport,
};
use crate::vector::{self, NativeVector};
use std::collections::BTreeMap;

/// Pick the cast whose expected length is closest to the observed hit
/// distance from its own start. Iteration is in id order and only a strictly
/// smaller error replaces the incumbent, so ties go to the oldest cast.
pub(crate) fn best_match(
    rays: &BTreeMap<RayId, PendingCast>,
    point: &NativeVector,
) -> Option<RayId> {
    let mut best: Option<(RayId, f64)> = None;
    for (id, cast) in rays {
        let error = (cast.expected_length - vector::distance(&cast.start, point)).abs();
        let better = match best {
            None => true,
            Some((_, best_error)) => error < best_error,
        };
        if better {
            best = Some((*id, error));
        }
    }
    best.map(|(id, _)| id)
}

fn live_state(
    players: &mut BTreeMap<PlayerId, PlayerState>,
    player: PlayerId,
) -> Option<&mut PlayerState> {
    players.get_mut(&player).filter(|s| !s.rays.is_empty())
}

impl<H: RayCastHost, C: Clock> RayCastRegistry<H, C> {
    /// Host hook for `OnRayCastHit`.
    pub fn handle_hit(
        &mut self,
        player: PlayerId,
        point: NativeVector,
        normal: NativeVector,
    ) -> SettlementReport {
        let now = self.clock.now();
        let Some(state) = live_state(&mut self.players, player) else {
            self.stats.orphaned_hits += 1;
            log::debug!("orphaned hit for {} at {:?}: no active casts", player, point);
            return SettlementReport::default();
        };
        state.last_activity = now;

        let Some(hit) = best_match(&state.rays, &point).and_then(|id| state.rays.remove(&id))
        else {
            return SettlementReport::default();
        };
        // Fewer live casts may now be fully explained by the miss counter.
        let missed = state.take_resolvable_misses();

        let mut report = SettlementReport::default();
        report.push(player, hit.id, Settlement::Hit);
        self.stats.hits += 1;
        log::trace!("{} settled {} as hit", player, hit.id);
        hit.callbacks.fire_hit(point, normal);

        report.extend(self.fire_misses(player, missed));
        report
    }

    /// Host hook for `OnRayCastMissed`.
    pub fn handle_miss(&mut self, player: PlayerId) -> SettlementReport {
        let now = self.clock.now();
        let Some(state) = live_state(&mut self.players, player) else {
            self.stats.orphaned_misses += 1;
            log::debug!("orphaned miss for {}: no active casts", player);
            return SettlementReport::default();
        };
        state.last_activity = now;
        state.pending_misses += 1;

        let missed = state.take_resolvable_misses();
        if missed.is_empty() {
            log::trace!(
                "{} miss deferred ({} unattributed, {} active)",
                player,
                state.pending_misses,
                state.rays.len()
            );
        }
        self.fire_misses(player, missed)
    }

    pub(crate) fn fire_misses(
        &mut self,
        player: PlayerId,
        missed: Vec<PendingCast>,
    ) -> SettlementReport {
        let mut report = SettlementReport::default();
        for cast in missed {
            report.push(player, cast.id, Settlement::Miss);
            self.stats.misses += 1;
            log::trace!("{} settled {} as miss", player, cast.id);
            cast.callbacks.fire_miss();
        }
        report
    }
}

//! Pruning Sweeper
//!
//! Safety net for casts whose terminal host event never arrives. Anything
//! older than the TTL is settled as `Pruned` (firing `on_miss`, never
//! `on_hit`), and player states that stay empty past the grace period are
//! dropped.

use crate::clock::Clock;
use crate::host::RayCastHost;
use crate::registry::{PendingCast, PlayerId, RayCastRegistry, RayId, Settlement, SettlementReport};

impl<H: RayCastHost, C: Clock> RayCastRegistry<H, C> {
    /// Registry-wide sweep. Also the recommended call when a player
    /// disconnects, though [`remove_player`](Self::remove_player) is quicker.
    pub fn prune_all_states(&mut self) -> SettlementReport {
        let now = self.clock.now();
        self.last_sweep = now;

        let ttl = self.config.ttl();
        let grace = self.config.player_grace();

        let mut expired: Vec<(PlayerId, PendingCast)> = Vec::new();
        let mut resolved: Vec<(PlayerId, Vec<PendingCast>)> = Vec::new();
        let mut idle: Vec<PlayerId> = Vec::new();

        for (player, state) in self.players.iter_mut() {
            let stale: Vec<RayId> = state
                .rays
                .values()
                .filter(|cast| cast.age(now) > ttl)
                .map(|cast| cast.id)
                .collect();

            if !stale.is_empty() {
                for id in &stale {
                    if let Some(cast) = state.rays.remove(id) {
                        expired.push((*player, cast));
                    }
                }
                // Each pruned cast may be what an unattributed miss was about.
                state.pending_misses = state.pending_misses.saturating_sub(stale.len());
                state.last_activity = now;

                let missed = state.take_resolvable_misses();
                if !missed.is_empty() {
                    resolved.push((*player, missed));
                }
            }

            if state.rays.is_empty()
                && state.pending_misses == 0
                && now.saturating_sub(state.last_activity) >= grace
            {
                idle.push(*player);
            }
        }

        for player in idle {
            self.players.remove(&player);
            self.stats.dropped_players += 1;
            log::debug!("dropped idle state for {}", player);
        }

        if !expired.is_empty() {
            log::info!(
                "pruned {} ray cast(s) older than {:?} ({} still active)",
                expired.len(),
                ttl,
                self.total_active()
            );
        }

        let mut report = SettlementReport::default();
        for (player, cast) in expired {
            report.push(player, cast.id, Settlement::Pruned);
            self.stats.pruned += 1;
            cast.callbacks.fire_miss();
        }
        for (player, missed) in resolved {
            report.extend(self.fire_misses(player, missed));
        }
        report
    }

    /// Periodic entry point for the embedding's frame/tick loop. Sweeps once
    /// the configured interval has elapsed since the previous sweep.
    pub fn poll(&mut self) -> Option<SettlementReport> {
        let now = self.clock.now();
        if now.saturating_sub(self.last_sweep) < self.config.sweep_interval() {
            return None;
        }
        Some(self.prune_all_states())
    }

    /// Explicit "player left" signal: settle everything the player still has
    /// in flight as pruned and forget the player.
    pub fn remove_player(&mut self, player: PlayerId) -> SettlementReport {
        let mut report = SettlementReport::default();
        let Some(state) = self.players.remove(&player) else {
            return report;
        };
        self.stats.dropped_players += 1;
        log::debug!("{} left with {} active cast(s)", player, state.rays.len());

        for cast in state.rays.into_values() {
            report.push(player, cast.id, Settlement::Pruned);
            self.stats.pruned += 1;
            cast.callbacks.fire_miss();
        }
        report
    }
}

//! Request Registry
//!
//! Owns every pending cast, grouped per player. The resolver (`handle_hit`,
//! `handle_miss`) and the sweeper (`prune_all_states`, `poll`,
//! `remove_player`) are further `impl` blocks on [`RayCastRegistry`] in their
//! own modules; this one holds the data model and `cast`.

use crate::callbacks::{ErasedCallbacks, HitFn, MissFn, RayCallbacks};
use crate::clock::{Clock, MonotonicClock};
use crate::config::RayCastConfig;
use crate::error::Result;
use crate::host::RayCastHost;
use crate::vector::{self, NativeVector, PointKind, RayPoint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub i64);

/// Process-unique, monotonically increasing cast identifier. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RayId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

impl fmt::Display for RayId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ray#{}", self.0)
    }
}

/// One outstanding ray request. Immutable once created.
pub struct PendingCast {
    pub(crate) id: RayId,
    pub(crate) start: NativeVector,
    pub(crate) end: NativeVector,
    pub(crate) expected_length: f64,
    pub(crate) created_at: Duration,
    pub(crate) native_input: bool,
    pub(crate) callbacks: ErasedCallbacks,
}

impl PendingCast {
    pub fn id(&self) -> RayId {
        self.id
    }

    pub fn start(&self) -> NativeVector {
        self.start
    }

    pub fn end(&self) -> NativeVector {
        self.end
    }

    pub fn expected_length(&self) -> f64 {
        self.expected_length
    }

    pub fn created_at(&self) -> Duration {
        self.created_at
    }

    pub fn native_input(&self) -> bool {
        self.native_input
    }

    pub(crate) fn age(&self, now: Duration) -> Duration {
        now.saturating_sub(self.created_at)
    }
}

impl fmt::Debug for PendingCast {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PendingCast")
            .field("id", &self.id)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("expected_length", &self.expected_length)
            .field("created_at", &self.created_at)
            .field("native_input", &self.native_input)
            .finish_non_exhaustive()
    }
}

/// Per-player bookkeeping.
#[derive(Debug)]
pub(crate) struct PlayerState {
    /// Keyed by monotonic id, so iteration order is creation (FIFO) order.
    pub(crate) rays: BTreeMap<RayId, PendingCast>,
    /// Miss notifications not yet attributed to a specific cast.
    pub(crate) pending_misses: usize,
    pub(crate) last_activity: Duration,
}

impl PlayerState {
    pub(crate) fn new(now: Duration) -> Self {
        Self { rays: BTreeMap::new(), pending_misses: 0, last_activity: now }
    }

    /// Counting rule: once there are at least as many unattributed misses as
    /// live casts, every live cast must have missed. Pops all of them (FIFO)
    /// and charges them against the miss counter.
    pub(crate) fn take_resolvable_misses(&mut self) -> Vec<PendingCast> {
        if self.pending_misses == 0 || self.pending_misses < self.rays.len() {
            return Vec::new();
        }
        let resolved: Vec<PendingCast> = std::mem::take(&mut self.rays).into_values().collect();
        self.pending_misses = self.pending_misses.saturating_sub(resolved.len());
        resolved
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Settlement {
    Hit,
    Miss,
    Pruned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettledCast {
    pub player: PlayerId,
    pub id: RayId,
    pub settlement: Settlement,
}

/// What a single handler invocation settled, in callback order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReport {
    pub settled: Vec<SettledCast>,
}

impl SettlementReport {
    pub(crate) fn push(&mut self, player: PlayerId, id: RayId, settlement: Settlement) {
        self.settled.push(SettledCast { player, id, settlement });
    }

    pub fn is_empty(&self) -> bool {
        self.settled.is_empty()
    }

    pub fn len(&self) -> usize {
        self.settled.len()
    }

    pub fn ids(&self, settlement: Settlement) -> Vec<RayId> {
        self.settled.iter().filter(|s| s.settlement == settlement).map(|s| s.id).collect()
    }

    pub fn extend(&mut self, other: SettlementReport) {
        self.settled.extend(other.settled);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub issued: u64,
    pub hits: u64,
    pub misses: u64,
    pub pruned: u64,
    pub orphaned_hits: u64,
    pub orphaned_misses: u64,
    pub dropped_players: u64,
}

impl RegistryStats {
    pub fn settled(&self) -> u64 {
        self.hits + self.misses + self.pruned
    }
}

/// Turns the host's single per-player hit/miss callbacks into per-request
/// callbacks. All methods run on the host's dispatch thread.
pub struct RayCastRegistry<H: RayCastHost, C: Clock = MonotonicClock> {
    pub(crate) host: H,
    pub(crate) clock: C,
    pub(crate) config: RayCastConfig,
    pub(crate) players: BTreeMap<PlayerId, PlayerState>,
    pub(crate) next_id: u64,
    pub(crate) stats: RegistryStats,
    pub(crate) last_sweep: Duration,
}

impl<H: RayCastHost> RayCastRegistry<H, MonotonicClock> {
    pub fn new(host: H) -> Self {
        Self::with_clock(host, MonotonicClock::new(), RayCastConfig::default())
    }
}

impl<H: RayCastHost, C: Clock> RayCastRegistry<H, C> {
    pub fn with_clock(host: H, clock: C, config: RayCastConfig) -> Self {
        let last_sweep = clock.now();
        Self {
            host,
            clock,
            config,
            players: BTreeMap::new(),
            next_id: 1,
            stats: RegistryStats::default(),
            last_sweep,
        }
    }

    /// Issue a ray cast. Returns immediately; the outcome arrives through
    /// exactly one of the callbacks, or never if the host drops it and no
    /// miss callback was given (pruning only fires `on_miss`).
    pub fn cast<P: RayPoint>(
        &mut self,
        player: PlayerId,
        start: P,
        end: P,
        callbacks: RayCallbacks<P>,
    ) -> Result<RayId> {
        let start = vector::normalize(start, "start")?;
        let end = vector::normalize(end, "end")?;

        let id = RayId(self.next_id);
        self.next_id += 1;

        let now = self.clock.now();
        let pending = PendingCast {
            id,
            start,
            end,
            expected_length: vector::distance(&start, &end),
            created_at: now,
            native_input: P::KIND == PointKind::Native,
            callbacks: callbacks.erase(),
        };

        let state = self.players.entry(player).or_insert_with(|| PlayerState::new(now));
        state.rays.insert(id, pending);
        state.last_activity = now;
        self.stats.issued += 1;

        log::trace!("{} issued {} ({} active)", player, id, state.rays.len());

        self.host.issue_ray_cast(player, start, end);
        Ok(id)
    }

    /// `cast` for embeddings where either callback may be absent.
    /// Fails with `NoCallbacks` when both are.
    pub fn cast_with<P: RayPoint>(
        &mut self,
        player: PlayerId,
        start: P,
        end: P,
        on_hit: Option<HitFn<P>>,
        on_miss: Option<MissFn>,
    ) -> Result<RayId> {
        let callbacks = RayCallbacks::from_parts(on_hit, on_miss)?;
        self.cast(player, start, end, callbacks)
    }

    pub fn config(&self) -> &RayCastConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: RayCastConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn stats(&self) -> RegistryStats {
        self.stats
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Active ray count for `player`.
    pub fn active_count(&self, player: PlayerId) -> usize {
        self.players.get(&player).map_or(0, |s| s.rays.len())
    }

    pub fn pending_misses(&self, player: PlayerId) -> usize {
        self.players.get(&player).map_or(0, |s| s.pending_misses)
    }

    pub fn pending_casts(&self, player: PlayerId) -> impl Iterator<Item = &PendingCast> + '_ {
        self.players.get(&player).into_iter().flat_map(|s| s.rays.values())
    }

    pub fn is_pending(&self, id: RayId) -> bool {
        self.players.values().any(|s| s.rays.contains_key(&id))
    }

    pub fn has_player(&self, player: PlayerId) -> bool {
        self.players.contains_key(&player)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn total_active(&self) -> usize {
        self.players.values().map(|s| s.rays.len()).sum()
    }
}

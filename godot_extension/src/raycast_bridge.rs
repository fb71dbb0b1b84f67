//! Ray Cast Bridge for Godot
//!
//! Script surface:
//! - `cast(player, start, end, on_hit, on_miss)`: start/end are `Vector3` or
//!   `{x, y, z}` Dictionaries; pass `Callable()` for a callback you don't need
//! - `prune_all_states()` / `player_left(player)`
//!
//! Host hooks (wire these to the game's physics layer):
//! - signal `ray_cast_requested(player, start, end)`: run the physics query
//! - `on_ray_cast_hit(player, point, normal)` / `on_ray_cast_missed(player)`
//!
//! Callbacks run before the calling method returns, with the bridge released,
//! so a callback may issue a new cast.

use crate::point_convert::{self, ScriptPoint};
use godot::prelude::*;
use raycast_core::{
    ConfigurationError, HitFn, MissFn, NativeVector, PlainPoint, PlayerId, QueuedHost,
    RayCastConfig, RayCastRegistry, RayId, SettlementReport,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// A script callback waiting to be invoked once the registry borrow ends.
struct ScriptCall {
    callable: Callable,
    args: Vec<Variant>,
}

type CallQueue = Rc<RefCell<VecDeque<ScriptCall>>>;

#[derive(GodotClass)]
#[class(base=Node)]
pub struct RayCastBridge {
    registry: RayCastRegistry<QueuedHost>,
    pending_calls: CallQueue,
    base: Base<Node>,
}

#[godot_api]
impl INode for RayCastBridge {
    fn init(base: Base<Node>) -> Self {
        godot_print!("RayCastBridge initialized");
        Self {
            registry: RayCastRegistry::new(QueuedHost::new()),
            pending_calls: CallQueue::default(),
            base,
        }
    }

    fn process(&mut self, _delta: f64) {
        if let Some(report) = self.registry.poll() {
            self.dispatch(&report);
        }
    }
}

#[godot_api]
impl RayCastBridge {
    /// Emitted once per cast; the game performs the physics test and reports
    /// back through `on_ray_cast_hit` or `on_ray_cast_missed`.
    #[signal]
    fn ray_cast_requested(player: i64, start: Vector3, end: Vector3);

    /// Issue a ray cast.
    ///
    /// # Returns
    /// Ray id (diagnostics only), or -1 if the call was rejected
    #[func]
    pub fn cast(
        &mut self,
        player: i64,
        start: Variant,
        end: Variant,
        on_hit: Callable,
        on_miss: Callable,
    ) -> i64 {
        let result = self.try_cast(PlayerId(player), &start, &end, on_hit, on_miss);
        self.flush_requests();
        match result {
            Ok(id) => id.0 as i64,
            Err(err) => {
                godot_error!("RayCastBridge.cast rejected: {}", err);
                -1
            }
        }
    }

    #[func]
    pub fn on_ray_cast_hit(&mut self, player: i64, point: Vector3, normal: Vector3) {
        let report = self.registry.handle_hit(
            PlayerId(player),
            point_convert::vector3_to_native(point),
            point_convert::vector3_to_native(normal),
        );
        self.dispatch(&report);
    }

    #[func]
    pub fn on_ray_cast_missed(&mut self, player: i64) {
        let report = self.registry.handle_miss(PlayerId(player));
        self.dispatch(&report);
    }

    /// Manual sweep. Returns the number of casts it settled.
    #[func]
    pub fn prune_all_states(&mut self) -> i64 {
        let report = self.registry.prune_all_states();
        self.dispatch(&report);
        report.len() as i64
    }

    /// Call on disconnect; settles the player's in-flight casts as misses.
    #[func]
    pub fn player_left(&mut self, player: i64) -> i64 {
        let report = self.registry.remove_player(PlayerId(player));
        self.dispatch(&report);
        report.len() as i64
    }

    #[func]
    pub fn get_active_count(&self, player: i64) -> i64 {
        self.registry.active_count(PlayerId(player)) as i64
    }

    /// Apply a (partial) JSON config, e.g. `{"ttl_ms": 3000}`.
    #[func]
    pub fn configure(&mut self, config_json: GString) -> bool {
        let applied = RayCastConfig::from_json(&config_json.to_string())
            .and_then(|config| self.registry.set_config(config));
        match applied {
            Ok(()) => true,
            Err(err) => {
                godot_warn!("RayCastBridge.configure ignored: {}", err);
                false
            }
        }
    }

    #[func]
    pub fn get_stats(&self) -> GString {
        let stats = serde_json::json!({
            "success": true,
            "stats": self.registry.stats(),
            "players": self.registry.player_count(),
            "active": self.registry.total_active(),
        });
        GString::from(stats.to_string())
    }

    #[func]
    pub fn set_verbose(&self, verbose: bool) {
        log::set_max_level(if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info });
    }

    #[func]
    pub fn get_version(&self) -> GString {
        GString::from(
            format!(
                "{} ({}, built {})",
                raycast_core::VERSION,
                env!("GIT_HASH"),
                env!("BUILD_TIME_UTC")
            )
            .as_str(),
        )
    }
}

impl RayCastBridge {
    fn try_cast(
        &mut self,
        player: PlayerId,
        start: &Variant,
        end: &Variant,
        on_hit: Callable,
        on_miss: Callable,
    ) -> Result<RayId, ConfigurationError> {
        let start = point_convert::from_variant(start)?;
        let end = point_convert::from_variant(end)?;
        let on_miss = self.queue_miss(on_miss);

        match (start, end) {
            (ScriptPoint::Native(start), ScriptPoint::Native(end)) => {
                let queue = self.pending_calls.clone();
                let on_hit = on_hit.is_valid().then(|| {
                    Box::new(move |point: NativeVector, normal: NativeVector| {
                        let args = point_convert::native_hit_args(point, normal);
                        queue.borrow_mut().push_back(ScriptCall { callable: on_hit, args });
                    }) as HitFn<NativeVector>
                });
                self.registry.cast_with(player, start, end, on_hit, on_miss)
            }
            (ScriptPoint::Plain(start), ScriptPoint::Plain(end)) => {
                let queue = self.pending_calls.clone();
                let on_hit = on_hit.is_valid().then(|| {
                    Box::new(move |point: PlainPoint, normal: PlainPoint| {
                        let args = point_convert::plain_hit_args(point, normal);
                        queue.borrow_mut().push_back(ScriptCall { callable: on_hit, args });
                    }) as HitFn<PlainPoint>
                });
                self.registry.cast_with(player, start, end, on_hit, on_miss)
            }
            _ => Err(ConfigurationError::MixedRepresentation),
        }
    }

    fn queue_miss(&self, on_miss: Callable) -> Option<MissFn> {
        if !on_miss.is_valid() {
            return None;
        }
        let queue = self.pending_calls.clone();
        Some(Box::new(move || {
            queue.borrow_mut().push_back(ScriptCall { callable: on_miss, args: Vec::new() });
        }))
    }

    fn flush_requests(&mut self) {
        let requests: Vec<_> = self.registry.host_mut().drain().collect();
        if requests.is_empty() {
            return;
        }
        let signal = StringName::from("ray_cast_requested");
        for request in requests {
            let args = [
                request.player.0.to_variant(),
                point_convert::native_to_vector3(request.start).to_variant(),
                point_convert::native_to_vector3(request.end).to_variant(),
            ];
            // base_mut() keeps the bridge re-entrant for synchronous handlers.
            self.base_mut().emit_signal(&signal, &args);
        }
    }

    fn dispatch(&mut self, report: &SettlementReport) {
        let calls: Vec<ScriptCall> = self.pending_calls.borrow_mut().drain(..).collect();
        if calls.is_empty() {
            if !report.is_empty() {
                log::debug!("{} cast(s) settled without a matching script callback", report.len());
            }
            return;
        }
        let _guard = self.base_mut();
        for call in calls {
            call.callable.call(&call.args);
        }
    }
}

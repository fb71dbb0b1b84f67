//! Ray Cast Trace Replay
//!
//! Recorded host event traces (JSON) → correlation engine → settlement report.
//! Useful for reproducing "my callback never fired" reports from logs.

use anyhow::{Context, Result};
use raycast_core::{
    HitFn, ManualClock, MissFn, PlainPoint, PlayerId, QueuedHost, RayCastConfig, RayCastRegistry,
    RayId, RayPoint, RayRequest, RegistryStats, Settlement, SettlementReport,
};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

/// A recorded session: optional timing config plus the host events in order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trace {
    #[serde(default)]
    pub config: RayCastConfig,
    pub events: Vec<TraceEvent>,
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TraceEvent {
    /// Script issued a cast; `hit` / `miss` select which callbacks it attached.
    Cast {
        player: i64,
        start: PlainPoint,
        end: PlainPoint,
        #[serde(default = "yes")]
        hit: bool,
        #[serde(default = "yes")]
        miss: bool,
    },
    Hit {
        player: i64,
        point: PlainPoint,
        normal: PlainPoint,
    },
    Miss {
        player: i64,
    },
    /// Move the replay clock forward.
    Advance {
        ms: u64,
    },
    Prune,
    PlayerLeft {
        player: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSettlement {
    /// Index of the event that caused the settlement
    pub event: usize,
    pub player: PlayerId,
    pub id: RayId,
    pub settlement: Settlement,
    /// Hit point as delivered to the callback (hits only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point: Option<PlainPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedCast {
    pub event: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceReport {
    pub settlements: Vec<TraceSettlement>,
    /// Requests forwarded to the (simulated) host, in issue order
    pub requests: Vec<RayRequest>,
    pub rejected: Vec<RejectedCast>,
    pub still_active: usize,
    pub stats: RegistryStats,
}

impl TraceReport {
    pub fn count(&self, settlement: Settlement) -> usize {
        self.settlements.iter().filter(|s| s.settlement == settlement).count()
    }
}

/// Replay every event of `trace` against a fresh registry on a manual clock.
pub fn replay(trace: &Trace) -> Result<TraceReport> {
    trace.config.validate().context("Invalid trace config")?;

    let clock = ManualClock::new();
    let mut registry =
        RayCastRegistry::with_clock(QueuedHost::new(), clock.clone(), trace.config.clone());
    let hit_points: Rc<RefCell<Vec<PlainPoint>>> = Rc::new(RefCell::new(Vec::new()));

    let mut report = TraceReport::default();

    for (index, event) in trace.events.iter().enumerate() {
        let settled = match event {
            TraceEvent::Cast { player, start, end, hit, miss } => {
                let on_hit: Option<HitFn<PlainPoint>> = hit.then(|| {
                    let sink = hit_points.clone();
                    Box::new(move |point: PlainPoint, _normal: PlainPoint| {
                        sink.borrow_mut().push(point)
                    }) as HitFn<PlainPoint>
                });
                let on_miss: Option<MissFn> = miss.then(|| Box::new(|| {}) as MissFn);

                if let Err(err) = registry.cast_with(PlayerId(*player), *start, *end, on_hit, on_miss)
                {
                    report.rejected.push(RejectedCast { event: index, reason: err.to_string() });
                }
                SettlementReport::default()
            }
            TraceEvent::Hit { player, point, normal } => {
                registry.handle_hit(PlayerId(*player), point.to_native(), normal.to_native())
            }
            TraceEvent::Miss { player } => registry.handle_miss(PlayerId(*player)),
            TraceEvent::Advance { ms } => {
                clock.advance_ms(*ms);
                SettlementReport::default()
            }
            TraceEvent::Prune => registry.prune_all_states(),
            TraceEvent::PlayerLeft { player } => registry.remove_player(PlayerId(*player)),
        };

        // At most one hit per handler, so the buffered point belongs to it.
        let mut points = hit_points.borrow_mut().drain(..).collect::<Vec<_>>().into_iter();
        for s in settled.settled {
            let point = if s.settlement == Settlement::Hit { points.next() } else { None };
            report.settlements.push(TraceSettlement {
                event: index,
                player: s.player,
                id: s.id,
                settlement: s.settlement,
                point,
            });
        }

        report.requests.extend(registry.host_mut().drain());
    }

    report.still_active = registry.total_active();
    report.stats = registry.stats();
    Ok(report)
}

pub fn load_trace(path: &Path) -> Result<Trace> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read trace file: {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse trace file: {}", path.display()))
}

pub fn replay_file(path: &Path) -> Result<TraceReport> {
    let trace = load_trace(path)?;
    replay(&trace)
}

pub fn save_report(path: &Path, report: &TraceReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn trace(value: serde_json::Value) -> Trace {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_hit_then_miss_scenario() {
        let t = trace(json!({
            "events": [
                {"op": "cast", "player": 1, "start": {"x": 0.0, "y": 0.0, "z": 0.0}, "end": {"x": 10.0, "y": 0.0, "z": 0.0}},
                {"op": "cast", "player": 1, "start": {"x": 0.0, "y": 0.0, "z": 0.0}, "end": {"x": 50.0, "y": 0.0, "z": 0.0}},
                {"op": "hit", "player": 1, "point": {"x": 10.2, "y": 0.0, "z": 0.0}, "normal": {"x": -1.0, "y": 0.0, "z": 0.0}},
                {"op": "miss", "player": 1}
            ]
        }));

        let report = replay(&t).unwrap();

        assert_eq!(report.requests.len(), 2);
        assert_eq!(report.settlements.len(), 2);

        let hit = &report.settlements[0];
        assert_eq!((hit.event, hit.id, hit.settlement), (2, RayId(1), Settlement::Hit));
        assert_eq!(hit.point, Some(PlainPoint::new(10.2, 0.0, 0.0)));

        let miss = &report.settlements[1];
        assert_eq!((miss.event, miss.id, miss.settlement), (3, RayId(2), Settlement::Miss));
        assert_eq!(miss.point, None);
        assert_eq!(report.still_active, 0);
    }

    #[test]
    fn test_cast_without_callbacks_is_rejected_not_fatal() {
        let t = trace(json!({
            "events": [
                {"op": "cast", "player": 1, "start": {"x": 0.0, "y": 0.0, "z": 0.0}, "end": {"x": 1.0, "y": 0.0, "z": 0.0}, "hit": false, "miss": false},
                {"op": "cast", "player": 1, "start": {"x": 0.0, "y": 0.0, "z": 0.0}, "end": {"x": 1.0, "y": 0.0, "z": 0.0}, "hit": false}
            ]
        }));

        let report = replay(&t).unwrap();

        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].event, 0);
        assert_eq!(report.requests.len(), 1);
        assert_eq!(report.still_active, 1);
    }

    #[test]
    fn test_ttl_pruning_and_player_left() {
        let t = trace(json!({
            "config": {"ttl_ms": 1000},
            "events": [
                {"op": "cast", "player": 1, "start": {"x": 0.0, "y": 0.0, "z": 0.0}, "end": {"x": 5.0, "y": 0.0, "z": 0.0}},
                {"op": "cast", "player": 2, "start": {"x": 0.0, "y": 0.0, "z": 0.0}, "end": {"x": 5.0, "y": 0.0, "z": 0.0}},
                {"op": "player_left", "player": 2},
                {"op": "advance", "ms": 1500},
                {"op": "prune"},
                {"op": "miss", "player": 1}
            ]
        }));

        let report = replay(&t).unwrap();

        assert_eq!(report.count(Settlement::Pruned), 2);
        assert_eq!(report.settlements[0].event, 2);
        assert_eq!(report.settlements[1].event, 4);
        assert_eq!(report.stats.orphaned_misses, 1);
    }

    #[test]
    fn test_invalid_config_fails() {
        let t = trace(json!({"config": {"ttl_ms": 0}, "events": []}));
        assert!(replay(&t).is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let trace_path = dir.path().join("trace.json");
        let report_path = dir.path().join("report.json");

        let t = Trace {
            config: RayCastConfig::default(),
            events: vec![
                TraceEvent::Cast {
                    player: 9,
                    start: PlainPoint::default(),
                    end: PlainPoint::new(0.0, 3.0, 0.0),
                    hit: true,
                    miss: true,
                },
                TraceEvent::Miss { player: 9 },
            ],
        };
        fs::write(&trace_path, serde_json::to_string(&t).unwrap()).unwrap();

        let report = replay_file(&trace_path).unwrap();
        save_report(&report_path, &report).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(saved["settlements"][0]["settlement"], "miss");
        assert_eq!(saved["stats"]["misses"], 1);
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = replay_file(Path::new("/nonexistent/trace.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read trace file"));
    }
}

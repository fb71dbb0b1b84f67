//! # raycast_core - Per-request ray casts over an ID-less host event model
//!
//! The host engine exposes one global hit callback and one miss callback per
//! player, shared by every in-flight ray cast, and neither carries a request
//! id. This crate layers a typed, per-request callback API on top of that:
//!
//! - hits are matched to the pending cast whose expected length best explains
//!   the observed hit distance (oldest wins ties)
//! - misses are counted and only attributed once every live cast of the
//!   player provably missed
//! - casts whose terminal event never arrives are pruned after a TTL and
//!   settled as misses
//!
//! Everything runs on the host's single dispatch thread; there is no locking.
//!
//! ```rust
//! use raycast_core::{PlainPoint, PlayerId, QueuedHost, RayCallbacks, RayCastRegistry};
//!
//! let mut registry = RayCastRegistry::new(QueuedHost::new());
//! registry
//!     .cast(
//!         PlayerId(1),
//!         PlainPoint::new(0.0, 1.0, 0.0),
//!         PlainPoint::new(0.0, 1.0, 30.0),
//!         RayCallbacks::on_hit(|point: PlainPoint, _normal| println!("hit at {:?}", point))
//!             .and_miss(|| println!("nothing there")),
//!     )
//!     .unwrap();
//! assert_eq!(registry.active_count(PlayerId(1)), 1);
//! ```

pub mod callbacks;
pub mod clock;
pub mod config;
pub mod error;
pub mod host;
pub mod registry;
pub mod resolver;
pub mod sweeper;
pub mod vector;

pub use callbacks::{HitFn, MissFn, RayCallbacks};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::RayCastConfig;
pub use error::{ConfigurationError, Result};
pub use host::{QueuedHost, RayCastHost, RayRequest};
pub use registry::{
    PendingCast, PlayerId, RayCastRegistry, RayId, RegistryStats, SettledCast, Settlement,
    SettlementReport,
};
pub use vector::{NativeVector, PlainPoint, PointKind, RayPoint};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

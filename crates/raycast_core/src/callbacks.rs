//! Per-cast callbacks.
//!
//! A cast must carry at least one callback. The typed constructors make an
//! empty set unrepresentable; [`RayCallbacks::from_parts`] is the runtime path
//! for embeddings where both callbacks are optional.

use crate::error::{ConfigurationError, Result};
use crate::vector::{NativeVector, RayPoint};

pub type HitFn<P> = Box<dyn FnOnce(P, P)>;
pub type MissFn = Box<dyn FnOnce()>;

pub enum RayCallbacks<P: RayPoint> {
    HitOnly(HitFn<P>),
    MissOnly(MissFn),
    Both { on_hit: HitFn<P>, on_miss: MissFn },
}

impl<P: RayPoint> RayCallbacks<P> {
    pub fn on_hit(f: impl FnOnce(P, P) + 'static) -> Self {
        RayCallbacks::HitOnly(Box::new(f))
    }

    pub fn on_miss(f: impl FnOnce() + 'static) -> Self {
        RayCallbacks::MissOnly(Box::new(f))
    }

    pub fn both(on_hit: impl FnOnce(P, P) + 'static, on_miss: impl FnOnce() + 'static) -> Self {
        RayCallbacks::Both { on_hit: Box::new(on_hit), on_miss: Box::new(on_miss) }
    }

    /// Add (or replace) the miss callback.
    pub fn and_miss(self, f: impl FnOnce() + 'static) -> Self {
        match self {
            RayCallbacks::HitOnly(on_hit) | RayCallbacks::Both { on_hit, .. } => {
                RayCallbacks::Both { on_hit, on_miss: Box::new(f) }
            }
            RayCallbacks::MissOnly(_) => RayCallbacks::MissOnly(Box::new(f)),
        }
    }

    /// Add (or replace) the hit callback.
    pub fn and_hit(self, f: impl FnOnce(P, P) + 'static) -> Self {
        match self {
            RayCallbacks::MissOnly(on_miss) | RayCallbacks::Both { on_miss, .. } => {
                RayCallbacks::Both { on_hit: Box::new(f), on_miss }
            }
            RayCallbacks::HitOnly(_) => RayCallbacks::HitOnly(Box::new(f)),
        }
    }

    pub fn from_parts(on_hit: Option<HitFn<P>>, on_miss: Option<MissFn>) -> Result<Self> {
        match (on_hit, on_miss) {
            (Some(on_hit), Some(on_miss)) => Ok(RayCallbacks::Both { on_hit, on_miss }),
            (Some(on_hit), None) => Ok(RayCallbacks::HitOnly(on_hit)),
            (None, Some(on_miss)) => Ok(RayCallbacks::MissOnly(on_miss)),
            (None, None) => Err(ConfigurationError::NoCallbacks),
        }
    }

    pub fn has_hit(&self) -> bool {
        !matches!(self, RayCallbacks::MissOnly(_))
    }

    pub fn has_miss(&self) -> bool {
        !matches!(self, RayCallbacks::HitOnly(_))
    }

    /// Wrap the typed hit callback so it takes native vectors and converts
    /// them back to `P` on the way out.
    pub(crate) fn erase(self) -> ErasedCallbacks {
        let (on_hit, on_miss) = match self {
            RayCallbacks::HitOnly(h) => (Some(h), None),
            RayCallbacks::MissOnly(m) => (None, Some(m)),
            RayCallbacks::Both { on_hit, on_miss } => (Some(on_hit), Some(on_miss)),
        };
        ErasedCallbacks {
            on_hit: on_hit.map(|h| -> NativeHitFn {
                Box::new(move |point, normal| h(P::from_native(point), P::from_native(normal)))
            }),
            on_miss,
        }
    }
}

type NativeHitFn = Box<dyn FnOnce(NativeVector, NativeVector)>;

pub(crate) struct ErasedCallbacks {
    on_hit: Option<NativeHitFn>,
    on_miss: Option<MissFn>,
}

impl ErasedCallbacks {
    pub(crate) fn fire_hit(self, point: NativeVector, normal: NativeVector) {
        if let Some(on_hit) = self.on_hit {
            on_hit(point, normal);
        }
    }

    pub(crate) fn fire_miss(self) {
        if let Some(on_miss) = self.on_miss {
            on_miss();
        }
    }
}

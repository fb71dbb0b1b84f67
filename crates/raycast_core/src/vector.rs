//! Vector Adapter
//!
//! Callers hand points to `cast` either as host-native vectors or as plain
//! `{x, y, z}` records. Internally everything is a [`NativeVector`]; results
//! are converted back to whatever representation the caller used so the hit
//! callback sees the same type it passed in.

use crate::error::{ConfigurationError, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Host-native vector representation.
pub type NativeVector = Vector3<f64>;

/// Plain three-field record, as produced by script tables / JSON.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlainPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PlainPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointKind {
    Native,
    Plain,
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::NativeVector {}
    impl Sealed for super::PlainPoint {}
}

/// The closed set of point representations accepted by `cast`.
pub trait RayPoint: sealed::Sealed + Copy + 'static {
    const KIND: PointKind;

    fn to_native(self) -> NativeVector;

    fn from_native(v: NativeVector) -> Self;
}

impl RayPoint for NativeVector {
    const KIND: PointKind = PointKind::Native;

    fn to_native(self) -> NativeVector {
        self
    }

    fn from_native(v: NativeVector) -> Self {
        v
    }
}

impl RayPoint for PlainPoint {
    const KIND: PointKind = PointKind::Plain;

    fn to_native(self) -> NativeVector {
        Vector3::new(self.x, self.y, self.z)
    }

    fn from_native(v: NativeVector) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

/// Normalize a caller point, rejecting NaN / infinite components.
pub fn normalize<P: RayPoint>(point: P, field: &'static str) -> Result<NativeVector> {
    let v = point.to_native();
    if v.iter().all(|c| c.is_finite()) {
        Ok(v)
    } else {
        Err(ConfigurationError::NonFinitePoint { field })
    }
}

pub fn distance(a: &NativeVector, b: &NativeVector) -> f64 {
    (b - a).norm()
}

//! Boundary to the host engine's `IssueRayCast`.
//!
//! The host performs the physics test and later reports back through
//! `handle_hit` / `handle_miss`, with nothing tying the report to a
//! particular request.

use crate::registry::PlayerId;
use crate::vector::NativeVector;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub trait RayCastHost {
    /// Fire-and-forget ray test request.
    fn issue_ray_cast(&mut self, player: PlayerId, start: NativeVector, end: NativeVector);
}

impl<F> RayCastHost for F
where
    F: FnMut(PlayerId, NativeVector, NativeVector),
{
    fn issue_ray_cast(&mut self, player: PlayerId, start: NativeVector, end: NativeVector) {
        self(player, start, end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayRequest {
    pub player: PlayerId,
    pub start: NativeVector,
    pub end: NativeVector,
}

/// Buffers requests for embeddings that pull them on their own schedule
/// (e.g. to emit an engine signal once the registry borrow is released).
#[derive(Debug, Clone, Default)]
pub struct QueuedHost {
    outbox: VecDeque<RayRequest>,
}

impl QueuedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = RayRequest> + '_ {
        self.outbox.drain(..)
    }

    pub fn len(&self) -> usize {
        self.outbox.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outbox.is_empty()
    }
}

impl RayCastHost for QueuedHost {
    fn issue_ray_cast(&mut self, player: PlayerId, start: NativeVector, end: NativeVector) {
        self.outbox.push_back(RayRequest { player, start, end });
    }
}

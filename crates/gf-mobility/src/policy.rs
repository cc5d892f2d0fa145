//! Hop selection: which free neighbor an agent claims next.
//!
//! The controller filters the neighborhood down to legal, unclaimed,
//! reachable candidates (in the fixed [`Connectivity::steps`] order) and
//! hands them to a [`HopPolicy`].  A simulation uses exactly one policy for
//! every agent.
//!
//! [`Connectivity::steps`]: gf_core::Connectivity::steps

use glam::Vec2;

use gf_core::{GridCoord, Step};
use gf_spatial::FlowField;

/// One legal next hop.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HopCandidate {
    pub cell: GridCoord,
    pub step: Step,
    /// Flow-field cost of `cell`; always finite.
    pub cost: f32,
}

/// Chooses among hop candidates.
///
/// `candidates` is in neighbor order and may be empty, in which case the
/// policy returns `None`.  Implementations must be deterministic; ties go to
/// the earliest candidate.
pub trait HopPolicy {
    fn select(
        &self,
        field:      &FlowField,
        current:    GridCoord,
        candidates: &[HopCandidate],
    ) -> Option<HopCandidate>;
}

/// Lowest flow-field cost wins.  The default.
#[derive(Copy, Clone, Debug, Default)]
pub struct CostAscending;

impl HopPolicy for CostAscending {
    fn select(&self, _field: &FlowField, _current: GridCoord, candidates: &[HopCandidate]) -> Option<HopCandidate> {
        let mut best: Option<HopCandidate> = None;
        for &c in candidates {
            if best.is_none_or(|b| c.cost < b.cost) {
                best = Some(c);
            }
        }
        best
    }
}

/// Best alignment (dot product) between the hop and the flow direction at
/// the agent's current cell wins.
#[derive(Copy, Clone, Debug, Default)]
pub struct DirectionAlignment;

impl HopPolicy for DirectionAlignment {
    fn select(&self, field: &FlowField, current: GridCoord, candidates: &[HopCandidate]) -> Option<HopCandidate> {
        let flow = field.direction(current);
        let mut best: Option<(f32, HopCandidate)> = None;
        for &c in candidates {
            let heading = Vec2::new(c.step.dx as f32, c.step.dy as f32).normalize();
            let score = heading.dot(flow);
            if best.is_none_or(|(s, _)| score > s) {
                best = Some((score, c));
            }
        }
        best.map(|(_, c)| c)
    }
}

impl<P: HopPolicy + ?Sized> HopPolicy for Box<P> {
    #[inline]
    fn select(&self, field: &FlowField, current: GridCoord, candidates: &[HopCandidate]) -> Option<HopCandidate> {
        (**self).select(field, current, candidates)
    }
}

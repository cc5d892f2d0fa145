//! The shared cell-reservation ledger.

use rustc_hash::FxHashMap;

use gf_core::{AgentId, GridCoord};

/// Exclusive per-cell claims shared by every agent in one simulation.
///
/// At most one agent holds a given cell at any instant.  The table is owned
/// by the simulation and lent out by `&mut` to whichever controller is
/// updating, so claim attempts are serialized by the update order.
#[derive(Clone, Debug, Default)]
pub struct ReservationTable {
    claims: FxHashMap<GridCoord, AgentId>,
}

impl ReservationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `cell` for `agent`.
    ///
    /// Succeeds iff the cell is unclaimed or already held by `agent`; on
    /// failure nothing changes.
    pub fn try_claim(&mut self, cell: GridCoord, agent: AgentId) -> bool {
        match self.claims.get(&cell) {
            Some(&holder) => holder == agent,
            None => {
                self.claims.insert(cell, agent);
                true
            }
        }
    }

    /// Drop any claim on `cell`, whoever holds it.
    #[inline]
    pub fn release(&mut self, cell: GridCoord) {
        self.claims.remove(&cell);
    }

    /// Drop the claim on `cell` only if `agent` holds it.  Returns `true` if
    /// a claim was removed.
    pub fn release_owned(&mut self, cell: GridCoord, agent: AgentId) -> bool {
        if self.claims.get(&cell) == Some(&agent) {
            self.claims.remove(&cell);
            true
        } else {
            false
        }
    }

    /// Drop every claim.
    #[inline]
    pub fn clear_all(&mut self) {
        self.claims.clear();
    }

    #[inline]
    pub fn holder(&self, cell: GridCoord) -> Option<AgentId> {
        self.claims.get(&cell).copied()
    }

    #[inline]
    pub fn is_claimed(&self, cell: GridCoord) -> bool {
        self.claims.contains_key(&cell)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// All claims, sorted by cell (row-major) for reproducible output.
    pub fn iter(&self) -> impl Iterator<Item = (GridCoord, AgentId)> + '_ {
        let mut claims: Vec<(GridCoord, AgentId)> =
            self.claims.iter().map(|(&c, &a)| (c, a)).collect();
        claims.sort_unstable_by_key(|&(c, _)| c);
        claims.into_iter()
    }
}

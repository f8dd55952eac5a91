//! Resource slot allocator
//!
//! Hands out resource coordinates from the hive's candidate pool so that no
//! coordinate is ever claimed by two slots at once. Candidates are chosen
//! uniformly at random rather than nearest-first, which spreads agents over
//! the whole field.
//!
//! Claims are only touched through `acquire_where` / `release` /
//! `release_slot`, and each of those completes within the calling agent's
//! turn, so claims never race.

use ahash::AHashMap;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::types::BlockPos;
use crate::world::block::ResourceTag;
use crate::world::grid::GridQuery;

#[derive(Debug, Clone)]
pub struct ResourceAllocator {
    /// Candidates found by the last scan, in scan order
    pool: Vec<BlockPos>,
    /// Coordinate -> slot holding it
    claims: AHashMap<BlockPos, usize>,
    /// Slot -> coordinate it holds
    assigned: Vec<Option<BlockPos>>,
    /// Ticks until the next scan
    scan_cooldown: u32,
}

impl ResourceAllocator {
    pub fn new(slot_count: usize) -> Self {
        Self {
            pool: Vec::new(),
            claims: AHashMap::new(),
            assigned: vec![None; slot_count],
            scan_cooldown: 0,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.assigned.len()
    }

    /// Claim a random unclaimed coordinate for `slot`
    ///
    /// Returns None if the slot already holds a claim or nothing is available.
    pub fn acquire<R: Rng>(&mut self, slot: usize, rng: &mut R) -> Option<BlockPos> {
        self.acquire_where(slot, rng, |_| true)
    }

    /// Like `acquire`, skipping candidates that `accept` rejects
    ///
    /// Rejected candidates stay in the pool; the next scan decides whether
    /// they survive.
    pub fn acquire_where<R, F>(&mut self, slot: usize, rng: &mut R, accept: F) -> Option<BlockPos>
    where
        R: Rng,
        F: Fn(BlockPos) -> bool,
    {
        match self.assigned.get(slot) {
            None => {
                tracing::warn!(slot, "Acquire for a slot that does not exist");
                return None;
            }
            Some(Some(_)) => return None,
            Some(None) => {}
        }

        let candidates: Vec<BlockPos> = self
            .pool
            .iter()
            .copied()
            .filter(|pos| !self.claims.contains_key(pos) && accept(*pos))
            .collect();
        let chosen = *candidates.choose(rng)?;

        debug_assert!(!self.claims.contains_key(&chosen), "double claim of {}", chosen);
        self.claims.insert(chosen, slot);
        self.assigned[slot] = Some(chosen);
        tracing::debug!(slot, %chosen, "Resource claimed");
        Some(chosen)
    }

    /// Return `coord` to the pool
    ///
    /// A no-op (returning false) if `slot` does not hold it, so double
    /// releases are harmless.
    pub fn release(&mut self, slot: usize, coord: BlockPos) -> bool {
        match self.claims.get(&coord) {
            Some(&owner) if owner == slot => {
                self.claims.remove(&coord);
                if let Some(entry) = self.assigned.get_mut(slot) {
                    *entry = None;
                }
                tracing::debug!(slot, %coord, "Resource released");
                true
            }
            owner => {
                tracing::warn!(slot, %coord, ?owner, "Release of a coordinate the slot does not hold");
                false
            }
        }
    }

    /// Drop whatever `slot` holds
    pub fn release_slot(&mut self, slot: usize) -> Option<BlockPos> {
        let coord = self.assigned.get(slot).copied().flatten()?;
        self.release(slot, coord);
        Some(coord)
    }

    /// Replace the pool with a fresh scan; existing claims are kept
    ///
    /// Returns the number of candidates found.
    pub fn rescan(
        &mut self,
        grid: &dyn GridQuery,
        center: BlockPos,
        radius: i32,
        tag: ResourceTag,
        cooldown: u32,
    ) -> usize {
        self.pool = grid.scan_tagged(center, radius, tag);
        self.scan_cooldown = cooldown;
        tracing::debug!(%center, found = self.pool.len(), claimed = self.claims.len(), "Hive rescan");
        self.pool.len()
    }

    /// Count down the scan cooldown, rescanning when it runs out
    pub fn tick_rescan(
        &mut self,
        grid: &dyn GridQuery,
        center: BlockPos,
        radius: i32,
        tag: ResourceTag,
        cooldown: u32,
    ) -> bool {
        if self.scan_cooldown > 0 {
            self.scan_cooldown -= 1;
            return false;
        }
        self.rescan(grid, center, radius, tag, cooldown);
        true
    }

    pub fn claimant(&self, coord: BlockPos) -> Option<usize> {
        self.claims.get(&coord).copied()
    }

    pub fn is_claimed(&self, coord: BlockPos) -> bool {
        self.claims.contains_key(&coord)
    }

    pub fn assigned(&self, slot: usize) -> Option<BlockPos> {
        self.assigned.get(slot).copied().flatten()
    }

    pub fn claim_count(&self) -> usize {
        self.claims.len()
    }

    pub fn pool(&self) -> &[BlockPos] {
        &self.pool
    }

    pub fn unclaimed(&self) -> impl Iterator<Item = BlockPos> + '_ {
        self.pool
            .iter()
            .copied()
            .filter(|pos| !self.claims.contains_key(pos))
    }

    pub fn scan_cooldown(&self) -> u32 {
        self.scan_cooldown
    }
}

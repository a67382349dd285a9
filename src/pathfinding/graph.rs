use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::FxHashMap;
use tracing::warn;

use super::cost::{ComputeCost, Euclidean, EstimateCost};
use super::types::{
    direction, insert_sorted, remove_sorted, segment_key, AStarError, Point, PointId, SearchStats,
};
use crate::config::InitialConfig;
use crate::fixed_math::{Fixed, FixedVec2};

/// Expansion count above which a search is reported as slow.
pub const DEFAULT_SLOW_SEARCH_EXPANSIONS: usize = 1000;

/// Deterministic A* over a weighted graph of points in fixed-point space.
///
/// Points live in an arena of slots addressed through an id index. Segments
/// are kept in a `BTreeMap` keyed by `(u, v)` with `u < v`, so segment
/// enumeration is ordered and identical on every peer.
///
/// Every rejected operation returns an [`AStarError`], logs a warning and
/// leaves the graph as it was.
pub struct AStar2D {
    pub(super) slots: Vec<Option<Point>>,
    pub(super) free_slots: Vec<usize>,
    pub(super) index: FxHashMap<PointId, usize>,
    pub(super) segments: BTreeMap<(PointId, PointId), u8>,
    pub(super) last_free_id: PointId,
    pub(super) pass: u64,

    pub(super) estimate: Box<dyn EstimateCost>,
    pub(super) compute: Box<dyn ComputeCost>,

    pub(super) slow_search_expansions: usize,
    pub(super) last_stats: SearchStats,
    pub(super) searches: u64,
}

impl Default for AStar2D {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AStar2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AStar2D")
            .field("points", &self.index.len())
            .field("segments", &self.segments.len())
            .field("last_free_id", &self.last_free_id)
            .field("pass", &self.pass)
            .finish_non_exhaustive()
    }
}

/// Two distinct occupied slots, mutably.
fn pair_mut(
    slots: &mut [Option<Point>],
    slot_a: usize,
    slot_b: usize,
) -> Option<(&mut Point, &mut Point)> {
    if slot_a == slot_b {
        return None;
    }
    let (first, second) = if slot_a < slot_b {
        let (lo, hi) = slots.split_at_mut(slot_b);
        (&mut lo[slot_a], &mut hi[0])
    } else {
        let (lo, hi) = slots.split_at_mut(slot_a);
        (&mut hi[0], &mut lo[slot_b])
    };
    first.as_mut().zip(second.as_mut())
}

/// Log and return a rejected operation.
pub(super) fn rejected<T>(err: AStarError) -> Result<T, AStarError> {
    warn!("[PATHFINDING] {}", err);
    Err(err)
}

impl AStar2D {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_slots: Vec::new(),
            index: FxHashMap::default(),
            segments: BTreeMap::new(),
            last_free_id: 0,
            pass: 1,
            estimate: Box::new(Euclidean),
            compute: Box::new(Euclidean),
            slow_search_expansions: DEFAULT_SLOW_SEARCH_EXPANSIONS,
            last_stats: SearchStats::default(),
            searches: 0,
        }
    }

    /// Graph sized and tuned from the startup configuration.
    pub fn with_config(config: &InitialConfig) -> Self {
        let mut graph = Self::new();
        if config.point_capacity > 0 {
            graph.slots.reserve_exact(config.point_capacity);
            graph.index.reserve(config.point_capacity);
        }
        graph.slow_search_expansions = config.slow_search_expansions;
        graph
    }

    /// Replace the heuristic used for f-scores.
    pub fn set_estimate_cost(&mut self, estimate: impl EstimateCost + 'static) {
        self.estimate = Box::new(estimate);
    }

    /// Replace the edge traversal cost.
    pub fn set_compute_cost(&mut self, compute: impl ComputeCost + 'static) {
        self.compute = Box::new(compute);
    }

    pub fn set_slow_search_expansions(&mut self, expansions: usize) {
        self.slow_search_expansions = expansions;
    }

    pub(super) fn slot_of(&self, id: PointId) -> Result<usize, AStarError> {
        match self.index.get(&id) {
            Some(&slot) => Ok(slot),
            None => rejected(AStarError::PointNotFound(id)),
        }
    }

    pub(super) fn point(&self, id: PointId) -> Result<&Point, AStarError> {
        let slot = self.slot_of(id)?;
        match self.slots[slot].as_ref() {
            Some(point) => Ok(point),
            None => rejected(AStarError::PointNotFound(id)),
        }
    }

    pub(super) fn point_mut(&mut self, id: PointId) -> Result<&mut Point, AStarError> {
        let slot = self.slot_of(id)?;
        match self.slots[slot].as_mut() {
            Some(point) => Ok(point),
            None => rejected(AStarError::PointNotFound(id)),
        }
    }

    /// Next id for [`AStar2D::add_point`].
    ///
    /// Returns the most recently freed id when it is still free, otherwise
    /// walks upward from it to the first unused id.
    pub fn get_available_point_id(&mut self) -> PointId {
        if self.index.contains_key(&self.last_free_id) {
            let mut id = self.last_free_id + 1;
            while self.index.contains_key(&id) {
                id += 1;
            }
            self.last_free_id = id;
        }
        self.last_free_id
    }

    /// Add a point, or move and reweight it when `id` already exists.
    pub fn add_point(
        &mut self,
        id: PointId,
        position: FixedVec2,
        weight_scale: Fixed,
    ) -> Result<(), AStarError> {
        if id < 0 {
            return rejected(AStarError::NegativeId(id));
        }
        if weight_scale < Fixed::ONE {
            return rejected(AStarError::WeightScaleTooSmall(weight_scale));
        }

        if let Some(&slot) = self.index.get(&id) {
            if let Some(point) = self.slots[slot].as_mut() {
                point.position = position;
                point.weight_scale = weight_scale;
                return Ok(());
            }
        }

        let point = Point::new(id, position, weight_scale);
        let slot = match self.free_slots.pop() {
            Some(slot) => {
                self.slots[slot] = Some(point);
                slot
            }
            None => {
                self.slots.push(Some(point));
                self.slots.len() - 1
            }
        };
        self.index.insert(id, slot);
        Ok(())
    }

    pub fn get_point_position(&self, id: PointId) -> Result<FixedVec2, AStarError> {
        Ok(self.point(id)?.position)
    }

    pub fn set_point_position(&mut self, id: PointId, position: FixedVec2) -> Result<(), AStarError> {
        self.point_mut(id)?.position = position;
        Ok(())
    }

    pub fn get_point_weight_scale(&self, id: PointId) -> Result<Fixed, AStarError> {
        Ok(self.point(id)?.weight_scale)
    }

    pub fn set_point_weight_scale(&mut self, id: PointId, weight_scale: Fixed) -> Result<(), AStarError> {
        let slot = self.slot_of(id)?;
        if weight_scale < Fixed::ONE {
            return rejected(AStarError::WeightScaleTooSmall(weight_scale));
        }
        if let Some(point) = self.slots[slot].as_mut() {
            point.weight_scale = weight_scale;
        }
        Ok(())
    }

    /// Remove a point with every segment and neighbour entry touching it.
    pub fn remove_point(&mut self, id: PointId) -> Result<(), AStarError> {
        let slot = self.slot_of(id)?;
        let Some(point) = self.slots[slot].take() else {
            return rejected(AStarError::PointNotFound(id));
        };

        for &other in point.neighbours.iter().chain(point.unlinked_neighbours.iter()) {
            let (key, _) = segment_key(id, other);
            self.segments.remove(&key);

            if let Some(&other_slot) = self.index.get(&other) {
                if let Some(other_point) = self.slots[other_slot].as_mut() {
                    remove_sorted(&mut other_point.neighbours, id);
                    remove_sorted(&mut other_point.unlinked_neighbours, id);
                }
            }
        }

        self.index.remove(&id);
        self.free_slots.push(slot);
        self.last_free_id = id;
        Ok(())
    }

    pub fn has_point(&self, id: PointId) -> bool {
        self.index.contains_key(&id)
    }

    /// All point ids, ascending.
    pub fn get_points(&self) -> Vec<PointId> {
        let mut ids: Vec<PointId> = self.index.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Ids this point links to, ascending.
    pub fn get_point_connections(&self, id: PointId) -> Result<Vec<PointId>, AStarError> {
        Ok(self.point(id)?.neighbours.to_vec())
    }

    pub fn get_point_count(&self) -> usize {
        self.index.len()
    }

    pub fn get_point_capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Grow storage to hold at least `num_points` points.
    pub fn reserve_space(&mut self, num_points: usize) -> Result<(), AStarError> {
        let current = self.get_point_capacity();
        if num_points == 0 || num_points < current {
            return rejected(AStarError::InvalidCapacity {
                requested: num_points,
                current,
            });
        }
        self.slots.reserve_exact(num_points - self.slots.len());
        self.index.reserve(num_points.saturating_sub(self.index.len()));
        Ok(())
    }

    /// Drop every point and segment and restart id allocation at zero.
    pub fn clear(&mut self) {
        self.last_free_id = 0;
        self.slots.clear();
        self.free_slots.clear();
        self.index.clear();
        self.segments.clear();
    }

    /// Disabled points stay in the graph but are skipped by searches.
    pub fn set_point_disabled(&mut self, id: PointId, disabled: bool) -> Result<(), AStarError> {
        self.point_mut(id)?.enabled = !disabled;
        Ok(())
    }

    pub fn is_point_disabled(&self, id: PointId) -> Result<bool, AStarError> {
        Ok(!self.point(id)?.enabled)
    }

    /// Link `id -> with_id`, and `with_id -> id` too when `bidirectional`.
    ///
    /// Connecting over an existing segment adds the new direction to it.
    pub fn connect_points(
        &mut self,
        id: PointId,
        with_id: PointId,
        bidirectional: bool,
    ) -> Result<(), AStarError> {
        if id == with_id {
            return rejected(AStarError::SelfConnection(id));
        }
        let slot_a = self.slot_of(id)?;
        let slot_b = self.slot_of(with_id)?;

        let (key, mut dir) = segment_key(id, with_id);
        if bidirectional {
            dir = direction::BIDIRECTIONAL;
        }
        let existing = self.segments.get(&key).copied();
        if let Some(existing) = existing {
            dir |= existing;
        }

        let Some((a, b)) = pair_mut(&mut self.slots, slot_a, slot_b) else {
            return rejected(AStarError::PointNotFound(id));
        };
        insert_sorted(&mut a.neighbours, with_id);
        if bidirectional {
            insert_sorted(&mut b.neighbours, id);
        } else {
            insert_sorted(&mut b.unlinked_neighbours, id);
        }
        if existing.is_some() && dir == direction::BIDIRECTIONAL {
            // Both are neighbours of each other now.
            remove_sorted(&mut a.unlinked_neighbours, with_id);
            remove_sorted(&mut b.unlinked_neighbours, id);
        }

        self.segments.insert(key, dir);
        Ok(())
    }

    /// Remove the link `id -> with_id`, or both directions when
    /// `bidirectional`.
    ///
    /// A bidirectional segment losing one direction is demoted to a
    /// one-way segment; a segment with no direction left is removed.
    /// Disconnecting points that share no segment does nothing.
    pub fn disconnect_points(
        &mut self,
        id: PointId,
        with_id: PointId,
        bidirectional: bool,
    ) -> Result<(), AStarError> {
        let slot_a = self.slot_of(id)?;
        let slot_b = self.slot_of(with_id)?;

        let (key, dir) = segment_key(id, with_id);
        let Some(&existing) = self.segments.get(&key) else {
            return Ok(());
        };
        let remove = if bidirectional {
            direction::BIDIRECTIONAL
        } else {
            dir
        };
        let remaining = existing & !remove;

        let Some((a, b)) = pair_mut(&mut self.slots, slot_a, slot_b) else {
            return Ok(());
        };
        remove_sorted(&mut a.neighbours, with_id);
        if bidirectional {
            remove_sorted(&mut b.neighbours, id);
            if existing != direction::BIDIRECTIONAL {
                remove_sorted(&mut a.unlinked_neighbours, with_id);
                remove_sorted(&mut b.unlinked_neighbours, id);
            }
        } else if remaining == direction::NONE {
            remove_sorted(&mut b.unlinked_neighbours, id);
        } else {
            insert_sorted(&mut a.unlinked_neighbours, with_id);
        }

        if remaining == direction::NONE {
            self.segments.remove(&key);
        } else {
            self.segments.insert(key, remaining);
        }
        Ok(())
    }

    /// With `bidirectional` any segment between the two counts; otherwise
    /// the link `id -> with_id` must exist.
    pub fn are_points_connected(&self, id: PointId, with_id: PointId, bidirectional: bool) -> bool {
        let (key, dir) = segment_key(id, with_id);
        match self.segments.get(&key) {
            Some(&existing) => bidirectional || existing & dir == dir,
            None => false,
        }
    }

    /// Nearest point to `position`. Equidistant points resolve to the
    /// smaller id. `None` when no point qualifies.
    pub fn get_closest_point(&self, position: FixedVec2, include_disabled: bool) -> Option<PointId> {
        let mut closest: Option<(Fixed, PointId)> = None;

        for point in self.slots.iter().flatten() {
            if !include_disabled && !point.enabled {
                continue;
            }

            let d = position.distance_to(point.position);
            let better = match closest {
                None => true,
                Some((best, best_id)) => d < best || (d == best && point.id < best_id),
            };
            if better {
                closest = Some((d, point.id));
            }
        }

        closest.map(|(_, id)| id)
    }

    /// Nearest position on any segment whose ends are both enabled.
    ///
    /// Segments are scanned in `(u, v)` order and the first minimum found is
    /// kept. Returns the zero vector when no segment qualifies.
    pub fn get_closest_position_in_segment(&self, position: FixedVec2) -> FixedVec2 {
        let mut closest_dist = Fixed::MAX;
        let mut closest_point = FixedVec2::ZERO;

        for &(u, v) in self.segments.keys() {
            let (Some(&su), Some(&sv)) = (self.index.get(&u), self.index.get(&v)) else {
                continue;
            };
            let (Some(from), Some(to)) = (self.slots[su].as_ref(), self.slots[sv].as_ref()) else {
                continue;
            };
            if !(from.enabled && to.enabled) {
                continue;
            }

            let p = FixedVec2::closest_point_to_segment(position, from.position, to.position);
            let d = position.distance_to(p);
            if d < closest_dist {
                closest_point = p;
                closest_dist = d;
            }
        }

        closest_point
    }
}

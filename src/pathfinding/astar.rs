use tracing::warn;

use super::graph::AStar2D;
use super::types::{AStarError, NeighbourList, PointId, SearchStats};
use crate::fixed_math::{Fixed, FixedVec2};
use crate::profile_log;
use crate::profiling::profile;

/// Open list entry. Scores are copied in so the heap can order entries
/// without touching the arena; they are rewritten whenever the point's
/// scores improve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct OpenEntry {
    pub slot: usize,
    pub f_score: Fixed,
    pub g_score: Fixed,
}

/// `a` pops after `b`: higher f, or equal f and lower g.
#[inline]
fn is_worse(a: &OpenEntry, b: &OpenEntry) -> bool {
    if a.f_score > b.f_score {
        true
    } else if a.f_score < b.f_score {
        false
    } else {
        a.g_score < b.g_score
    }
}

/// Binary heap with hole-based sifting.
///
/// The exact move sequence decides which of several equally good entries
/// pops first, so it must not be swapped for `std::collections::BinaryHeap`.
#[derive(Debug, Default)]
pub(super) struct OpenList {
    entries: Vec<OpenEntry>,
}

impl OpenList {
    pub fn with_start(entry: OpenEntry) -> Self {
        Self { entries: vec![entry] }
    }

    #[inline]
    pub fn peek(&self) -> Option<&OpenEntry> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn push(&mut self, entry: OpenEntry) {
        self.entries.push(entry);
        let hole = self.entries.len() - 1;
        self.sift_up(hole, 0, entry);
    }

    /// Re-seat an entry whose scores just improved.
    pub fn improve(&mut self, entry: OpenEntry) {
        if let Some(hole) = self.entries.iter().position(|e| e.slot == entry.slot) {
            self.sift_up(hole, 0, entry);
        }
    }

    pub fn pop(&mut self) -> Option<OpenEntry> {
        let top = *self.entries.first()?;
        let last = self.entries.len() - 1;
        let value = self.entries[last];
        self.entries[last] = top;
        self.adjust(0, last, value);
        self.entries.pop()
    }

    fn sift_up(&mut self, mut hole: usize, top: usize, value: OpenEntry) {
        while hole > top {
            let parent = (hole - 1) / 2;
            if !is_worse(&self.entries[parent], &value) {
                break;
            }
            self.entries[hole] = self.entries[parent];
            hole = parent;
        }
        self.entries[hole] = value;
    }

    /// Move the hole at `hole` down to a leaf of the first `len` entries,
    /// then sift `value` up into place.
    fn adjust(&mut self, mut hole: usize, len: usize, value: OpenEntry) {
        let top = hole;
        let mut second_child = 2 * hole + 2;

        while second_child < len {
            if is_worse(&self.entries[second_child], &self.entries[second_child - 1]) {
                second_child -= 1;
            }
            self.entries[hole] = self.entries[second_child];
            hole = second_child;
            second_child = 2 * (second_child + 1);
        }

        if second_child == len {
            self.entries[hole] = self.entries[second_child - 1];
            hole = second_child - 1;
        }

        self.sift_up(hole, top, value);
    }
}

impl AStar2D {
    /// Run A* from slot `begin` to slot `end`, leaving back-references in
    /// the arena. Returns whether `end` was reached.
    #[profile(2000)]
    fn solve(&mut self, begin: usize, end: usize) -> bool {
        self.pass += 1;
        self.searches += 1;
        let pass = self.pass;
        let mut stats = SearchStats::default();

        let end_view = match self.slots[end].as_ref() {
            Some(point) if point.enabled => point.view(),
            _ => {
                self.last_stats = stats;
                return false;
            }
        };

        let start_entry = match self.slots[begin].as_mut() {
            Some(point) => {
                point.g_score = Fixed::ZERO;
                point.f_score = self.estimate.estimate_cost(point.view(), end_view);
                OpenEntry {
                    slot: begin,
                    f_score: point.f_score,
                    g_score: point.g_score,
                }
            }
            None => {
                self.last_stats = stats;
                return false;
            }
        };

        let mut open_list = OpenList::with_start(start_entry);
        stats.pushed_points = 1;

        while let Some(&current) = open_list.peek() {
            if current.slot == end {
                stats.found_route = true;
                break;
            }

            open_list.pop();
            stats.expanded_points += 1;

            let (p_view, p_g, neighbours): (_, _, NeighbourList) = match self.slots[current.slot].as_mut() {
                Some(p) => {
                    p.closed_pass = pass;
                    (p.view(), p.g_score, p.neighbours.clone())
                }
                None => continue,
            };

            for e_id in neighbours {
                let Some(&e_slot) = self.index.get(&e_id) else {
                    continue;
                };
                let Some(e) = self.slots[e_slot].as_mut() else {
                    continue;
                };
                if !e.enabled || e.closed_pass == pass {
                    continue;
                }

                let e_view = e.view();
                let tentative_g_score =
                    p_g + self.compute.compute_cost(p_view, e_view) * e.weight_scale;

                let mut new_point = false;
                if e.open_pass != pass {
                    e.open_pass = pass;
                    new_point = true;
                } else if tentative_g_score >= e.g_score {
                    continue;
                }

                e.prev_point = Some(current.slot);
                e.g_score = tentative_g_score;
                e.f_score = e.g_score + self.estimate.estimate_cost(e_view, end_view);

                let entry = OpenEntry {
                    slot: e_slot,
                    f_score: e.f_score,
                    g_score: e.g_score,
                };
                if new_point {
                    open_list.push(entry);
                    stats.pushed_points += 1;
                } else {
                    open_list.improve(entry);
                }
            }
        }

        if stats.expanded_points > self.slow_search_expansions {
            warn!(
                "[PATHFINDING] A* expanded {} points (high!), {} still open",
                stats.expanded_points,
                open_list.len()
            );
        }
        profile_log!(
            self.searches,
            "[PATHFINDING] search #{}: {:?}",
            self.searches,
            stats
        );

        self.last_stats = stats;
        stats.found_route
    }

    /// Slots along the route from `from_id` to `to_id`, start first. Empty
    /// when there is no route.
    fn route(&mut self, from_id: PointId, to_id: PointId) -> Result<Vec<usize>, AStarError> {
        let begin = self.slot_of(from_id)?;
        let end = self.slot_of(to_id)?;

        if begin == end {
            self.last_stats = SearchStats {
                found_route: true,
                ..SearchStats::default()
            };
            return Ok(vec![begin]);
        }

        if !self.solve(begin, end) {
            return Ok(Vec::new());
        }

        let mut route = vec![end];
        let mut current = end;
        while current != begin {
            match self.slots[current].as_ref().and_then(|p| p.prev_point) {
                Some(prev) => {
                    route.push(prev);
                    current = prev;
                }
                None => break,
            }
        }
        route.reverse();
        Ok(route)
    }

    /// Positions along the cheapest route, start first.
    ///
    /// Unknown ids are an error; an unreachable or disabled destination
    /// yields an empty path.
    pub fn get_point_path(&mut self, from_id: PointId, to_id: PointId) -> Result<Vec<FixedVec2>, AStarError> {
        let route = self.route(from_id, to_id)?;
        Ok(route
            .into_iter()
            .filter_map(|slot| self.slots[slot].as_ref().map(|p| p.position))
            .collect())
    }

    /// Ids along the cheapest route, start first.
    pub fn get_id_path(&mut self, from_id: PointId, to_id: PointId) -> Result<Vec<PointId>, AStarError> {
        let route = self.route(from_id, to_id)?;
        Ok(route
            .into_iter()
            .filter_map(|slot| self.slots[slot].as_ref().map(|p| p.id))
            .collect())
    }

    /// Counters from the most recent path query.
    pub fn last_search_stats(&self) -> SearchStats {
        self.last_stats
    }
}

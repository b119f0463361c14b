//! Barnes-Hut quadtree for approximating pairwise repulsion
//!
//! The tree is rebuilt from scratch on every tick. Regions live in a flat
//! arena addressed by index; the four children of a region are always stored
//! next to each other, so a region only needs the handle of its first child.
//! Rebuilding truncates the arena and keeps its allocation, which keeps the
//! repulsion pass free of allocations once the arena has grown to size.
//!
//! Every region either owns a single body directly, or has exactly four
//! children, or is empty. Bodies outside the root area are ignored, as are
//! bodies that land in the one-unit gap between sibling regions after a split
//! (their mass still counts in every ancestor that accepted them).

use crate::geometry::{Area, Vector};
use crate::model::Body;

/// Handle of the root region
pub const ROOT: usize = 0;

/// Depth past which regions stop splitting
///
/// Bodies reaching a full leaf at this depth are folded into its aggregate
/// instead of splitting it. This only happens for bodies closer together than
/// the floating point resolution of the area.
pub const MAX_DEPTH: u32 = 48;

#[derive(Debug, Clone)]
struct Region {
    area: Area,
    mass: f64,
    center_of_mass: Vector,
    occupant: Option<usize>,
    children: Option<usize>,
    depth: u32,
}

impl Region {
    fn empty(area: Area, depth: u32) -> Self {
        Self {
            area,
            mass: 0.0,
            center_of_mass: area.center(),
            occupant: None,
            children: None,
            depth,
        }
    }

    /// Fold a body into the aggregated mass and center of mass
    fn absorb(&mut self, point: Vector, mass: f64) {
        let total = self.mass + mass;
        // Keep the center exact for a first or coincident body so that it
        // compares equal to the body's own position.
        if self.mass == 0.0 || point == self.center_of_mass {
            self.center_of_mass = point;
        } else {
            self.center_of_mass = (self.center_of_mass * self.mass + point * mass) / total;
        }
        self.mass = total;
    }
}

/// Outcome of inserting one body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The body owns a leaf
    Leaf,
    /// The body shares a leaf's aggregate without owning it
    Folded,
    /// The body fell between sibling regions below the root
    Gap,
    /// The body lies outside the root area and was ignored
    Outside,
}

/// Counters gathered while building the tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub regions: usize,
    pub leaves: usize,
    pub folded: usize,
    pub in_gap: usize,
    pub outside: usize,
}

/// Read-only view of a region's aggregate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionSummary {
    pub area: Area,
    pub mass: f64,
    pub center_of_mass: Vector,
}

/// Arena-backed Barnes-Hut quadtree
#[derive(Debug, Clone)]
pub struct QuadTree {
    regions: Vec<Region>,
    threshold: f64,
    stats: IndexStats,
}

impl QuadTree {
    /// Create an empty tree with the given approximation threshold
    pub fn new(threshold: f64) -> Self {
        Self {
            regions: Vec::new(),
            threshold,
            stats: IndexStats::default(),
        }
    }

    /// Drop every region, keeping the arena's capacity
    pub fn clear(&mut self) {
        self.regions.clear();
        self.stats = IndexStats::default();
    }

    /// Rebuild the tree over `area` from the current body positions
    ///
    /// Body handles used by [`QuadTree::repulsion_at`] are indices into `bodies`.
    pub fn rebuild(&mut self, area: Area, bodies: &[Body]) -> IndexStats {
        self.clear();
        self.regions.push(Region::empty(area, 0));

        for slot in 0..bodies.len() {
            match self.insert(bodies, slot) {
                Placement::Leaf => self.stats.leaves += 1,
                Placement::Folded => self.stats.folded += 1,
                Placement::Gap => self.stats.in_gap += 1,
                Placement::Outside => self.stats.outside += 1,
            }
        }
        self.stats.regions = self.regions.len();

        tracing::debug!(
            regions = self.stats.regions,
            leaves = self.stats.leaves,
            folded = self.stats.folded,
            in_gap = self.stats.in_gap,
            outside = self.stats.outside,
            "rebuilt spatial index"
        );
        self.stats
    }

    /// Insert the body stored at `slot`, descending from the root
    ///
    /// A resident displaced into a gap by the split is moved from the leaf
    /// count to the gap count here, so the counters always add up.
    fn insert(&mut self, bodies: &[Body], slot: usize) -> Placement {
        let Some(root) = self.regions.first() else {
            return Placement::Outside;
        };
        let (point, mass) = (bodies[slot].position, bodies[slot].mass);
        if !root.area.contains(point) {
            return Placement::Outside;
        }

        let mut handle = ROOT;
        loop {
            let region = &mut self.regions[handle];
            region.absorb(point, mass);

            let first = match (region.occupant, region.children) {
                (None, None) => {
                    region.occupant = Some(slot);
                    return Placement::Leaf;
                }
                (Some(resident), None) => {
                    let resident_point = bodies[resident].position;
                    if resident_point == point || region.depth >= MAX_DEPTH {
                        return Placement::Folded;
                    }
                    region.occupant = None;
                    let first = self.split(handle);
                    // The resident's mass is already counted here; it only
                    // needs to move down into whichever child holds it.
                    match self.child_containing(first, resident_point) {
                        Some(child) => {
                            let child = &mut self.regions[child];
                            child.absorb(resident_point, bodies[resident].mass);
                            child.occupant = Some(resident);
                        }
                        None => {
                            self.stats.leaves -= 1;
                            self.stats.in_gap += 1;
                        }
                    }
                    first
                }
                (_, Some(first)) => first,
            };

            match self.child_containing(first, point) {
                Some(child) => handle = child,
                None => return Placement::Gap,
            }
        }
    }

    /// Append four children for `handle` and return the first one's handle
    fn split(&mut self, handle: usize) -> usize {
        let parent = &self.regions[handle];
        let (quadrants, depth) = (parent.area.quadrants(), parent.depth + 1);
        let first = self.regions.len();
        self.regions
            .extend(quadrants.into_iter().map(|area| Region::empty(area, depth)));
        self.regions[handle].children = Some(first);
        first
    }

    fn child_containing(&self, first: usize, point: Vector) -> Option<usize> {
        (first..first + 4).find(|&child| self.regions[child].area.contains(point))
    }

    /// Approximate repulsion of every indexed body on the body at `slot`
    ///
    /// `point` is that body's position. The result is already scaled by
    /// `time` and points away from the repelling mass.
    pub fn repulsion_at(&self, slot: usize, point: Vector, repulsion: f64, time: f64) -> Vector {
        if self.regions.is_empty() {
            return Vector::ZERO;
        }
        self.query(ROOT, slot, point, repulsion * time)
    }

    fn query(&self, handle: usize, slot: usize, point: Vector, strength: f64) -> Vector {
        let region = &self.regions[handle];
        if region.mass <= 0.0 {
            return Vector::ZERO;
        }

        match region.occupant {
            Some(resident) if resident != slot => {
                point_repulsion(region.center_of_mass, region.mass, point, strength)
            }
            // A leaf owned by the body itself; anything folded into it sits on
            // top of the body and exerts nothing.
            Some(_) => Vector::ZERO,
            None => {
                let distance = region.center_of_mass.distance(point);
                let ratio = region.area.surface().sqrt() / distance;
                if ratio > self.threshold {
                    match region.children {
                        Some(first) => (first..first + 4)
                            .map(|child| self.query(child, slot, point, strength))
                            .sum(),
                        None => Vector::ZERO,
                    }
                } else {
                    point_repulsion(region.center_of_mass, region.mass, point, strength)
                }
            }
        }
    }

    /// Aggregate of the root region, if the tree has been built
    pub fn root(&self) -> Option<RegionSummary> {
        self.regions.first().map(|r| RegionSummary {
            area: r.area,
            mass: r.mass,
            center_of_mass: r.center_of_mass,
        })
    }

    pub fn stats(&self) -> IndexStats {
        self.stats
    }

    /// Number of regions currently in the arena
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Body handles that own a leaf
    pub fn occupants(&self) -> impl Iterator<Item = usize> + '_ {
        self.regions.iter().filter_map(|r| r.occupant)
    }

    /// Check the structural invariants: regions own a body or four children,
    /// never both, and children tile their parent's depth.
    pub fn is_well_formed(&self) -> bool {
        self.regions.iter().all(|r| match (r.occupant, r.children) {
            (Some(_), Some(_)) => false,
            (_, Some(first)) => {
                first + 4 <= self.regions.len()
                    && self.regions[first..first + 4]
                        .iter()
                        .all(|c| c.depth == r.depth + 1)
            }
            _ => true,
        })
    }
}

/// Repulsion exerted by a point mass at `source` on a body at `point`
///
/// `strength` is the repulsion constant already multiplied by the elapsed
/// time. Coincident points (including separations whose square underflows)
/// exert nothing.
#[inline]
pub fn point_repulsion(source: Vector, mass: f64, point: Vector, strength: f64) -> Vector {
    let offset = point - source;
    let distance_squared = offset.length_squared();
    if !(f64::MIN_POSITIVE..=f64::MAX).contains(&distance_squared) {
        return Vector::ZERO;
    }
    let distance = distance_squared.sqrt();
    offset * (strength * mass / (distance_squared * distance))
}

/// Exact pairwise repulsion on the body at `slot`, for reference and testing
pub fn brute_force_repulsion(bodies: &[Body], slot: usize, repulsion: f64, time: f64) -> Vector {
    let point = bodies[slot].position;
    bodies
        .iter()
        .enumerate()
        .filter(|&(other, _)| other != slot)
        .map(|(_, body)| point_repulsion(body.position, body.mass, point, repulsion * time))
        .sum()
}

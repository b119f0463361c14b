//! Plain 2D value types shared by the index, the force model and the integrator
//!
//! Coordinates follow screen conventions: the origin is the top-left corner of
//! the area and `y` grows downwards.

use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Gap left between adjacent sub-regions when an area is split in four
pub const QUADRANT_GAP: f64 = 1.0;

/// Relative padding applied when an area is fitted around a set of points
const FIT_PADDING_FACTOR: f64 = 0.1;

/// A point or displacement in the simulation plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    #[inline]
    pub fn distance(self, other: Vector) -> f64 {
        (self - other).length()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Vector) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vector {
    fn sub_assign(&mut self, rhs: Vector) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(self, rhs: f64) -> Vector {
        Vector::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Vector {
    type Output = Vector;

    fn div(self, rhs: f64) -> Vector {
        Vector::new(self.x / rhs, self.y / rhs)
    }
}

impl Sum for Vector {
    fn sum<I: Iterator<Item = Vector>>(iter: I) -> Vector {
        iter.fold(Vector::ZERO, |acc, v| acc + v)
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.y)
    }
}

/// Axis-aligned rectangle given by its first (top-left) and last (bottom-right) corners
///
/// Both corners are inclusive. An area whose `min` exceeds `max` on an axis
/// contains nothing; such areas appear deep in the quadtree once the quadrant
/// gap eats the whole extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub min: Vector,
    pub max: Vector,
}

impl Default for Area {
    /// The 800x600 area anchored at the origin
    fn default() -> Self {
        Self::from_offset_size(Vector::ZERO, Vector::new(800.0, 600.0))
    }
}

impl Area {
    pub const fn new(min: Vector, max: Vector) -> Self {
        Self { min, max }
    }

    /// Build an area from its top-left corner and its extent
    pub fn from_offset_size(offset: Vector, size: Vector) -> Self {
        Self::new(offset, offset + size)
    }

    /// Padded square that contains every finite point, or `None` for an empty set
    pub fn fit(points: impl IntoIterator<Item = Vector>) -> Option<Self> {
        let mut points = points.into_iter().filter(|p| p.is_finite());
        let first = points.next()?;
        let (mut min, mut max) = (first, first);
        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }

        // Square it up so the size/distance ratio means the same on both
        // axes, then pad by a fraction of the side (at least one unit).
        let center = Vector::new(min.x + (max.x - min.x) / 2.0, min.y + (max.y - min.y) / 2.0);
        let side = (max.x - min.x).max(max.y - min.y);
        let half = side / 2.0 + (side * FIT_PADDING_FACTOR).max(QUADRANT_GAP);
        Some(Self::new(
            Vector::new(center.x - half, center.y - half),
            Vector::new(center.x + half, center.y + half),
        ))
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Vector {
        Vector::new(
            self.min.x + self.width() / 2.0,
            self.min.y + self.height() / 2.0,
        )
    }

    /// Surface (width times height) of the area
    #[inline]
    pub fn surface(&self) -> f64 {
        self.width() * self.height()
    }

    #[inline]
    pub fn contains(&self, point: Vector) -> bool {
        self.min.x <= point.x
            && point.x <= self.max.x
            && self.min.y <= point.y
            && point.y <= self.max.y
    }

    #[inline]
    pub fn contains_x(&self, x: f64) -> bool {
        self.min.x <= x && x <= self.max.x
    }

    #[inline]
    pub fn contains_y(&self, y: f64) -> bool {
        self.min.y <= y && y <= self.max.y
    }

    /// Split into northwest, northeast, southwest and southeast parts
    ///
    /// The eastern and southern parts start [`QUADRANT_GAP`] past the midpoint
    /// so that no two parts share an edge.
    pub fn quadrants(&self) -> [Area; 4] {
        let half = self.center();
        [
            Area::new(self.min, half),
            Area::new(
                Vector::new(half.x + QUADRANT_GAP, self.min.y),
                Vector::new(self.max.x, half.y),
            ),
            Area::new(
                Vector::new(self.min.x, half.y + QUADRANT_GAP),
                Vector::new(half.x, self.max.y),
            ),
            Area::new(
                Vector::new(half.x + QUADRANT_GAP, half.y + QUADRANT_GAP),
                self.max,
            ),
        ]
    }

    /// Uniformly random point inside the area (corners included)
    pub fn random_point<R: Rng>(&self, rng: &mut R) -> Vector {
        Vector::new(
            random_between(rng, self.min.x, self.max.x),
            random_between(rng, self.min.y, self.max.y),
        )
    }
}

fn random_between<R: Rng>(rng: &mut R, low: f64, high: f64) -> f64 {
    if high > low {
        rng.random_range(low..=high)
    } else {
        low
    }
}

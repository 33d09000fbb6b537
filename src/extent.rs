use crate::geometry::Point;

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle covering `[min, min + size]` in continuous coordinates.
///
/// Two extents that share only an edge or a corner are considered disjoint; overlap always means
/// a positive intersection area.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Extent {
    pub min: Point,
    pub size: Point,
}

impl Extent {
    pub fn from_min_and_size(min: Point, size: Point) -> Self {
        Extent { min, size }
    }

    pub fn from_min_and_max(min: Point, max: Point) -> Self {
        Extent {
            min,
            size: max - min,
        }
    }

    pub fn max(&self) -> Point {
        self.min + self.size
    }

    pub fn width(&self) -> i32 {
        self.size.x
    }

    pub fn height(&self) -> i32 {
        self.size.y
    }

    pub fn area(&self) -> i64 {
        i64::from(self.size.x) * i64::from(self.size.y)
    }

    pub fn is_empty(&self) -> bool {
        self.size.x <= 0 || self.size.y <= 0
    }

    /// The integer point nearest the center of the extent.
    pub fn center(&self) -> Point {
        Point::new(self.min.x + self.size.x / 2, self.min.y + self.size.y / 2)
    }

    /// Grows every side by `amount`. A negative `amount` shrinks.
    pub fn radial_grow(&self, amount: i32) -> Self {
        let grow = amount.saturating_mul(2);

        Extent {
            min: Point::new(
                self.min.x.saturating_sub(amount),
                self.min.y.saturating_sub(amount),
            ),
            size: Point::new(
                self.size.x.saturating_add(grow),
                self.size.y.saturating_add(grow),
            ),
        }
    }

    pub fn intersection(&self, other: &Extent) -> Extent {
        let self_max = self.max();
        let other_max = other.max();
        let min = Point::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y));
        let max = Point::new(self_max.x.min(other_max.x), self_max.y.min(other_max.y));

        Extent::from_min_and_max(min, max)
    }

    pub fn intersection_area(&self, other: &Extent) -> i64 {
        let int = self.intersection(other);
        if int.is_empty() {
            0
        } else {
            int.area()
        }
    }

    /// True iff the interiors intersect. Touching along an edge does not count.
    pub fn overlaps(&self, other: &Extent) -> bool {
        !self.intersection(other).is_empty()
    }

    /// True iff `p` is inside or on the boundary.
    pub fn contains(&self, p: &Point) -> bool {
        let max = self.max();

        p.x >= self.min.x && p.x <= max.x && p.y >= self.min.y && p.y <= max.y
    }

    /// True iff `p` is strictly inside, away from the boundary.
    pub fn interior_contains(&self, p: &Point) -> bool {
        let max = self.max();

        p.x > self.min.x && p.x < max.x && p.y > self.min.y && p.y < max.y
    }

    pub fn is_subset(&self, other: &Extent) -> bool {
        other.contains(&self.min) && other.contains(&self.max())
    }

    /// Does the open interior of this extent meet the closed axis-aligned segment `a -> b`?
    ///
    /// `a` and `b` must share an x or y coordinate.
    pub fn interior_meets_segment(&self, a: &Point, b: &Point) -> bool {
        debug_assert!(a.x == b.x || a.y == b.y);

        let max = self.max();
        let (lo_x, hi_x) = (a.x.min(b.x), a.x.max(b.x));
        let (lo_y, hi_y) = (a.y.min(b.y), a.y.max(b.y));

        hi_x > self.min.x && lo_x < max.x && hi_y > self.min.y && lo_y < max.y
    }
}

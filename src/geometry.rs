use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A point on the integer plane. Anchor points, triangle vertices and room corners all live here.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    pub fn distance_squared(&self, other: &Point) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);

        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.distance_squared(other) as f64).sqrt()
    }

    pub fn to_f64(&self) -> [f64; 2] {
        [f64::from(self.x), f64::from(self.y)]
    }
}

impl From<[i32; 2]> for Point {
    fn from([x, y]: [i32; 2]) -> Self {
        Point { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Point { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Orientation {
    CounterClockwise,
    Clockwise,
    Collinear,
}

/// Twice the signed area of triangle `abc`. Exact for any `i32` input.
pub fn signed_area2(a: &Point, b: &Point, c: &Point) -> i128 {
    let (ax, ay) = (i128::from(a.x), i128::from(a.y));
    let (bx, by) = (i128::from(b.x), i128::from(b.y));
    let (cx, cy) = (i128::from(c.x), i128::from(c.y));

    (bx - ax) * (cy - ay) - (by - ay) * (cx - ax)
}

pub fn orientation(a: &Point, b: &Point, c: &Point) -> Orientation {
    let area = signed_area2(a, b, c);
    if area > 0 {
        Orientation::CounterClockwise
    } else if area < 0 {
        Orientation::Clockwise
    } else {
        Orientation::Collinear
    }
}

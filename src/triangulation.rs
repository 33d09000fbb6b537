//! Delaunay triangulation by Bowyer-Watson incremental insertion.
//!
//! Triangles live in an arena and are tombstoned when a new point lands inside their
//! circumcircle, so the cavity can be re-triangulated without juggling references into a
//! shrinking list.

use crate::{
    error::{GenerationError, Result},
    geometry::{orientation, signed_area2, Orientation, Point},
    graph::Edge,
    symmetric_map::SymmetricMap,
};

use fnv::FnvHashSet;
use serde::{Deserialize, Serialize};

/// Relative slack on the in-circle test. Points this close to a circumcircle count as "on" it,
/// which keeps cocircular inputs from creating overlapping triangles.
const CIRCUMCIRCLE_EPSILON: f64 = 1e-9;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Triangle {
    /// Counter-clockwise.
    pub vertices: [Point; 3],
    pub circumcenter: [f64; 2],
    pub circumradius: f64,
}

impl Triangle {
    /// Returns `None` for collinear vertices; a zero-area triangle has no circumcircle.
    pub fn new(a: Point, b: Point, c: Point) -> Option<Self> {
        let vertices = match orientation(&a, &b, &c) {
            Orientation::CounterClockwise => [a, b, c],
            Orientation::Clockwise => [a, c, b],
            Orientation::Collinear => return None,
        };

        // Work relative to the first vertex to keep the products small for huge super-triangles.
        let [ax, ay] = a.to_f64();
        let [bx, by] = b.to_f64();
        let [cx, cy] = c.to_f64();
        let (bx, by) = (bx - ax, by - ay);
        let (cx, cy) = (cx - ax, cy - ay);

        let d = 2.0 * (bx * cy - by * cx);
        let b_sq = bx * bx + by * by;
        let c_sq = cx * cx + cy * cy;
        let ux = (cy * b_sq - by * c_sq) / d;
        let uy = (bx * c_sq - cx * b_sq) / d;

        Some(Triangle {
            vertices,
            circumcenter: [ax + ux, ay + uy],
            circumradius: (ux * ux + uy * uy).sqrt(),
        })
    }

    /// True iff `p` lies strictly inside the circumcircle.
    pub fn circumcircle_contains(&self, p: &Point) -> bool {
        let [px, py] = p.to_f64();
        let dx = px - self.circumcenter[0];
        let dy = py - self.circumcenter[1];
        let r_sq = self.circumradius * self.circumradius;

        dx * dx + dy * dy < r_sq * (1.0 - CIRCUMCIRCLE_EPSILON)
    }

    /// True iff `p` is inside or on the boundary of the triangle.
    pub fn contains(&self, p: &Point) -> bool {
        let [a, b, c] = &self.vertices;

        signed_area2(a, b, p) >= 0 && signed_area2(b, c, p) >= 0 && signed_area2(c, a, p) >= 0
    }

    pub fn has_vertex(&self, p: &Point) -> bool {
        self.vertices.contains(p)
    }

    pub fn edges(&self) -> [Edge; 3] {
        let [a, b, c] = self.vertices;

        [Edge::new(a, b), Edge::new(b, c), Edge::new(c, a)]
    }

    /// Twice the (positive) area.
    pub fn area2(&self) -> i128 {
        let [a, b, c] = &self.vertices;

        signed_area2(a, b, c)
    }
}

/// The synthetic triangle that bootstraps Bowyer-Watson. Never part of the output.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SuperTriangle {
    pub vertices: [Point; 3],
}

impl SuperTriangle {
    /// `(-W², -H²), (W², 0), (0, H²)`, which strictly encloses `[0, W) x [0, H)` for any
    /// `W, H >= 2`.
    pub fn for_bounds(width: i32, height: i32) -> Result<Self> {
        let w_sq = width.checked_mul(width);
        let h_sq = height.checked_mul(height);
        let (w_sq, h_sq) = match (w_sq, h_sq) {
            (Some(w), Some(h)) => (w, h),
            _ => {
                return Err(GenerationError::InvalidParameters(format!(
                    "bounds {} x {} are too large for the super-triangle",
                    width, height
                )))
            }
        };

        Ok(SuperTriangle {
            vertices: [
                Point::new(-w_sq, -h_sq),
                Point::new(w_sq, 0),
                Point::new(0, h_sq),
            ],
        })
    }

    /// Strict containment; a point on a super-triangle edge would leave a sliver triangle that
    /// survives the final cleanup.
    pub fn strictly_contains(&self, p: &Point) -> bool {
        let [a, b, c] = &self.vertices;

        signed_area2(a, b, p) > 0 && signed_area2(b, c, p) > 0 && signed_area2(c, a, p) > 0
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Triangulation {
    pub triangles: Vec<Triangle>,
}

impl Triangulation {
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// True iff no point of `points` lies strictly inside any circumcircle.
    pub fn is_delaunay(&self, points: &[Point]) -> bool {
        self.triangles.iter().all(|t| {
            points
                .iter()
                .all(|p| t.has_vertex(p) || !t.circumcircle_contains(p))
        })
    }
}

struct ArenaTriangle {
    vertices: [usize; 3],
    triangle: Triangle,
    removed: bool,
}

struct TriangleArena {
    vertices: Vec<Point>,
    slots: Vec<ArenaTriangle>,
}

impl TriangleArena {
    fn add(&mut self, vertices: [usize; 3]) -> bool {
        let [a, b, c] = vertices;
        match Triangle::new(self.vertices[a], self.vertices[b], self.vertices[c]) {
            Some(triangle) => {
                self.slots.push(ArenaTriangle {
                    vertices,
                    triangle,
                    removed: false,
                });

                true
            }
            None => false,
        }
    }

    fn live(&self) -> impl Iterator<Item = (usize, &ArenaTriangle)> {
        self.slots.iter().enumerate().filter(|(_, t)| !t.removed)
    }

    /// Removes every triangle whose circumcircle contains `vertex` and returns the boundary of
    /// the hole, in a deterministic order.
    fn carve_cavity(&mut self, vertex: usize) -> Vec<(usize, usize)> {
        let p = self.vertices[vertex];
        let bad: Vec<usize> = self
            .live()
            .filter(|(_, t)| t.triangle.circumcircle_contains(&p))
            .map(|(i, _)| i)
            .collect();

        // An edge shared by two bad triangles is interior to the hole.
        let mut edge_uses = SymmetricMap::<usize, u32>::new();
        for &i in bad.iter() {
            let [a, b, c] = self.slots[i].vertices;
            for &(u, v) in [(a, b), (b, c), (c, a)].iter() {
                *edge_uses.entry_or_default(u, v) += 1;
            }
        }

        let mut boundary = Vec::new();
        for &i in bad.iter() {
            let [a, b, c] = self.slots[i].vertices;
            for &(u, v) in [(a, b), (b, c), (c, a)].iter() {
                if edge_uses.get(u, v) == Some(&1) {
                    boundary.push((u, v));
                }
            }
            self.slots[i].removed = true;
        }
        log::trace!(
            "Inserting {:?} removed {} triangles, hole boundary has {} edges",
            p,
            bad.len(),
            boundary.len()
        );

        boundary
    }
}

/// Computes the Delaunay triangulation of `points` with Bowyer-Watson.
///
/// `points` must be distinct and strictly inside `super_triangle`; both are checked up front
/// since either violation silently corrupts the result. Triangles touching a super-triangle
/// vertex are dropped, as are zero-area triangles, so collinear inputs yield no triangles.
pub fn triangulate(points: &[Point], super_triangle: &SuperTriangle) -> Result<Triangulation> {
    let mut seen = FnvHashSet::default();
    for p in points.iter() {
        if !seen.insert(*p) {
            return Err(GenerationError::Triangulation(format!(
                "duplicate point {:?}",
                p
            )));
        }
        if !super_triangle.strictly_contains(p) {
            return Err(GenerationError::Triangulation(format!(
                "point {:?} is outside the super-triangle {:?}",
                p, super_triangle.vertices
            )));
        }
    }

    let num_points = points.len();
    let mut vertices = points.to_vec();
    vertices.extend_from_slice(&super_triangle.vertices);
    let mut arena = TriangleArena {
        vertices,
        slots: Vec::new(),
    };
    if !arena.add([num_points, num_points + 1, num_points + 2]) {
        return Err(GenerationError::Triangulation(
            "super-triangle is degenerate".to_string(),
        ));
    }

    for vertex in 0..num_points {
        let boundary = arena.carve_cavity(vertex);
        if boundary.is_empty() {
            return Err(GenerationError::Triangulation(format!(
                "no cavity found for point {:?}",
                arena.vertices[vertex]
            )));
        }

        for (u, v) in boundary.into_iter() {
            if !arena.add([vertex, u, v]) {
                log::trace!(
                    "Skipped degenerate triangle {:?}",
                    [arena.vertices[vertex], arena.vertices[u], arena.vertices[v]]
                );
            }
        }
    }

    let triangles: Vec<Triangle> = arena
        .live()
        .filter(|(_, t)| t.vertices.iter().all(|&v| v < num_points))
        .map(|(_, t)| t.triangle.clone())
        .collect();
    log::debug!(
        "Triangulated {} points into {} triangles ({} created in total)",
        num_points,
        triangles.len(),
        arena.slots.len()
    );

    Ok(Triangulation { triangles })
}

use crate::{
    error::{GenerationError, Result},
    extent::Extent,
    geometry::Point,
    graph::{DungeonGraph, Edge},
    room::Room,
    Tile, TileEncoder,
};

use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};

/// An orthogonal corridor between two rooms. `path` runs from a point on the boundary of
/// `rooms.0` to a point on the boundary of `rooms.1`, with at most two bends.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Hallway {
    pub edge: Edge,
    /// Indices into the room list.
    pub rooms: (usize, usize),
    pub path: Vec<Point>,
}

impl Hallway {
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.path.windows(2).map(|w| (w[0], w[1]))
    }

    pub fn is_straight(&self) -> bool {
        self.path.len() <= 2
    }

    /// The corners between the two ends.
    pub fn bends(&self) -> &[Point] {
        if self.path.len() < 2 {
            return &[];
        }

        &self.path[1..self.path.len() - 1]
    }

    pub fn length(&self) -> i64 {
        self.segments()
            .map(|(a, b)| i64::from((a.x - b.x).abs() + (a.y - b.y).abs()))
            .sum()
    }
}

/// Integers in `[lo, hi]`, nearest the middle first. Strictly interior values come before the
/// two ends so corridors don't hug walls.
fn middle_out(lo: i32, hi: i32) -> Vec<i32> {
    let mid = lo + (hi - lo) / 2;
    let mut values = vec![mid];
    for step in 1..=(hi - lo) {
        if mid + step < hi {
            values.push(mid + step);
        }
        if mid - step > lo {
            values.push(mid - step);
        }
    }
    for &end in [lo, hi].iter() {
        if !values.contains(&end) {
            values.push(end);
        }
    }

    values
}

fn overlap(lo1: i32, hi1: i32, lo2: i32, hi2: i32) -> Option<(i32, i32)> {
    let lo = lo1.max(lo2);
    let hi = hi1.min(hi2);
    if lo <= hi {
        Some((lo, hi))
    } else {
        None
    }
}

/// The side of `from` facing `to` along one axis, and the side of `to` facing `from`. Assumes the
/// ranges `[from_lo, from_hi]` and `[to_lo, to_hi]` are disjoint.
fn facing_sides(from_lo: i32, from_hi: i32, to_lo: i32, to_hi: i32) -> (i32, i32) {
    if from_hi <= to_lo {
        (from_hi, to_lo)
    } else {
        (from_lo, to_hi)
    }
}

fn flip(p: Point) -> Point {
    Point::new(p.y, p.x)
}

fn flip_extent(e: &Extent) -> Extent {
    Extent::from_min_and_size(flip(e.min), flip(e.size))
}

/// The side of `[lo, hi]` a corridor at `channel` leaves from, if the channel is outside.
fn exit_side(lo: i32, hi: i32, channel: i32) -> Option<i32> {
    if channel >= hi {
        Some(hi)
    } else if channel <= lo {
        Some(lo)
    } else {
        None
    }
}

struct Router<'a> {
    rooms: &'a [Room],
    from: usize,
    to: usize,
}

impl<'a> Router<'a> {
    fn foreign_rooms(&self) -> impl Iterator<Item = &Extent> + '_ {
        let (from, to) = (self.from, self.to);
        self.rooms
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != from && *i != to)
            .map(|(_, r)| &r.extent)
    }

    fn is_clear(&self, path: &[Point]) -> bool {
        path.windows(2).all(|w| {
            self.foreign_rooms()
                .all(|r| !r.interior_meets_segment(&w[0], &w[1]))
        })
    }

    /// Single segments, when the rooms share a horizontal or vertical band.
    fn straight(&self, a: &Extent, b: &Extent) -> Option<Vec<Vec<Point>>> {
        let (a_max, b_max) = (a.max(), b.max());
        let shared_y = overlap(a.min.y, a_max.y, b.min.y, b_max.y);
        let shared_x = overlap(a.min.x, a_max.x, b.min.x, b_max.x);

        let candidates = match (shared_x, shared_y) {
            // The rooms touch. The hallway is just the contact point.
            (Some((x_lo, x_hi)), Some((y_lo, y_hi))) => {
                let p = Point::new(x_lo + (x_hi - x_lo) / 2, y_lo + (y_hi - y_lo) / 2);
                vec![vec![p, p]]
            }
            (None, Some((lo, hi))) => {
                let (x_from, x_to) = facing_sides(a.min.x, a_max.x, b.min.x, b_max.x);
                middle_out(lo, hi)
                    .into_iter()
                    .map(|y| vec![Point::new(x_from, y), Point::new(x_to, y)])
                    .collect()
            }
            (Some((lo, hi)), None) => {
                let (y_from, y_to) = facing_sides(a.min.y, a_max.y, b.min.y, b_max.y);
                middle_out(lo, hi)
                    .into_iter()
                    .map(|x| vec![Point::new(x, y_from), Point::new(x, y_to)])
                    .collect()
            }
            (None, None) => return None,
        };

        Some(candidates)
    }

    /// One horizontal and one vertical segment. The bend is outside both endpoint rooms by
    /// construction, since the rooms share neither a horizontal nor a vertical band.
    fn l_shaped(&self, a: &Extent, b: &Extent) -> Vec<Vec<Point>> {
        let (a_max, b_max) = (a.max(), b.max());
        let (ax_side, bx_side) = facing_sides(a.min.x, a_max.x, b.min.x, b_max.x);
        let (ay_side, by_side) = facing_sides(a.min.y, a_max.y, b.min.y, b_max.y);

        let a_rows = middle_out(a.min.y, a_max.y);
        let a_cols = middle_out(a.min.x, a_max.x);
        let b_rows = middle_out(b.min.y, b_max.y);
        let b_cols = middle_out(b.min.x, b_max.x);

        let mut candidates = Vec::new();
        for i in 0..a_rows.len().max(a_cols.len()) {
            for j in 0..b_rows.len().max(b_cols.len()) {
                // Leave `a` horizontally, enter `b` vertically.
                if let (Some(&y), Some(&x)) = (a_rows.get(i), b_cols.get(j)) {
                    candidates.push(vec![
                        Point::new(ax_side, y),
                        Point::new(x, y),
                        Point::new(x, by_side),
                    ]);
                }
                // Leave `a` vertically, enter `b` horizontally.
                if let (Some(&x), Some(&y)) = (a_cols.get(i), b_rows.get(j)) {
                    candidates.push(vec![
                        Point::new(x, ay_side),
                        Point::new(x, y),
                        Point::new(bx_side, y),
                    ]);
                }
            }
        }

        candidates
    }

    /// Three segments: out of `a` horizontally, along a vertical channel clear of both rooms, and
    /// horizontally into `b`. Channels hug room walls or run between the two rooms, and never
    /// leave the box around all rooms. Vertical-first detours are the same search on flipped
    /// coordinates.
    fn detour(&self, a: &Extent, b: &Extent) -> Option<Vec<Point>> {
        for &flipped in [false, true].iter() {
            let frame = |e: &Extent| if flipped { flip_extent(e) } else { *e };
            let (a, b) = (frame(a), frame(b));
            let rooms: Vec<Extent> = self.rooms.iter().map(|r| frame(&r.extent)).collect();
            let (a_max, b_max) = (a.max(), b.max());

            let (lo, hi) = rooms.iter().fold((a.min.x, a_max.x), |(lo, hi), r| {
                (lo.min(r.min.x), hi.max(r.max().x))
            });
            let mid = (a.center().x + b.center().x) / 2;
            let mut channels: Vec<i32> = rooms
                .iter()
                .flat_map(|r| {
                    let max = r.max().x;
                    vec![r.min.x - 1, r.min.x, max, max + 1]
                })
                .chain(std::iter::once(mid))
                .filter(|c| lo <= *c && *c <= hi)
                .collect();
            channels.sort_by_key(|c| ((c - mid).abs(), *c));
            channels.dedup();

            let a_rows = middle_out(a.min.y, a_max.y);
            let b_rows = middle_out(b.min.y, b_max.y);
            for &x in channels.iter() {
                let (ax, bx) = match (
                    exit_side(a.min.x, a_max.x, x),
                    exit_side(b.min.x, b_max.x, x),
                ) {
                    (Some(ax), Some(bx)) => (ax, bx),
                    _ => continue,
                };
                for &ya in a_rows.iter() {
                    for &yb in b_rows.iter() {
                        let path = [
                            Point::new(ax, ya),
                            Point::new(x, ya),
                            Point::new(x, yb),
                            Point::new(bx, yb),
                        ];
                        // Own rooms included: the channel must not cut back through them.
                        let clear = path.windows(2).all(|w| {
                            rooms.iter().all(|r| !r.interior_meets_segment(&w[0], &w[1]))
                        });
                        if clear {
                            let path = path.iter().map(|p| if flipped { flip(*p) } else { *p });
                            return Some(path.collect());
                        }
                    }
                }
            }
        }

        None
    }

    fn route(&self) -> Result<Vec<Point>> {
        let a = &self.rooms[self.from].extent;
        let b = &self.rooms[self.to].extent;

        let direct = match self.straight(a, b) {
            Some(candidates) => candidates,
            None => self.l_shaped(a, b),
        };
        if let Some(path) = direct.into_iter().find(|path| self.is_clear(path)) {
            return Ok(path);
        }

        match self.detour(a, b) {
            Some(path) => {
                log::trace!("Detoured hallway {:?}", path);
                Ok(path)
            }
            None => Err(GenerationError::Unroutable {
                from: self.rooms[self.from].anchor,
                to: self.rooms[self.to].anchor,
            }),
        }
    }
}

/// Connects the rooms at both ends of every graph edge with an orthogonal hallway.
///
/// A hallway is straight when the rooms share a band, an L when they don't, and a three-segment
/// detour when every such route is blocked. It never enters the interior of a room other than its
/// own two; when nothing avoids them all the result is `Unroutable`. Hallways may cross each
/// other.
pub fn route_hallways(graph: &DungeonGraph, rooms: &[Room]) -> Result<Vec<Hallway>> {
    let room_at: FnvHashMap<Point, usize> = rooms
        .iter()
        .enumerate()
        .map(|(i, r)| (r.anchor, i))
        .collect();
    let lookup = |p: &Point| {
        room_at.get(p).copied().ok_or_else(|| {
            GenerationError::InvalidParameters(format!("no room is anchored at {:?}", p))
        })
    };

    let mut hallways = Vec::with_capacity(graph.edge_count());
    for edge in graph.edges() {
        let router = Router {
            rooms,
            from: lookup(&edge.a)?,
            to: lookup(&edge.b)?,
        };
        let path = router.route()?;
        hallways.push(Hallway {
            edge,
            rooms: (router.from, router.to),
            path,
        });
    }
    log::debug!(
        "Routed {} hallways, {} straight",
        hallways.len(),
        hallways.iter().filter(|h| h.is_straight()).count()
    );

    Ok(hallways)
}

pub fn fill_map_with_hallways(hallways: &[Hallway], encoder: &mut impl TileEncoder) {
    for h in hallways.iter() {
        for (a, b) in h.segments() {
            for y in a.y.min(b.y)..=a.y.max(b.y) {
                for x in a.x.min(b.x)..=a.x.max(b.x) {
                    encoder.encode_tile(&Point::new(x, y), Tile::Corridor);
                }
            }
        }
    }
}

/// Punches a door through the wall cell where each hallway meets its rooms.
pub fn fill_map_with_doors(hallways: &[Hallway], rooms: &[Room], encoder: &mut impl TileEncoder) {
    let door_cell = |p: &Point, room: &Room| {
        let max = room.extent.max();
        Point::new(
            p.x.max(room.extent.min.x).min(max.x - 1),
            p.y.max(room.extent.min.y).min(max.y - 1),
        )
    };

    for h in hallways.iter() {
        let (start, end) = match (h.path.first(), h.path.last()) {
            (Some(s), Some(e)) => (s, e),
            _ => continue,
        };
        encoder.encode_tile(&door_cell(start, &rooms[h.rooms.0]), Tile::Door);
        encoder.encode_tile(&door_cell(end, &rooms[h.rooms.1]), Tile::Door);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(x: i32, y: i32, w: i32, h: i32) -> Room {
        let extent = Extent::from_min_and_size(Point::new(x, y), Point::new(w, h));
        Room {
            anchor: extent.center(),
            extent,
        }
    }

    fn route(rooms: &[Room], from: usize, to: usize) -> Hallway {
        let edge = Edge::new(rooms[from].anchor, rooms[to].anchor);
        let graph = DungeonGraph::from_edges([edge].iter());
        let mut hallways = route_hallways(&graph, rooms).unwrap();
        assert_eq!(hallways.len(), 1);

        hallways.remove(0)
    }

    fn assert_endpoints_on_rooms(h: &Hallway, rooms: &[Room]) {
        let (i, j) = h.rooms;
        let start = h.path.first().unwrap();
        let end = h.path.last().unwrap();
        assert!(rooms[i].extent.contains(start) && !rooms[i].extent.interior_contains(start));
        assert!(rooms[j].extent.contains(end) && !rooms[j].extent.interior_contains(end));
        for (a, b) in h.segments() {
            assert!(a.x == b.x || a.y == b.y, "{:?} -> {:?} is not orthogonal", a, b);
        }
    }

    #[test]
    fn test_middle_out() {
        assert_eq!(middle_out(0, 4), vec![2, 3, 1, 0, 4]);
        assert_eq!(middle_out(3, 3), vec![3]);
        assert_eq!(middle_out(0, 1), vec![0, 1]);
    }

    #[test]
    fn test_horizontally_aligned_rooms_get_one_horizontal_segment() {
        let rooms = [room(0, 100, 40, 40), room(200, 110, 30, 30)];
        let h = route(&rooms, 0, 1);

        assert!(h.is_straight());
        assert_eq!(h.path.len(), 2);
        assert_eq!(h.path[0].y, h.path[1].y);
        assert_eq!(h.path[0].x, 40);
        assert_eq!(h.path[1].x, 200);
        assert_endpoints_on_rooms(&h, &rooms);
    }

    #[test]
    fn test_vertically_aligned_rooms_get_one_vertical_segment() {
        let rooms = [room(100, 300, 40, 40), room(110, 0, 30, 30)];
        let h = route(&rooms, 0, 1);

        assert!(h.is_straight());
        assert_eq!(h.path[0].x, h.path[1].x);
        assert_eq!(h.path[0].y, 300);
        assert_eq!(h.path[1].y, 30);
        assert_endpoints_on_rooms(&h, &rooms);
    }

    #[test]
    fn test_diagonal_rooms_get_an_l() {
        let rooms = [room(0, 0, 20, 20), room(100, 100, 20, 20)];
        let h = route(&rooms, 0, 1);

        assert_eq!(h.bends().len(), 1);
        let bend = h.bends()[0];
        assert!(!rooms[0].extent.interior_contains(&bend));
        assert!(!rooms[1].extent.interior_contains(&bend));
        assert_endpoints_on_rooms(&h, &rooms);
        assert_eq!(h.length(), 90 + 90);
    }

    #[test]
    fn test_l_bends_around_a_blocking_room() {
        // The room in the top right corner sits where the first horizontal-then-vertical bend
        // would go.
        let rooms = [
            room(0, 0, 20, 20),
            room(100, 100, 20, 20),
            room(90, 0, 40, 40),
        ];
        let h = route(&rooms, 0, 1);

        assert_eq!(h.bends().len(), 1);
        assert!(!rooms[2].extent.interior_contains(&h.bends()[0]));
        for (a, b) in h.segments() {
            assert!(!rooms[2].extent.interior_meets_segment(&a, &b));
        }
        assert_endpoints_on_rooms(&h, &rooms);
    }

    #[test]
    fn test_straight_hallway_slides_past_a_blocking_room() {
        let rooms = [
            room(0, 100, 40, 40),
            room(200, 100, 40, 40),
            room(100, 105, 20, 20),
        ];
        let h = route(&rooms, 0, 1);

        assert!(h.is_straight());
        assert!(!rooms[2].extent.interior_meets_segment(&h.path[0], &h.path[1]));
    }

    #[test]
    fn test_blocked_band_detours_around_the_blocking_room() {
        // The middle room covers the whole band the two outer rooms share.
        let rooms = [
            room(0, 100, 40, 40),
            room(200, 100, 40, 40),
            room(90, 60, 40, 120),
        ];
        let h = route(&rooms, 0, 1);

        assert_eq!(
            h.path,
            vec![
                Point::new(20, 100),
                Point::new(20, 60),
                Point::new(220, 60),
                Point::new(220, 100),
            ]
        );
        assert_eq!(h.bends().len(), 2);
        assert_eq!(h.length(), 40 + 200 + 40);
        for (a, b) in h.segments() {
            assert!(!rooms[2].extent.interior_meets_segment(&a, &b));
        }
        assert_endpoints_on_rooms(&h, &rooms);
    }

    #[test]
    fn test_long_straight_hallway_avoids_a_room_in_its_band() {
        // Two rooms far apart in the same column, with a wider room across all of it.
        let rooms = [
            room(40, 20, 40, 28),
            room(45, 645, 30, 30),
            room(30, 499, 60, 38),
        ];
        let h = route(&rooms, 0, 1);

        for (a, b) in h.segments() {
            assert!(!rooms[2].extent.interior_meets_segment(&a, &b));
        }
        assert_eq!(h.bends().len(), 2);
        assert_endpoints_on_rooms(&h, &rooms);
    }

    #[test]
    fn test_enclosed_rooms_are_unroutable() {
        // Every route starts inside the third room.
        let rooms = [
            room(20, 20, 10, 10),
            room(60, 20, 10, 10),
            room(0, 0, 100, 100),
        ];
        let edge = Edge::new(rooms[0].anchor, rooms[1].anchor);
        let graph = DungeonGraph::from_edges([edge].iter());

        assert!(matches!(
            route_hallways(&graph, &rooms),
            Err(GenerationError::Unroutable { .. })
        ));
    }

    #[test]
    fn test_touching_rooms_get_an_empty_hallway() {
        let rooms = [room(0, 0, 20, 20), room(20, 5, 20, 20)];
        let h = route(&rooms, 0, 1);

        assert!(h.is_straight());
        assert_eq!(h.length(), 0);
    }

    #[test]
    fn test_missing_room_is_an_error() {
        let rooms = [room(0, 0, 20, 20)];
        let edge = Edge::new(rooms[0].anchor, Point::new(90, 90));
        let graph = DungeonGraph::from_edges([edge].iter());

        assert!(matches!(
            route_hallways(&graph, &rooms),
            Err(GenerationError::InvalidParameters(_))
        ));
    }
}

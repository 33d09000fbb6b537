use crate::{
    error::{GenerationError, PlacementStage, Result},
    extent::Extent,
    geometry::Point,
    sampling::{NormalDistSpec, PlaneNormalDist},
    Tile, TileEncoder,
};

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Room {
    /// The sampled point this room was placed around. Always inside `extent`.
    pub anchor: Point,
    pub extent: Extent,
}

impl Room {
    pub fn center(&self) -> Point {
        self.extent.center()
    }

    pub fn overlaps(&self, other: &Room) -> bool {
        self.extent.overlaps(&other.extent)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct RoomSpec {
    /// Inclusive.
    pub width: (i32, i32),
    /// Inclusive.
    pub height: (i32, i32),
    /// Minimum clearance between rooms. Zero lets rooms share a wall.
    pub gap: i32,
    /// Offset of the room center from its anchor.
    pub jitter: NormalDistSpec,
    /// Attempts per room before giving up.
    pub max_retries: usize,
}

impl Default for RoomSpec {
    fn default() -> Self {
        RoomSpec {
            width: (16, 48),
            height: (16, 48),
            gap: 4,
            jitter: NormalDistSpec {
                mean: 0.0,
                std_dev: 6.0,
            },
            max_retries: 200,
        }
    }
}

impl RoomSpec {
    pub fn validate(&self) -> Result<()> {
        let (w_min, w_max) = self.width;
        let (h_min, h_max) = self.height;
        if w_min < 1 || h_min < 1 || w_min > w_max || h_min > h_max {
            return Err(GenerationError::InvalidParameters(format!(
                "bad room size ranges width = {:?}, height = {:?}",
                self.width, self.height
            )));
        }
        if self.gap < 0 {
            return Err(GenerationError::InvalidParameters(format!(
                "room gap must be non-negative (got {})",
                self.gap
            )));
        }
        self.jitter.make()?;

        Ok(())
    }
}

/// One axis of a room placement: the room covers `[start, start + len]`, contains `anchor`, and
/// stays inside `[0, bound]`. `offset` nudges the room away from being centered on the anchor.
fn place_span(anchor: i32, len: i32, offset: i32, bound: i32) -> Option<i32> {
    let lo = anchor.saturating_sub(len).max(0);
    let hi = anchor.min(bound.saturating_sub(len));
    if lo > hi {
        return None;
    }

    Some(
        anchor
            .saturating_sub(len / 2)
            .saturating_add(offset)
            .max(lo)
            .min(hi),
    )
}

/// Places one room around each anchor, in order, rejecting candidates that overlap an earlier
/// room (grown by `spec.gap`) or leave `bounds`.
///
/// Fails with `InsufficientSpace` as soon as any anchor uses up `spec.max_retries`. No partial
/// room set is returned.
pub fn place_rooms(
    anchors: &[Point],
    bounds: &Extent,
    spec: &RoomSpec,
    rng: &mut impl Rng,
) -> Result<Vec<Room>> {
    spec.validate()?;

    let width_dist = Uniform::new_inclusive(spec.width.0, spec.width.1);
    let height_dist = Uniform::new_inclusive(spec.height.0, spec.height.1);
    let jitter = spec.jitter.make()?;
    let jitter_dist = PlaneNormalDist {
        x: jitter,
        y: jitter,
    };
    // Any gap this wide already keeps a second room out of the bounds entirely.
    let gap = spec.gap.min(bounds.width().max(bounds.height()));

    let mut rooms: Vec<Room> = Vec::with_capacity(anchors.len());
    for (i, anchor) in anchors.iter().enumerate() {
        let local = *anchor - bounds.min;
        let mut placed = None;
        for attempt in 0..spec.max_retries {
            let size = Point::new(width_dist.sample(rng), height_dist.sample(rng));
            let offset = jitter_dist.sample(rng);

            let x = place_span(local.x, size.x, offset.x, bounds.width());
            let y = place_span(local.y, size.y, offset.y, bounds.height());
            let (x, y) = match (x, y) {
                (Some(x), Some(y)) => (x, y),
                _ => continue,
            };

            let candidate = Room {
                anchor: *anchor,
                extent: Extent::from_min_and_size(bounds.min + Point::new(x, y), size),
            };
            let padded = candidate.extent.radial_grow(gap);
            if rooms.iter().all(|r| !padded.overlaps(&r.extent)) {
                log::trace!("Placed room {} after {} attempts", i, attempt + 1);
                placed = Some(candidate);
                break;
            }
        }

        match placed {
            Some(room) => rooms.push(room),
            None => {
                log::debug!("Could not place a room around {:?}", anchor);
                return Err(GenerationError::InsufficientSpace {
                    stage: PlacementStage::Rooms,
                    requested: anchors.len(),
                    placed: rooms.len(),
                });
            }
        }
    }
    log::debug!("Placed {} rooms", rooms.len());

    Ok(rooms)
}

/// Room outlines become walls and their insides floor.
pub fn fill_map_with_rooms(rooms: &[Room], encoder: &mut impl TileEncoder) {
    for r in rooms.iter() {
        let min = r.extent.min;
        let max = r.extent.max();
        for y in min.y..max.y {
            for x in min.x..max.x {
                let on_wall = x == min.x || y == min.y || x == max.x - 1 || y == max.y - 1;
                let tile = if on_wall { Tile::Wall } else { Tile::Floor };
                encoder.encode_tile(&Point::new(x, y), tile);
            }
        }
    }
}

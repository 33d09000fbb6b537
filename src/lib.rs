//! Procedural dungeon layouts from a random point set.
//!
//! Anchor points are triangulated (Bowyer-Watson), reduced to a minimum spanning tree (Prim) with
//! a few edges added back for loops, and then dressed with non-overlapping rooms and orthogonal
//! hallways. See [`map_types::dungeon::generate`] for the whole pipeline.

pub mod error;
pub mod extent;
pub mod geometry;
pub mod graph;
pub mod hallway;
pub mod map_types;
pub mod room;
pub mod sampling;
pub mod spanning_tree;
pub mod summary;
pub mod triangulation;

mod symmetric_map;

pub use error::{GenerationError, PlacementStage, Result};
pub use geometry::Point;
pub use map_types::dungeon::{generate, DungeonLayout, DungeonSpec};

use serde::{Deserialize, Serialize};

/// Implement this to let the layout rasterize itself into your tile map.
pub trait TileEncoder {
    fn encode_tile(&mut self, point: &Point, tile: Tile);
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Tile {
    Empty,
    Floor,
    Wall,
    Door,
    Corridor,
}

impl Default for Tile {
    fn default() -> Self {
        Tile::Empty
    }
}

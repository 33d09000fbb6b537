pub mod dungeon;
pub mod tile_grid;

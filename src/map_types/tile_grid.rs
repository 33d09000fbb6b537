use crate::{geometry::Point, Tile, TileEncoder};

/// A dense row-major tile map covering `[0, width) x [0, height)`. Writes outside are dropped.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TileGrid {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
}

impl TileGrid {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);

        TileGrid {
            width,
            height,
            tiles: vec![Tile::Empty; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    fn index(&self, p: &Point) -> Option<usize> {
        if p.x < 0 || p.y < 0 || p.x >= self.width || p.y >= self.height {
            return None;
        }

        Some(p.y as usize * self.width as usize + p.x as usize)
    }

    pub fn get(&self, p: &Point) -> Option<Tile> {
        self.index(p).map(|i| self.tiles[i])
    }

    pub fn count(&self, tile: Tile) -> usize {
        self.tiles.iter().filter(|t| **t == tile).count()
    }

    /// One line per row, top row first.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(self.tiles.len() + self.height as usize);
        for row in self.tiles.chunks(self.width.max(1) as usize) {
            out.extend(row.iter().map(|t| match t {
                Tile::Empty => ' ',
                Tile::Floor => '.',
                Tile::Wall => '#',
                Tile::Door => '+',
                Tile::Corridor => ':',
            }));
            out.push('\n');
        }

        out
    }
}

impl TileEncoder for TileGrid {
    fn encode_tile(&mut self, point: &Point, tile: Tile) {
        if let Some(i) = self.index(point) {
            self.tiles[i] = tile;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        extent::Extent,
        graph::{DungeonGraph, Edge},
        hallway::{fill_map_with_doors, fill_map_with_hallways, route_hallways},
        room::{fill_map_with_rooms, Room},
    };

    #[test]
    fn test_out_of_bounds_writes_are_dropped() {
        let mut grid = TileGrid::new(4, 3);
        grid.encode_tile(&Point::new(1, 1), Tile::Floor);
        grid.encode_tile(&Point::new(4, 1), Tile::Floor);
        grid.encode_tile(&Point::new(-1, 0), Tile::Floor);

        assert_eq!(grid.count(Tile::Floor), 1);
        assert_eq!(grid.get(&Point::new(1, 1)), Some(Tile::Floor));
        assert_eq!(grid.get(&Point::new(4, 1)), None);
    }

    #[test]
    fn test_two_connected_rooms_to_ascii() {
        let rooms: Vec<Room> = [(1, 1), (9, 1)]
            .iter()
            .map(|&(x, y)| {
                let extent = Extent::from_min_and_size(Point::new(x, y), Point::new(4, 4));
                Room {
                    anchor: extent.center(),
                    extent,
                }
            })
            .collect();
        let edge = Edge::new(rooms[0].anchor, rooms[1].anchor);
        let graph = DungeonGraph::from_edges([edge].iter());
        let hallways = route_hallways(&graph, &rooms).unwrap();

        let mut grid = TileGrid::new(14, 6);
        fill_map_with_hallways(&hallways, &mut grid);
        fill_map_with_rooms(&rooms, &mut grid);
        fill_map_with_doors(&hallways, &rooms, &mut grid);

        let expected = [
            "              ",
            " ####    #### ",
            " #..#    #..# ",
            " #..+::::+..# ",
            " ####    #### ",
            "              ",
        ];
        assert_eq!(grid.to_ascii(), expected.join("\n") + "\n");
    }
}

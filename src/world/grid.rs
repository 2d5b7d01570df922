//! Tile grid: bounds, tags, adjacency and line of sight.
//!
//! The grid owns tiles and the per-tile occupant lists. Occupants are entity
//! ids; the entity records themselves live in [`World`](super::World).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{EntityId, GridKind, Position};

/// Square-grid neighbour offsets (N, S, W, E).
const SQUARE_NEIGHBOURS: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// Hex-grid neighbour offsets on the three axes.
const HEX_NEIGHBOURS: [(i32, i32); 6] = [(1, 0), (-1, 0), (0, -1), (0, 1), (-1, 1), (1, -1)];

/// Neighbour list; never more than six entries.
pub type Neighbours = SmallVec<[Position; 6]>;

/// Boolean properties of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileTag {
    BlocksMovement,
    BlocksVision,
    StartZone,
    TrapZone,
}

/// Terrain type of a tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Grass,
    Water,
    Mountain,
    #[default]
    Floor,
    Wall,
    Custom,
}

/// A single grid cell.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tile {
    pub terrain: Terrain,
    pub tags: BTreeSet<TileTag>,

    /// Entities on this tile, in arrival order. Non-owning.
    pub occupants: Vec<EntityId>,

    pub note: Option<String>,
    pub user_label: Option<String>,
}

impl Tile {
    #[must_use]
    pub fn has_tag(&self, tag: TileTag) -> bool {
        self.tags.contains(&tag)
    }
}

/// Rectangular grid of tiles, stored row-major.
#[derive(Clone, Debug)]
pub struct TileGrid {
    width: u32,
    height: u32,
    kind: GridKind,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Create a grid of default floor tiles.
    #[must_use]
    pub fn new(width: u32, height: u32, kind: GridKind) -> Self {
        let count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            kind,
            tiles: vec![Tile::default(); count],
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn kind(&self) -> GridKind {
        self.kind
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if !self.is_valid_tile(x, y) {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Is `(x, y)` inside the grid?
    #[must_use]
    pub fn is_valid_tile(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    #[must_use]
    pub fn tile(&self, pos: Position) -> Option<&Tile> {
        self.index(pos.x, pos.y).map(|i| &self.tiles[i])
    }

    pub fn tile_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        self.index(pos.x, pos.y).map(move |i| &mut self.tiles[i])
    }

    /// Add a tag to a tile. Returns `false` for out-of-bounds positions.
    pub fn tag_tile(&mut self, pos: Position, tag: TileTag) -> bool {
        match self.tile_mut(pos) {
            Some(tile) => {
                tile.tags.insert(tag);
                true
            }
            None => false,
        }
    }

    /// Remove a tag from a tile. Returns whether the tag was present.
    pub fn untag_tile(&mut self, pos: Position, tag: TileTag) -> bool {
        self.tile_mut(pos).is_some_and(|tile| tile.tags.remove(&tag))
    }

    /// Does the tile carry `tag`? Out-of-bounds tiles carry nothing.
    #[must_use]
    pub fn has_tag(&self, pos: Position, tag: TileTag) -> bool {
        self.tile(pos).is_some_and(|tile| tile.has_tag(tag))
    }

    /// Can nothing walk onto this tile? Out-of-bounds tiles block.
    #[must_use]
    pub fn blocks_movement(&self, pos: Position) -> bool {
        self.tile(pos)
            .is_none_or(|tile| tile.has_tag(TileTag::BlocksMovement))
    }

    /// In-bounds neighbours of `(x, y)` for this grid's topology.
    #[must_use]
    pub fn get_adjacent_tiles(&self, x: i32, y: i32) -> Neighbours {
        let offsets: &[(i32, i32)] = match self.kind {
            GridKind::Square => &SQUARE_NEIGHBOURS,
            GridKind::Hex => &HEX_NEIGHBOURS,
        };
        offsets
            .iter()
            .filter_map(|&(dx, dy)| Some(Position::new(x.checked_add(dx)?, y.checked_add(dy)?)))
            .filter(|p| self.is_valid_tile(p.x, p.y))
            .collect()
    }

    /// Occupants of a tile, in arrival order.
    #[must_use]
    pub fn occupants(&self, pos: Position) -> &[EntityId] {
        self.tile(pos).map_or(&[], |tile| tile.occupants.as_slice())
    }

    pub(crate) fn add_occupant(&mut self, pos: Position, entity: EntityId) -> bool {
        match self.tile_mut(pos) {
            Some(tile) => {
                if !tile.occupants.contains(&entity) {
                    tile.occupants.push(entity);
                }
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove_occupant(&mut self, pos: Position, entity: EntityId) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.occupants.retain(|&e| e != entity);
        }
    }

    /// Can something at `from` see the tile at `to` within `max_range`?
    ///
    /// The Manhattan distance must not exceed `max_range`. Every cell strictly
    /// between the endpoints on the interpolated line (each axis rounded,
    /// ties to even) must not block vision. Endpoints are never checked, and
    /// a cell outside the grid blocks.
    #[must_use]
    pub fn can_see(&self, from: Position, to: Position, max_range: u32) -> bool {
        if from.manhattan(to) > max_range {
            return false;
        }

        line_between(from, to).all(|cell| {
            self.tile(cell)
                .is_some_and(|tile| !tile.has_tag(TileTag::BlocksVision))
        })
    }
}

/// Intermediate cells of the rasterized line from `from` to `to`, exclusive
/// of both endpoints.
pub fn line_between(from: Position, to: Position) -> impl Iterator<Item = Position> {
    let dx = i64::from(to.x) - i64::from(from.x);
    let dy = i64::from(to.y) - i64::from(from.y);
    let steps = dx.abs().max(dy.abs());

    (1..steps.max(1)).map(move |step| {
        let xt = dx as f64 * step as f64 / steps as f64;
        let yt = dy as f64 * step as f64 / steps as f64;
        // Interpolated cells lie between the endpoints, so they fit in i32.
        Position::new(
            (i64::from(from.x) + xt.round_ties_even() as i64) as i32,
            (i64::from(from.y) + yt.round_ties_even() as i64) as i32,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bounds() {
        let grid = TileGrid::new(3, 2, GridKind::Square);
        assert!(grid.is_valid_tile(0, 0));
        assert!(grid.is_valid_tile(2, 1));
        assert!(!grid.is_valid_tile(3, 0));
        assert!(!grid.is_valid_tile(0, 2));
        assert!(!grid.is_valid_tile(-1, 0));
    }

    #[test]
    fn test_square_adjacency() {
        let grid = TileGrid::new(3, 3, GridKind::Square);
        let center = grid.get_adjacent_tiles(1, 1);
        assert_eq!(center.len(), 4);
        assert!(center.contains(&Position::new(1, 0)));
        assert!(center.contains(&Position::new(0, 1)));

        let corner = grid.get_adjacent_tiles(0, 0);
        assert_eq!(corner.as_slice(), &[Position::new(0, 1), Position::new(1, 0)]);
    }

    #[test]
    fn test_hex_adjacency() {
        let grid = TileGrid::new(5, 5, GridKind::Hex);
        let around = grid.get_adjacent_tiles(2, 2);
        assert_eq!(around.len(), 6);
        assert!(around.contains(&Position::new(1, 3)));
        assert!(around.contains(&Position::new(3, 1)));
        assert!(!around.contains(&Position::new(3, 3)));

        let corner = grid.get_adjacent_tiles(0, 0);
        assert_eq!(corner.len(), 2);
    }

    #[test]
    fn test_tags() {
        let mut grid = TileGrid::new(2, 2, GridKind::Square);
        let pos = Position::new(1, 0);
        assert!(grid.tag_tile(pos, TileTag::BlocksVision));
        assert!(grid.has_tag(pos, TileTag::BlocksVision));
        assert!(grid.untag_tile(pos, TileTag::BlocksVision));
        assert!(!grid.untag_tile(pos, TileTag::BlocksVision));
        assert!(!grid.tag_tile(Position::new(5, 5), TileTag::TrapZone));
    }

    #[test]
    fn test_line_between_excludes_endpoints() {
        let cells: Vec<_> = line_between(Position::new(0, 0), Position::new(3, 0)).collect();
        assert_eq!(cells, vec![Position::new(1, 0), Position::new(2, 0)]);

        let diagonal: Vec<_> = line_between(Position::new(0, 0), Position::new(2, 2)).collect();
        assert_eq!(diagonal, vec![Position::new(1, 1)]);

        assert_eq!(line_between(Position::new(1, 1), Position::new(1, 1)).count(), 0);
        assert_eq!(line_between(Position::new(1, 1), Position::new(2, 1)).count(), 0);
    }

    #[test]
    fn test_line_rounds_ties_to_even() {
        // dx=1 over two steps puts the midpoint at x=0.5, which rounds to 0.
        let cells: Vec<_> = line_between(Position::new(0, 0), Position::new(1, 2)).collect();
        assert_eq!(cells, vec![Position::new(0, 1)]);
    }

    #[test]
    fn test_can_see_range_and_blocking() {
        let mut grid = TileGrid::new(3, 1, GridKind::Square);
        let a = Position::new(0, 0);
        let c = Position::new(2, 0);

        assert!(grid.can_see(a, c, 2));
        assert!(!grid.can_see(a, c, 1));

        grid.tag_tile(Position::new(1, 0), TileTag::BlocksVision);
        assert!(!grid.can_see(a, c, 2));
        // Endpoints are never checked.
        assert!(grid.can_see(a, Position::new(1, 0), 1));
        assert!(grid.can_see(Position::new(1, 0), Position::new(1, 0), 0));
    }

    #[test]
    fn test_can_see_far_outside_the_grid() {
        let grid = TileGrid::new(3, 3, GridKind::Square);
        let origin = Position::new(0, 0);
        let corner = Position::new(i32::MIN, i32::MIN);
        assert!(!grid.can_see(origin, corner, 1));
        assert!(!grid.can_see(corner, origin, u32::MAX));
        assert!(grid.get_adjacent_tiles(i32::MAX, i32::MAX).is_empty());

        let edge = Position::new(i32::MAX, 0);
        let cells: Vec<_> = line_between(Position::new(i32::MAX - 3, 0), edge).collect();
        assert_eq!(cells, vec![Position::new(i32::MAX - 2, 0), Position::new(i32::MAX - 1, 0)]);
    }

    #[test]
    fn test_occupants() {
        let mut grid = TileGrid::new(2, 1, GridKind::Square);
        let pos = Position::new(1, 0);
        assert!(grid.add_occupant(pos, EntityId(1)));
        assert!(grid.add_occupant(pos, EntityId(2)));
        assert!(grid.add_occupant(pos, EntityId(1)));
        assert_eq!(grid.occupants(pos), &[EntityId(1), EntityId(2)]);

        grid.remove_occupant(pos, EntityId(1));
        assert_eq!(grid.occupants(pos), &[EntityId(2)]);
        assert!(!grid.add_occupant(Position::new(4, 0), EntityId(3)));
        assert!(grid.occupants(Position::new(4, 0)).is_empty());
    }

    proptest! {
        #[test]
        fn open_grid_visibility_is_just_range(
            x1 in 0i32..8, y1 in 0i32..8, x2 in 0i32..8, y2 in 0i32..8, range in 0u32..20
        ) {
            let grid = TileGrid::new(8, 8, GridKind::Square);
            let from = Position::new(x1, y1);
            let to = Position::new(x2, y2);
            prop_assert_eq!(grid.can_see(from, to, range), from.manhattan(to) <= range);
        }

        #[test]
        fn line_cells_stay_in_bounding_box(
            x1 in -5i32..5, y1 in -5i32..5, x2 in -5i32..5, y2 in -5i32..5
        ) {
            let from = Position::new(x1, y1);
            let to = Position::new(x2, y2);
            for cell in line_between(from, to) {
                prop_assert!(cell.x >= x1.min(x2) && cell.x <= x1.max(x2));
                prop_assert!(cell.y >= y1.min(y2) && cell.y <= y1.max(y2));
            }
        }
    }
}

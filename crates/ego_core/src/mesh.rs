//! Terrain mesh
//!
//! A regular grid of square tiles, each with a floor height and a set of
//! effect bits. Every edit bumps [`TerrainMesh::revision`] so that spatial
//! structures built over the mesh know when to rebuild.

use crate::math::{Vec2, Vec3};
use bitflags::bitflags;

/// Edge length of one tile in world units.
pub const TILE_SIZE: f32 = 128.0;

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct TileFx: u8 {
        /// Blocks everything, including flyers.
        const WALL       = 1 << 0;
        /// Blocks walkers only.
        const IMPASSABLE = 1 << 1;
        const SLIPPY     = 1 << 2;
        const WATER      = 1 << 3;
        const DAMAGE     = 1 << 4;
        const SHINY      = 1 << 5;
    }
}

impl TileFx {
    pub const BLOCKING: TileFx = TileFx::WALL.union(TileFx::IMPASSABLE);
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tile {
    /// Floor height.
    pub height: f32,
    pub fx: TileFx,
}

#[derive(Debug, Clone)]
pub struct TerrainMesh {
    tiles_x: u32,
    tiles_y: u32,
    tiles: Vec<Tile>,
    revision: u64,
}

impl TerrainMesh {
    /// Flat mesh at height zero.
    pub fn new(tiles_x: u32, tiles_y: u32) -> Self {
        Self::flat(tiles_x, tiles_y, 0.0)
    }

    pub fn flat(tiles_x: u32, tiles_y: u32, height: f32) -> Self {
        let count = tiles_x as usize * tiles_y as usize;
        Self {
            tiles_x,
            tiles_y,
            tiles: vec![
                Tile {
                    height,
                    fx: TileFx::empty()
                };
                count
            ],
            revision: 0,
        }
    }

    pub fn tiles_x(&self) -> u32 {
        self.tiles_x
    }

    pub fn tiles_y(&self) -> u32 {
        self.tiles_y
    }

    /// World-space extent of the mesh.
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.tiles_x as f32 * TILE_SIZE, self.tiles_y as f32 * TILE_SIZE)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn index(&self, tx: u32, ty: u32) -> Option<usize> {
        (tx < self.tiles_x && ty < self.tiles_y).then(|| ty as usize * self.tiles_x as usize + tx as usize)
    }

    pub fn tile(&self, tx: u32, ty: u32) -> Option<&Tile> {
        self.index(tx, ty).map(|index| &self.tiles[index])
    }

    /// Tile coordinates under a world position, if it lies on the mesh.
    pub fn tile_at(&self, x: f32, y: f32) -> Option<(u32, u32)> {
        if !(x.is_finite() && y.is_finite()) || x < 0.0 || y < 0.0 {
            return None;
        }
        let tx = (x / TILE_SIZE) as u32;
        let ty = (y / TILE_SIZE) as u32;
        (tx < self.tiles_x && ty < self.tiles_y).then_some((tx, ty))
    }

    /// World-space bounds of a tile as `(min, max)`.
    pub fn tile_bounds(&self, tx: u32, ty: u32) -> (Vec2, Vec2) {
        let min = Vec2::new(tx as f32 * TILE_SIZE, ty as f32 * TILE_SIZE);
        (min, min + Vec2::splat(TILE_SIZE))
    }

    /// Floor height at a world position; off-mesh positions read as 0.
    pub fn floor_height(&self, x: f32, y: f32) -> f32 {
        self.tile_at(x, y)
            .and_then(|(tx, ty)| self.tile(tx, ty))
            .map_or(0.0, |tile| tile.height)
    }

    /// Fx bits at a world position; off-mesh positions read as walls.
    pub fn fx_at(&self, x: f32, y: f32) -> TileFx {
        self.tile_at(x, y)
            .and_then(|(tx, ty)| self.tile(tx, ty))
            .map_or(TileFx::WALL, |tile| tile.fx)
    }

    /// Does the tile under `pos` stop an entity?
    pub fn blocks(&self, pos: Vec3, flying: bool) -> bool {
        let fx = self.fx_at(pos.x, pos.y);
        if flying {
            fx.contains(TileFx::WALL)
        } else {
            fx.intersects(TileFx::BLOCKING)
        }
    }

    pub fn set_height(&mut self, tx: u32, ty: u32, height: f32) -> bool {
        let Some(index) = self.index(tx, ty) else {
            return false;
        };
        self.tiles[index].height = height;
        self.revision += 1;
        true
    }

    pub fn add_fx(&mut self, tx: u32, ty: u32, fx: TileFx) -> bool {
        let Some(index) = self.index(tx, ty) else {
            return false;
        };
        self.tiles[index].fx.insert(fx);
        self.revision += 1;
        true
    }

    pub fn remove_fx(&mut self, tx: u32, ty: u32, fx: TileFx) -> bool {
        let Some(index) = self.index(tx, ty) else {
            return false;
        };
        self.tiles[index].fx.remove(fx);
        self.revision += 1;
        true
    }

    /// Iterate every tile as `(tx, ty, tile)`.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &Tile)> {
        let width = self.tiles_x.max(1);
        self.tiles
            .iter()
            .enumerate()
            .map(move |(index, tile)| (index as u32 % width, index as u32 / width, tile))
    }
}

impl Default for TerrainMesh {
    fn default() -> Self {
        Self::new(32, 32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_lookup() {
        let mesh = TerrainMesh::new(4, 2);
        assert_eq!(mesh.tile_at(0.0, 0.0), Some((0, 0)));
        assert_eq!(mesh.tile_at(TILE_SIZE * 3.5, TILE_SIZE * 1.5), Some((3, 1)));
        assert_eq!(mesh.tile_at(TILE_SIZE * 4.0, 0.0), None);
        assert_eq!(mesh.tile_at(-1.0, 0.0), None);
        assert_eq!(mesh.fx_at(-1.0, 0.0), TileFx::WALL);
    }

    #[test]
    fn edits_bump_revision() {
        let mut mesh = TerrainMesh::new(2, 2);
        let before = mesh.revision();
        assert!(mesh.add_fx(1, 1, TileFx::IMPASSABLE));
        assert!(mesh.revision() > before);
        assert!(!mesh.add_fx(5, 5, TileFx::WALL));
        let pos = Vec3::new(TILE_SIZE * 1.5, TILE_SIZE * 1.5, 0.0);
        assert!(mesh.blocks(pos, false));
        assert!(!mesh.blocks(pos, true));
    }
}

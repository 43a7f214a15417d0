//! Terrain partition
//!
//! A quadtree over the tile grid that stores only tiles able to stop
//! something (walls and impassable tiles). Empty quadrants collapse into
//! empty leaves, so a query over open ground visits a handful of nodes.
//! The tree remembers the mesh revision it was built from and is rebuilt
//! whenever the mesh changes.

use crate::octbox::OctBox;
use glam::Vec2;
use ego_core::{TerrainMesh, TileFx, TILE_SIZE};

/// Blocking tile recorded in a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockingTile {
    pub tx: u32,
    pub ty: u32,
    pub fx: TileFx,
}

/// Inclusive-exclusive tile rectangle covered by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeRect {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl NodeRect {
    fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    fn height(&self) -> u32 {
        self.y1 - self.y0
    }

    fn intersects(&self, min: Vec2, max: Vec2) -> bool {
        let lo = Vec2::new(self.x0 as f32, self.y0 as f32) * TILE_SIZE;
        let hi = Vec2::new(self.x1 as f32, self.y1 as f32) * TILE_SIZE;
        min.x <= hi.x && lo.x <= max.x && min.y <= hi.y && lo.y <= max.y
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        rect: NodeRect,
        tiles: Vec<BlockingTile>,
    },
    Branch {
        rect: NodeRect,
        children: Vec<usize>,
    },
}

#[derive(Debug, Clone)]
pub struct TerrainBsp {
    nodes: Vec<Node>,
    revision: u64,
    leaf_tiles: u32,
}

impl TerrainBsp {
    pub fn build(mesh: &TerrainMesh, leaf_tiles: u32) -> Self {
        let mut bsp = Self {
            nodes: Vec::new(),
            revision: mesh.revision(),
            leaf_tiles: leaf_tiles.max(1),
        };
        let root = NodeRect {
            x0: 0,
            y0: 0,
            x1: mesh.tiles_x(),
            y1: mesh.tiles_y(),
        };
        bsp.build_node(mesh, root);
        tracing::debug!(
            nodes = bsp.nodes.len(),
            revision = bsp.revision,
            "terrain partition built"
        );
        bsp
    }

    fn build_node(&mut self, mesh: &TerrainMesh, rect: NodeRect) -> usize {
        let index = self.nodes.len();
        let blocking: Vec<BlockingTile> = (rect.y0..rect.y1)
            .flat_map(|ty| (rect.x0..rect.x1).map(move |tx| (tx, ty)))
            .filter_map(|(tx, ty)| {
                let tile = mesh.tile(tx, ty)?;
                tile.fx
                    .intersects(TileFx::BLOCKING)
                    .then_some(BlockingTile { tx, ty, fx: tile.fx })
            })
            .collect();

        let small = rect.width() <= self.leaf_tiles && rect.height() <= self.leaf_tiles;
        if blocking.is_empty() || small {
            self.nodes.push(Node::Leaf { rect, tiles: blocking });
            return index;
        }

        self.nodes.push(Node::Branch {
            rect,
            children: Vec::new(),
        });
        let mid_x = rect.x0 + rect.width() / 2;
        let mid_y = rect.y0 + rect.height() / 2;
        let quadrants = [
            NodeRect { x0: rect.x0, y0: rect.y0, x1: mid_x, y1: mid_y },
            NodeRect { x0: mid_x, y0: rect.y0, x1: rect.x1, y1: mid_y },
            NodeRect { x0: rect.x0, y0: mid_y, x1: mid_x, y1: rect.y1 },
            NodeRect { x0: mid_x, y0: mid_y, x1: rect.x1, y1: rect.y1 },
        ];
        let mut children = Vec::with_capacity(4);
        for quadrant in quadrants {
            if quadrant.width() > 0 && quadrant.height() > 0 {
                children.push(self.build_node(mesh, quadrant));
            }
        }
        if let Node::Branch { children: slot, .. } = &mut self.nodes[index] {
            *slot = children;
        }
        index
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Is this partition stale for `mesh`?
    pub fn is_stale(&self, mesh: &TerrainMesh, leaf_tiles: u32) -> bool {
        self.revision != mesh.revision() || self.leaf_tiles != leaf_tiles.max(1)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Collect blocking tiles whose footprint may touch `bounds`.
    pub fn query(&self, bounds: &OctBox, out: &mut Vec<BlockingTile>) {
        if self.nodes.is_empty() {
            return;
        }
        let (min, max) = bounds.footprint();
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            match &self.nodes[index] {
                Node::Leaf { rect, tiles } => {
                    if !rect.intersects(min, max) {
                        continue;
                    }
                    for tile in tiles {
                        let lo = Vec2::new(tile.tx as f32, tile.ty as f32) * TILE_SIZE;
                        let hi = lo + Vec2::splat(TILE_SIZE);
                        if min.x <= hi.x && lo.x <= max.x && min.y <= hi.y && lo.y <= max.y {
                            out.push(*tile);
                        }
                    }
                }
                Node::Branch { rect, children } => {
                    if rect.intersects(min, max) {
                        stack.extend(children.iter().rev());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use ego_core::Bumper;

    #[test]
    fn open_ground_is_a_single_leaf() {
        let mesh = TerrainMesh::new(16, 16);
        let bsp = TerrainBsp::build(&mesh, 4);
        assert_eq!(bsp.node_count(), 1);
    }

    #[test]
    fn query_finds_nearby_walls_only() {
        let mut mesh = TerrainMesh::new(16, 16);
        mesh.add_fx(3, 3, TileFx::WALL);
        mesh.add_fx(12, 12, TileFx::IMPASSABLE);
        mesh.add_fx(8, 8, TileFx::WATER);
        let bsp = TerrainBsp::build(&mesh, 2);
        assert!(bsp.node_count() > 1);

        let near = OctBox::from_bumper(Vec3::new(3.5 * TILE_SIZE, 2.9 * TILE_SIZE, 0.0), &Bumper::new(20.0, 10.0), 0.001);
        let mut found = Vec::new();
        bsp.query(&near, &mut found);
        assert_eq!(found.len(), 1);
        assert_eq!((found[0].tx, found[0].ty), (3, 3));

        let open = OctBox::from_bumper(Vec3::new(8.5 * TILE_SIZE, 8.5 * TILE_SIZE, 0.0), &Bumper::new(20.0, 10.0), 0.001);
        found.clear();
        bsp.query(&open, &mut found);
        assert!(found.is_empty());
    }

    #[test]
    fn staleness_tracks_revision() {
        let mut mesh = TerrainMesh::new(4, 4);
        let bsp = TerrainBsp::build(&mesh, 2);
        assert!(!bsp.is_stale(&mesh, 2));
        mesh.add_fx(0, 0, TileFx::WALL);
        assert!(bsp.is_stale(&mesh, 2));
    }
}

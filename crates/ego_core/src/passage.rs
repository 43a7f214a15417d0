//! Passages and shops
//!
//! A passage is a rectangle of tiles that can be opened or closed. Closing
//! marks the passage; the collision resolver finishes the closure, crushing
//! whatever is caught inside, and then writes the blocking bits into the
//! mesh.

use crate::handle::EntityHandle;
use crate::math::Vec3;
use crate::mesh::{TerrainMesh, TileFx, TILE_SIZE};
use crate::world::World;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PassageId(pub u16);

/// Inclusive tile rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl TileRect {
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn contains_tile(&self, tx: u32, ty: u32) -> bool {
        (self.x0..=self.x1).contains(&tx) && (self.y0..=self.y1).contains(&ty)
    }

    /// Is a world position inside, optionally grown by `margin` units?
    pub fn contains_point(&self, pos: Vec3, margin: f32) -> bool {
        let min_x = self.x0 as f32 * TILE_SIZE - margin;
        let min_y = self.y0 as f32 * TILE_SIZE - margin;
        let max_x = (self.x1 + 1) as f32 * TILE_SIZE + margin;
        let max_y = (self.y1 + 1) as f32 * TILE_SIZE + margin;
        pos.x >= min_x && pos.x < max_x && pos.y >= min_y && pos.y < max_y
    }

    pub fn tiles(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.y0..=self.y1).flat_map(move |ty| (self.x0..=self.x1).map(move |tx| (tx, ty)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub rect: TileRect,
    pub open: bool,
    /// Set by a close request; cleared once the resolver has shut it.
    #[serde(skip)]
    pub closing: bool,
    /// Bits written into the mesh while closed.
    #[serde(skip, default = "closed_fx")]
    pub closed_fx: TileFx,
    #[serde(skip)]
    pub shop_owner: Option<EntityHandle>,
}

fn closed_fx() -> TileFx {
    TileFx::IMPASSABLE
}

impl Passage {
    pub fn new(rect: TileRect, open: bool) -> Self {
        Self {
            rect,
            open,
            closing: false,
            closed_fx: closed_fx(),
            shop_owner: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PassageList {
    passages: Vec<Passage>,
}

impl PassageList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a passage; a closed one immediately blocks its tiles.
    pub fn add(&mut self, passage: Passage, mesh: &mut TerrainMesh) -> PassageId {
        if !passage.open {
            for (tx, ty) in passage.rect.tiles() {
                mesh.add_fx(tx, ty, passage.closed_fx);
            }
        }
        let id = PassageId(self.passages.len() as u16);
        self.passages.push(passage);
        id
    }

    pub fn get(&self, id: PassageId) -> Option<&Passage> {
        self.passages.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: PassageId) -> Option<&mut Passage> {
        self.passages.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PassageId, &Passage)> {
        self.passages
            .iter()
            .enumerate()
            .map(|(index, passage)| (PassageId(index as u16), passage))
    }

    /// Passages currently waiting for the resolver to shut them.
    pub fn closing(&self) -> impl Iterator<Item = PassageId> + '_ {
        self.iter()
            .filter(|(_, passage)| passage.closing)
            .map(|(id, _)| id)
    }

    pub fn is_open(&self, id: PassageId) -> bool {
        self.get(id).is_some_and(|passage| passage.open)
    }

    /// Open a passage and clear its blocking bits.
    pub fn open(&mut self, id: PassageId, mesh: &mut TerrainMesh) -> bool {
        let Some(passage) = self.passages.get_mut(id.0 as usize) else {
            return false;
        };
        passage.closing = false;
        if passage.open {
            return true;
        }
        passage.open = true;
        for (tx, ty) in passage.rect.tiles() {
            mesh.remove_fx(tx, ty, passage.closed_fx);
        }
        tracing::debug!(passage = id.0, "passage opened");
        true
    }

    /// Request closure. Returns false for an unknown or already shut passage.
    pub fn request_close(&mut self, id: PassageId) -> bool {
        match self.passages.get_mut(id.0 as usize) {
            Some(passage) if passage.open => {
                passage.closing = true;
                true
            }
            _ => false,
        }
    }

    /// Complete a pending closure by blocking the tiles.
    pub fn finish_close(&mut self, id: PassageId, mesh: &mut TerrainMesh) -> bool {
        let Some(passage) = self.passages.get_mut(id.0 as usize) else {
            return false;
        };
        if !passage.closing {
            return false;
        }
        passage.closing = false;
        passage.open = false;
        for (tx, ty) in passage.rect.tiles() {
            mesh.add_fx(tx, ty, passage.closed_fx);
        }
        tracing::debug!(passage = id.0, "passage closed");
        true
    }

    pub fn contains(&self, id: PassageId, pos: Vec3) -> bool {
        self.get(id).is_some_and(|passage| passage.rect.contains_point(pos, 0.0))
    }

    pub fn set_shop_owner(&mut self, id: PassageId, owner: Option<EntityHandle>) -> bool {
        let Some(passage) = self.passages.get_mut(id.0 as usize) else {
            return false;
        };
        passage.shop_owner = owner;
        true
    }

    /// Shop passage containing `pos`, with its owner.
    pub fn shop_at(&self, pos: Vec3) -> Option<(PassageId, EntityHandle)> {
        self.iter().find_map(|(id, passage)| {
            let owner = passage.shop_owner?;
            passage.rect.contains_point(pos, 0.0).then_some((id, owner))
        })
    }
}

impl World {
    pub fn open_passage(&mut self, id: PassageId) -> bool {
        self.passages.open(id, &mut self.mesh)
    }

    pub fn close_passage(&mut self, id: PassageId) -> bool {
        self.passages.request_close(id)
    }

    /// Shop owner responsible for `pos`, if it is still alive.
    pub fn shop_owner_at(&self, pos: Vec3) -> Option<EntityHandle> {
        let (_, owner) = self.passages.shop_at(pos)?;
        self.entities
            .get(owner)
            .filter(|entity| entity.alive)
            .map(|_| owner)
    }
}

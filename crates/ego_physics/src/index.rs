//! Per-tick dynamic index
//!
//! A uniform spatial hash over the swept footprints of everything that
//! moves this tick. Each entry is registered in every cell its footprint
//! spans; a query gathers the entries of the cells it spans and removes
//! duplicates. Entries too large to register cell by cell go on an oversize
//! list that every query returns.

use crate::octbox::OctBox;
use std::collections::HashMap;

/// Beyond this many cells per side an entry is kept on the oversize list.
const MAX_CELL_SPAN: i32 = 16;

/// Grid cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CellCoord {
    x: i32,
    y: i32,
}

impl CellCoord {
    fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellRange {
    min: CellCoord,
    max: CellCoord,
}

impl CellRange {
    fn is_oversize(&self) -> bool {
        self.max.x - self.min.x >= MAX_CELL_SPAN || self.max.y - self.min.y >= MAX_CELL_SPAN
    }

    fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        (self.min.y..=self.max.y).flat_map(move |y| (self.min.x..=self.max.x).map(move |x| CellCoord::new(x, y)))
    }
}

#[derive(Debug, Clone)]
pub struct DynamicIndex {
    cell_size: f32,
    cells: HashMap<CellCoord, Vec<usize>>,
    oversize: Vec<usize>,
    bounds: Vec<OctBox>,
}

impl DynamicIndex {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: if cell_size.is_finite() && cell_size > 1.0 {
                cell_size
            } else {
                256.0
            },
            cells: HashMap::new(),
            oversize: Vec::new(),
            bounds: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Forget every entry, keeping allocations.
    pub fn clear(&mut self) {
        for entries in self.cells.values_mut() {
            entries.clear();
        }
        self.oversize.clear();
        self.bounds.clear();
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    pub fn bounds(&self, id: usize) -> Option<&OctBox> {
        self.bounds.get(id)
    }

    fn pos_to_cell(&self, x: f32, y: f32) -> CellCoord {
        let clamp = |v: f32| {
            let cell = (v / self.cell_size).floor();
            if cell.is_finite() {
                cell.clamp(i32::MIN as f32 / 2.0, i32::MAX as f32 / 2.0) as i32
            } else {
                0
            }
        };
        CellCoord::new(clamp(x), clamp(y))
    }

    fn range(&self, bounds: &OctBox) -> CellRange {
        let (min, max) = bounds.footprint();
        CellRange {
            min: self.pos_to_cell(min.x, min.y),
            max: self.pos_to_cell(max.x, max.y),
        }
    }

    /// Register a swept volume; returns its entry id.
    pub fn insert(&mut self, bounds: OctBox) -> usize {
        let id = self.bounds.len();
        self.bounds.push(bounds);
        let range = self.range(&bounds);
        if range.is_oversize() {
            self.oversize.push(id);
        } else {
            for cell in range.cells() {
                self.cells.entry(cell).or_default().push(id);
            }
        }
        id
    }

    /// Ids of entries whose volume overlaps `bounds`, ascending.
    pub fn query(&self, bounds: &OctBox, out: &mut Vec<usize>) {
        out.clear();
        let range = self.range(bounds);
        if range.is_oversize() {
            out.extend(0..self.bounds.len());
        } else {
            for cell in range.cells() {
                if let Some(entries) = self.cells.get(&cell) {
                    out.extend_from_slice(entries);
                }
            }
            out.extend_from_slice(&self.oversize);
        }
        out.sort_unstable();
        out.dedup();
        out.retain(|id| self.bounds[*id].overlaps(bounds));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use ego_core::Bumper;

    fn oct(x: f32, y: f32, size: f32) -> OctBox {
        OctBox::from_bumper(Vec3::new(x, y, 0.0), &Bumper::new(size, 10.0), 0.001)
    }

    #[test]
    fn query_returns_overlapping_entries_once() {
        let mut index = DynamicIndex::new(64.0);
        let spanning = index.insert(oct(64.0, 64.0, 40.0));
        let far = index.insert(oct(1000.0, 1000.0, 10.0));
        let mut out = Vec::new();
        index.query(&oct(60.0, 60.0, 10.0), &mut out);
        assert_eq!(out, vec![spanning]);
        index.query(&oct(1000.0, 1005.0, 10.0), &mut out);
        assert_eq!(out, vec![far]);
    }

    #[test]
    fn oversize_entries_are_always_checked() {
        let mut index = DynamicIndex::new(8.0);
        let huge = index.insert(oct(0.0, 0.0, 500.0));
        let mut out = Vec::new();
        index.query(&oct(300.0, -300.0, 1.0), &mut out);
        assert_eq!(out, vec![huge]);
        index.clear();
        assert!(index.is_empty());
        index.query(&oct(300.0, -300.0, 1.0), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn negative_coordinates_hash_consistently() {
        let mut index = DynamicIndex::new(32.0);
        let id = index.insert(oct(-100.0, -100.0, 5.0));
        let mut out = Vec::new();
        index.query(&oct(-98.0, -101.0, 5.0), &mut out);
        assert_eq!(out, vec![id]);
    }
}

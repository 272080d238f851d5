/// Static tile lookup for one level.
///
/// Built once by the loader, then only mutated by consumable removal.
/// Storage is a dense row-major grid, so every query is O(1); anything
/// outside the grid reads as `ContentTag::None`.

use thiserror::Error;

use super::tile::ContentTag;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TileError {
    #[error("tile ({tx}, {ty}) is outside the {cols}x{rows} grid")]
    OutOfGrid { tx: i32, ty: i32, cols: i32, rows: i32 },
    #[error("tile ({tx}, {ty}) holds nothing to remove")]
    InvalidRemoval { tx: i32, ty: i32 },
}

#[derive(Clone, Debug)]
pub struct TileMap {
    cols: i32,
    rows: i32,
    cells: Vec<ContentTag>,
}

impl TileMap {
    pub fn new(cols: i32, rows: i32) -> Self {
        let cols = cols.max(0);
        let rows = rows.max(0);
        TileMap {
            cols,
            rows,
            cells: vec![ContentTag::None; (cols * rows) as usize],
        }
    }

    /// Build from a diagram, one char per tile:
    /// `=` floor, `H` ladder, `o` egg, `*` grain, anything else empty.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as i32;
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as i32;
        let mut map = TileMap::new(width, height);
        for (ty, row) in rows.iter().enumerate() {
            for (tx, ch) in row.chars().enumerate() {
                let tag = match ch {
                    '=' => ContentTag::Floor,
                    'H' => ContentTag::Ladder,
                    'o' => ContentTag::Egg,
                    '*' => ContentTag::Grain,
                    _ => ContentTag::None,
                };
                let idx = ty * width as usize + tx;
                map.cells[idx] = tag;
            }
        }
        map
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    #[inline]
    fn index(&self, tx: i32, ty: i32) -> Option<usize> {
        if tx < 0 || ty < 0 || tx >= self.cols || ty >= self.rows {
            None
        } else {
            Some((ty * self.cols + tx) as usize)
        }
    }

    #[inline]
    pub fn tile_at(&self, tx: i32, ty: i32) -> ContentTag {
        self.index(tx, ty).map_or(ContentTag::None, |i| self.cells[i])
    }

    /// Place content during level construction.
    pub fn set(&mut self, tx: i32, ty: i32, tag: ContentTag) -> Result<(), TileError> {
        let i = self.index(tx, ty).ok_or(TileError::OutOfGrid {
            tx,
            ty,
            cols: self.cols,
            rows: self.rows,
        })?;
        self.cells[i] = tag;
        Ok(())
    }

    /// Clear a tile, returning what it held.
    /// Removing an already-empty tile is refused so counters stay honest.
    pub fn remove(&mut self, tx: i32, ty: i32) -> Result<ContentTag, TileError> {
        let i = match self.index(tx, ty) {
            Some(i) if self.cells[i] != ContentTag::None => i,
            _ => return Err(TileError::InvalidRemoval { tx, ty }),
        };
        Ok(std::mem::take(&mut self.cells[i]))
    }

    /// A ladder tile with floor on at least one side; counts as floor level.
    pub fn is_landable_ladder(&self, tx: i32, ty: i32) -> bool {
        self.tile_at(tx, ty).is_ladder()
            && (self.tile_at(tx - 1, ty).is_floor() || self.tile_at(tx + 1, ty).is_floor())
    }

    pub fn count(&self, tag: ContentTag) -> usize {
        self.cells.iter().filter(|&&c| c == tag).count()
    }
}

/// Grid geometry: tile <-> pixel conversion and alignment tests.
///
/// Pixel space is integer, y grows downward, origin at the top-left of
/// the play area. Every function here is pure; negative coordinates are
/// valid input (entities can jump above row 0) and always floor toward
/// negative infinity, so x = -1 lives in tile -1, not tile 0.

/// Fixed tile dimensions for the life of a level.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TileSize {
    pub width: i32,
    pub height: i32,
}

impl TileSize {
    pub const fn new(width: i32, height: i32) -> Self {
        TileSize { width, height }
    }

    #[inline]
    pub fn tile_to_pixel(self, tx: i32, ty: i32) -> (i32, i32) {
        (tx * self.width, ty * self.height)
    }

    #[inline]
    pub fn pixel_to_tile(self, x: i32, y: i32) -> (i32, i32) {
        (x.div_euclid(self.width), y.div_euclid(self.height))
    }

    /// On the top edge of a tile row.
    #[inline]
    pub fn is_row_aligned(self, y: i32) -> bool {
        y.rem_euclid(self.height) == 0
    }

    /// On the left edge of a tile column.
    #[inline]
    pub fn is_col_aligned(self, x: i32) -> bool {
        x.rem_euclid(self.width) == 0
    }
}

/// Axis-aligned pixel rectangle, half-open on the right and bottom edges.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Shrink by `by` pixels on every side. Never collapses below zero size.
    pub fn inset(&self, by: i32) -> Rect {
        let by = by.max(0).min(self.w / 2).min(self.h / 2);
        Rect::new(self.x + by, self.y + by, self.w - 2 * by, self.h - 2 * by)
    }

    /// Overlapping region, if any.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x0 < x1 && y0 < y1 {
            Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
        } else {
            None
        }
    }
}

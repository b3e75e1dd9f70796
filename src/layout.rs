use crate::config::LayoutOptions;
use crate::geometry::Rect;

/// Fixed-height tile grid, filled row by row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub columns: usize,
    pub tile_height: f32,
    pub gap: f32,
    pub width: f32,
}

impl GridLayout {
    pub fn new(opts: &LayoutOptions, width: f32) -> Self {
        Self {
            columns: opts.columns.max(1),
            tile_height: opts.tile_height,
            gap: opts.gap,
            width,
        }
    }

    pub fn tile_width(&self) -> f32 {
        column_width(self.width, self.columns, self.gap)
    }

    /// Document rectangle of the `index`-th tile.
    pub fn rect_for(&self, index: usize) -> Rect {
        let columns = self.columns.max(1);
        let row = (index / columns) as f32;
        let col = (index % columns) as f32;
        let tile_w = self.tile_width();
        Rect::new(
            self.gap + col * (tile_w + self.gap),
            self.gap + row * (self.tile_height + self.gap),
            tile_w,
            self.tile_height,
        )
    }

    /// Height of the document holding `count` tiles, trailing gap included.
    pub fn content_height(&self, count: usize) -> f32 {
        let columns = self.columns.max(1);
        let rows = count.div_ceil(columns) as f32;
        self.gap + rows * (self.tile_height + self.gap)
    }
}

pub fn column_width(total: f32, columns: usize, gap: f32) -> f32 {
    let columns = columns.max(1) as f32;
    ((total - gap * (columns + 1.0)) / columns).max(1.0)
}

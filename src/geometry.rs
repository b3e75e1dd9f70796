/// Axis aligned box. Document coordinates unless stated otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Grow (or shrink, for negative values) on every side.
    pub fn inflate(&self, margin: f32) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    pub fn intersection_area(&self, other: &Rect) -> f32 {
        let w = self.right().min(other.right()) - self.left().max(other.left());
        let h = self.bottom().min(other.bottom()) - self.top().max(other.top());
        if w <= 0.0 || h <= 0.0 { 0.0 } else { w * h }
    }
}

/// Visible window onto the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub scroll_x: f32,
    pub scroll_y: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    /// The viewport in client coordinates: origin at the top-left corner.
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Maps a document rectangle to client coordinates (what a bounding box query returns).
    pub fn client_rect(&self, doc: Rect) -> Rect {
        doc.translate(-self.scroll_x, -self.scroll_y)
    }

    /// All four edges inside `[0, width] x [0, height]`.
    pub fn fully_contains(&self, client: Rect) -> bool {
        client.top() >= 0.0
            && client.left() >= 0.0
            && client.bottom() <= self.height
            && client.right() <= self.width
    }

    /// Fraction of `client` visible inside the viewport grown by `margin`.
    pub fn visible_ratio(&self, client: Rect, margin: f32) -> f32 {
        let area = client.area();
        if area <= 0.0 {
            return 0.0;
        }
        let root = self.bounds().inflate(margin);
        (client.intersection_area(&root) / area).clamp(0.0, 1.0)
    }

    /// Loose vertical overlap test used by the scroll-event fallback.
    pub fn overlaps_vertically(&self, client: Rect) -> bool {
        client.top() <= self.height && client.bottom() >= 0.0
    }

    /// Scrolls by `dy`, clamped to `[0, content_height - height]`.
    pub fn scroll_by(&mut self, dy: f32, content_height: f32) {
        let max = (content_height - self.height).max(0.0);
        self.scroll_y = (self.scroll_y + dy).clamp(0.0, max);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
    }
}

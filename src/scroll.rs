use tracing::trace;

use crate::gallery::{Gallery, RenderedImage};
use crate::geometry::Viewport;

/// Fires when the sentinel tile is entirely on screen.
///
/// The sentinel is recomputed on every call, so it moves forward as tiles are
/// appended. There is no debounce here; repeated firings during a fetch are
/// absorbed by the pagination guard.
#[derive(Debug, Clone)]
pub struct ScrollTrigger {
    sentinel_offset: usize,
    active: bool,
}

impl ScrollTrigger {
    pub fn new(sentinel_offset: usize) -> Self {
        Self {
            sentinel_offset: sentinel_offset.max(1),
            active: false,
        }
    }

    pub fn start(&mut self) {
        self.active = true;
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn sentinel<'g>(&self, gallery: &'g Gallery) -> Option<&'g RenderedImage> {
        let index = gallery.len().checked_sub(self.sentinel_offset)?;
        gallery.image(index)
    }

    pub fn should_load(&self, gallery: &Gallery, viewport: &Viewport) -> bool {
        if !self.active {
            return false;
        }
        let Some(sentinel) = self.sentinel(gallery) else {
            return false;
        };
        let client = viewport.client_rect(gallery.rect(sentinel.id));
        let visible = viewport.fully_contains(client);
        trace!(sentinel = sentinel.id, visible, "sentinel check");
        visible
    }
}

//! In-memory page model: the grid of rendered images, the loading indicator,
//! inline notices and the overlay.

use std::time::{Duration, Instant};

use crate::events::ViewEvent;
use crate::geometry::Rect;
use crate::layout::GridLayout;

pub type ImageId = usize;

/// A grid tile. Starts as a placeholder holding only the deferred source.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    pub id: ImageId,
    pub deferred_src: String,
    pub src: Option<String>,
    pub photographer: Option<String>,
    pub pending: bool,
    pub observed: bool,
    pub hidden: bool,
}

impl RenderedImage {
    pub fn is_loaded(&self) -> bool {
        self.src.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    pub image: ImageId,
    pub image_url: String,
    pub photographer: Option<String>,
}

impl Overlay {
    pub fn caption(&self) -> String {
        format!(
            "Photo by : {}",
            self.photographer.as_deref().unwrap_or("unknown")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub expires_at: Instant,
}

#[derive(Debug)]
pub struct Gallery {
    layout: GridLayout,
    images: Vec<RenderedImage>,
    loading: bool,
    overlay: Option<Overlay>,
    notices: Vec<Notice>,
    notice_duration: Duration,
}

impl Gallery {
    pub fn new(layout: GridLayout, notice_duration: Duration) -> Self {
        Self {
            layout,
            images: Vec::new(),
            loading: false,
            overlay: None,
            notices: Vec::new(),
            notice_duration,
        }
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn relayout(&mut self, width: f32) {
        self.layout.width = width;
    }

    pub fn images(&self) -> &[RenderedImage] {
        &self.images
    }

    pub fn image(&self, id: ImageId) -> Option<&RenderedImage> {
        self.images.get(id)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Document rectangle of a tile; hidden tiles collapse to zero size.
    pub fn rect(&self, id: ImageId) -> Rect {
        let rect = self.layout.rect_for(id);
        match self.images.get(id) {
            Some(img) if img.hidden => Rect::new(rect.x, rect.y, 0.0, 0.0),
            _ => rect,
        }
    }

    pub fn content_height(&self) -> f32 {
        self.layout.content_height(self.images.len())
    }

    /// Adds a placeholder tile flagged pending; the real source is assigned later.
    pub fn append_photo(&mut self, image_url: String, photographer: Option<String>) -> ImageId {
        let id = self.images.len();
        self.images.push(RenderedImage {
            id,
            deferred_src: image_url,
            src: None,
            photographer,
            pending: true,
            observed: false,
            hidden: false,
        });
        id
    }

    pub fn pending_ids(&self) -> Vec<ImageId> {
        self.images
            .iter()
            .filter(|img| img.pending)
            .map(|img| img.id)
            .collect()
    }

    pub fn set_observed(&mut self, id: ImageId, observed: bool) {
        if let Some(img) = self.images.get_mut(id) {
            img.observed = observed;
        }
    }

    pub fn set_hidden(&mut self, id: ImageId, hidden: bool) {
        if let Some(img) = self.images.get_mut(id) {
            img.hidden = hidden;
        }
    }

    /// Copies the deferred source into place. Returns false when already loaded.
    pub fn assign_source(&mut self, id: ImageId) -> bool {
        match self.images.get_mut(id) {
            Some(img) if img.pending => {
                img.src = Some(img.deferred_src.clone());
                img.pending = false;
                img.observed = false;
                true
            }
            _ => false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn show_notice(&mut self, message: impl Into<String>, now: Instant) {
        self.notices.push(Notice {
            message: message.into(),
            expires_at: now + self.notice_duration,
        });
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drops notices whose time is up and returns their messages.
    pub fn expire_notices(&mut self, now: Instant) -> Vec<String> {
        let mut expired = Vec::new();
        self.notices.retain(|n| {
            if n.expires_at <= now {
                expired.push(n.message.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    pub fn next_notice_deadline(&self) -> Option<Instant> {
        self.notices.iter().map(|n| n.expires_at).min()
    }

    /// Opens the lightbox for a tile whose source is already assigned.
    pub fn open_overlay(&mut self, id: ImageId) -> Option<&Overlay> {
        let img = self.images.get(id)?;
        let image_url = img.src.clone()?;
        self.overlay = Some(Overlay {
            image: id,
            image_url,
            photographer: img.photographer.clone(),
        });
        self.overlay.as_ref()
    }

    pub fn close_overlay(&mut self) -> Option<Overlay> {
        self.overlay.take()
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    /// Scrolling is locked while the overlay is up.
    pub fn scroll_locked(&self) -> bool {
        self.overlay.is_some()
    }

    /// Applies one render request. Returns the new tile for appends.
    pub fn apply(&mut self, event: ViewEvent, now: Instant) -> Option<ImageId> {
        match event {
            ViewEvent::ShowLoading => self.loading = true,
            ViewEvent::HideLoading => self.loading = false,
            ViewEvent::AppendPhoto {
                image_url,
                photographer,
            } => return Some(self.append_photo(image_url, photographer)),
            ViewEvent::Notice(message) => self.show_notice(message, now),
        }
        None
    }
}

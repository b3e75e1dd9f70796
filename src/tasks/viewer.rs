use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{Receiver, Sender, UnboundedReceiver, UnboundedSender};
use tokio::time::{Instant as TokioInstant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{Configuration, LazyLoadOptions};
use crate::events::{BatchRendered, InputEvent, LoadMore, TriggerSource, ViewEvent};
use crate::gallery::{Gallery, ImageId, Overlay, RenderedImage};
use crate::geometry::Viewport;
use crate::layout::GridLayout;
use crate::lazy_load::{LazyLoader, Strategy};
use crate::scroll::ScrollTrigger;

/// Painting side of the gallery. Every hook defaults to a no-op.
pub trait Surface: Send {
    fn supports_intersection(&self) -> bool {
        true
    }
    fn loading_changed(&mut self, _loading: bool) {}
    fn photo_appended(&mut self, _image: &RenderedImage) {}
    fn source_assigned(&mut self, _image: &RenderedImage) {}
    fn notice_shown(&mut self, _message: &str) {}
    fn notice_dismissed(&mut self, _message: &str) {}
    fn overlay_opened(&mut self, _overlay: &Overlay) {}
    fn overlay_closed(&mut self) {}
}

/// Prints each photo to stdout once its source is assigned.
#[derive(Debug, Default)]
pub struct ConsoleSurface;

impl Surface for ConsoleSurface {
    fn source_assigned(&mut self, image: &RenderedImage) {
        let by = image.photographer.as_deref().unwrap_or("-");
        println!("{:>5}  {by}  {}", image.id, image.deferred_src);
    }

    fn notice_shown(&mut self, message: &str) {
        println!("! {message}");
    }

    fn overlay_opened(&mut self, overlay: &Overlay) {
        println!("[overlay] {}  {}", overlay.image_url, overlay.caption());
    }
}

#[derive(Debug, Clone)]
pub struct ViewerOptions {
    pub viewport: Viewport,
    pub layout: GridLayout,
    pub notice_duration: Duration,
    pub sentinel_offset: usize,
    pub lazy_load: LazyLoadOptions,
}

impl ViewerOptions {
    pub fn from_config(cfg: &Configuration) -> Self {
        let viewport = Viewport::new(cfg.viewport.width, cfg.viewport.height);
        Self {
            viewport,
            layout: GridLayout::new(&cfg.layout, viewport.width),
            notice_duration: cfg.notice_duration,
            sentinel_offset: cfg.sentinel_offset,
            lazy_load: cfg.lazy_load.clone(),
        }
    }
}

/// Page model plus the scroll trigger and the lazy loader, driven by events.
pub struct Viewer<S> {
    gallery: Gallery,
    viewport: Viewport,
    lazy: LazyLoader,
    trigger: ScrollTrigger,
    surface: S,
    batch_appended: bool,
}

impl<S: Surface> Viewer<S> {
    pub fn new(opts: &ViewerOptions, surface: S) -> Self {
        let strategy = Strategy::resolve(opts.lazy_load.mode, surface.supports_intersection());
        Self {
            gallery: Gallery::new(opts.layout, opts.notice_duration),
            viewport: opts.viewport,
            lazy: LazyLoader::new(strategy, &opts.lazy_load),
            trigger: ScrollTrigger::new(opts.sentinel_offset),
            surface,
            batch_appended: false,
        }
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn lazy_loader(&self) -> &LazyLoader {
        &self.lazy
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn start(&mut self, now: Instant) {
        self.lazy.start();
        self.trigger.start();
        info!(strategy = ?self.lazy.strategy(), "viewer started");
        let loaded = self.lazy.refresh(&mut self.gallery, &self.viewport, now);
        self.report_loaded(&loaded);
    }

    pub fn stop(&mut self) {
        self.trigger.stop();
        self.lazy.stop(&mut self.gallery);
    }

    /// Applies one render request from the pagination side.
    ///
    /// Returns the ack owed to the pagination task once a batch is complete.
    pub fn apply(&mut self, event: ViewEvent, now: Instant) -> Option<BatchRendered> {
        match event {
            ViewEvent::ShowLoading => {
                self.gallery.apply(ViewEvent::ShowLoading, now);
                self.surface.loading_changed(true);
            }
            ViewEvent::HideLoading => {
                self.gallery.apply(ViewEvent::HideLoading, now);
                self.surface.loading_changed(false);
                if std::mem::take(&mut self.batch_appended) {
                    let loaded = self.lazy.refresh(&mut self.gallery, &self.viewport, now);
                    self.report_loaded(&loaded);
                }
                return Some(BatchRendered);
            }
            ViewEvent::Notice(message) => {
                self.surface.notice_shown(&message);
                self.gallery.apply(ViewEvent::Notice(message), now);
            }
            append @ ViewEvent::AppendPhoto { .. } => {
                if let Some(id) = self.gallery.apply(append, now) {
                    self.batch_appended = true;
                    if let Some(img) = self.gallery.image(id) {
                        self.surface.photo_appended(img);
                    }
                }
            }
        }
        None
    }

    /// Handles host input; returns a trigger for the pagination task when one is due.
    pub fn input(&mut self, event: InputEvent, now: Instant) -> Option<LoadMore> {
        match event {
            InputEvent::Scroll { dy } => {
                if self.gallery.scroll_locked() {
                    return None;
                }
                self.viewport.scroll_by(dy, self.gallery.content_height());
                let loaded = self
                    .lazy
                    .on_viewport_change(&mut self.gallery, &self.viewport, now);
                self.report_loaded(&loaded);
                self.trigger
                    .should_load(&self.gallery, &self.viewport)
                    .then(|| LoadMore::new(TriggerSource::Scroll))
            }
            InputEvent::Resize { width, height }
            | InputEvent::OrientationChange { width, height } => {
                self.viewport.resize(width, height);
                self.gallery.relayout(self.viewport.width);
                // a taller viewport may leave the old offset past the end
                self.viewport.scroll_by(0.0, self.gallery.content_height());
                let loaded = self
                    .lazy
                    .on_viewport_change(&mut self.gallery, &self.viewport, now);
                self.report_loaded(&loaded);
                None
            }
            InputEvent::Click { image } => {
                self.open_overlay(image);
                None
            }
            InputEvent::CloseOverlay => {
                if self.gallery.close_overlay().is_some() {
                    self.surface.overlay_closed();
                }
                None
            }
            InputEvent::SubmitSearch => Some(LoadMore::new(TriggerSource::Search)),
        }
    }

    /// Runs whatever timers are due: the fallback sweep and notice expiry.
    pub fn tick(&mut self, now: Instant) {
        let loaded = self.lazy.poll(&mut self.gallery, &self.viewport, now);
        self.report_loaded(&loaded);
        for message in self.gallery.expire_notices(now) {
            self.surface.notice_dismissed(&message);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.lazy.next_deadline(), self.gallery.next_notice_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn open_overlay(&mut self, image: ImageId) {
        match self.gallery.open_overlay(image) {
            Some(overlay) => self.surface.overlay_opened(overlay),
            None => debug!(image, "overlay ignored; image not loaded"),
        }
    }

    fn report_loaded(&mut self, ids: &[ImageId]) {
        for &id in ids {
            if let Some(img) = self.gallery.image(id) {
                self.surface.source_assigned(img);
            }
        }
    }
}

fn now() -> Instant {
    TokioInstant::now().into_std()
}

pub async fn run<S: Surface>(
    opts: ViewerOptions,
    surface: S,
    mut from_pagination: UnboundedReceiver<ViewEvent>,
    mut input: Receiver<InputEvent>,
    to_pagination: Sender<LoadMore>,
    rendered: UnboundedSender<BatchRendered>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut viewer = Viewer::new(&opts, surface);
    viewer.start(now());

    loop {
        let wake = viewer.next_deadline().map(TokioInstant::from_std);
        select! {
            _ = cancel.cancelled() => break,

            Some(event) = from_pagination.recv() => {
                if let Some(ack) = viewer.apply(event, now()) {
                    if rendered.send(ack).is_err() {
                        debug!("pagination task gone; dropping render ack");
                    }
                }
            }

            Some(event) = input.recv() => {
                if let Some(request) = viewer.input(event, now()) {
                    match to_pagination.try_send(request) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => debug!("pagination busy; dropping trigger"),
                        Err(TrySendError::Closed(_)) => debug!("pagination task gone; dropping trigger"),
                    }
                }
            }

            _ = sleep_until(wake.unwrap_or_else(TokioInstant::now)), if wake.is_some() => {
                viewer.tick(now());
            }
        }
    }

    viewer.stop();
    info!(images = viewer.gallery().len(), "viewer stopped");
    Ok(())
}

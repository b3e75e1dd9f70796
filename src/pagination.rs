//! Page counter, single-flight guard and cross-page deduplication.
//!
//! A fetch is split into [`PaginationController::begin`],
//! [`PaginationController::settle`] and [`PaginationController::release`] so an
//! owner can keep receiving triggers while the request is in flight and while
//! the settled batch is still being rendered; triggers arriving in between are
//! dropped by the guard. [`PaginationController::request_next_page`] runs all
//! three back to back.
//!
//! The main page and the search page differ only in which feed they ask and
//! how they settle a result; that difference lives in [`PageStrategy`].

use std::collections::HashSet;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::events::ViewEvent;
use crate::feed::{GalleryFeed, PhotoApi};
use crate::photo::{Photo, PhotoId, PhotoPage};

pub const NO_RESULTS: &str = "No results found";
pub const NO_SEARCH_TERM: &str = "No Search Term!";

/// Receiver of render requests.
pub trait ViewSink {
    fn emit(&mut self, event: ViewEvent);
}

impl ViewSink for Vec<ViewEvent> {
    fn emit(&mut self, event: ViewEvent) {
        self.push(event);
    }
}

impl ViewSink for UnboundedSender<ViewEvent> {
    fn emit(&mut self, event: ViewEvent) {
        if self.send(event).is_err() {
            warn!("viewer channel closed; dropping render request");
        }
    }
}

/// Every photo id observed this session. Never shrinks.
#[derive(Debug, Default, Clone)]
pub struct SeenIds {
    ids: HashSet<PhotoId>,
}

impl SeenIds {
    /// Records `id`; true when it had not been seen before.
    pub fn observe(&mut self, id: PhotoId) -> bool {
        self.ids.insert(id)
    }

    pub fn contains(&self, id: PhotoId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    pub current_page: u32,
    pub loading: bool,
    pub page_size: u32,
    pub total_loaded: usize,
}

impl PaginationState {
    pub fn new(page_size: u32) -> Self {
        Self {
            current_page: 1,
            loading: false,
            page_size,
            total_loaded: 0,
        }
    }
}

/// Issued by `begin`; identifies the in-flight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTicket {
    pub page: u32,
    pub page_size: u32,
    pub query: Option<String>,
}

/// What a strategy decided to do with a fetch result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settlement {
    pub photos: Vec<Photo>,
    pub advance_page: bool,
    pub notice: Option<&'static str>,
}

pub trait PageStrategy: Send {
    fn name(&self) -> &'static str;

    /// Query handed to the feed for this attempt; `None` selects the curated feed.
    fn fetch_query(&self, query: Option<&str>) -> Option<String>;

    /// Decides what to render and whether the page counter moves.
    fn settle(&self, query: Option<&str>, result: Option<PhotoPage>) -> Settlement;

    /// Render request for one unique photo.
    fn render_unit(&self, photo: &Photo) -> ViewEvent {
        ViewEvent::AppendPhoto {
            image_url: photo.image_url.clone(),
            photographer: Some(photo.photographer.clone()),
        }
    }
}

/// Main page: always the curated feed; failures leave the page counter alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct CuratedPages;

impl PageStrategy for CuratedPages {
    fn name(&self) -> &'static str {
        "curated"
    }

    fn fetch_query(&self, _query: Option<&str>) -> Option<String> {
        None
    }

    fn settle(&self, _query: Option<&str>, result: Option<PhotoPage>) -> Settlement {
        match result {
            Some(page) => Settlement {
                photos: page.photos,
                advance_page: true,
                notice: None,
            },
            None => Settlement::default(),
        }
    }
}

/// Search page.
///
/// With a term the search feed is used and only a delivered page advances
/// the counter. Without a term the curated feed is shown behind a notice and
/// the counter advances even when that fetch failed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchPages;

impl PageStrategy for SearchPages {
    fn name(&self) -> &'static str {
        "search"
    }

    fn fetch_query(&self, query: Option<&str>) -> Option<String> {
        query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_owned)
    }

    fn settle(&self, query: Option<&str>, result: Option<PhotoPage>) -> Settlement {
        match (query, result) {
            (Some(_), None) => Settlement::default(),
            (Some(_), Some(page)) if page.is_empty() => Settlement {
                photos: Vec::new(),
                advance_page: true,
                notice: Some(NO_RESULTS),
            },
            (Some(_), Some(page)) => Settlement {
                photos: page.photos,
                advance_page: true,
                notice: None,
            },
            (None, result) => Settlement {
                photos: result.map(|p| p.photos).unwrap_or_default(),
                advance_page: true,
                notice: Some(NO_SEARCH_TERM),
            },
        }
    }

    fn render_unit(&self, photo: &Photo) -> ViewEvent {
        ViewEvent::AppendPhoto {
            image_url: photo.image_url.clone(),
            photographer: None,
        }
    }
}

/// Result of one completed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageOutcome {
    pub fetched: usize,
    pub rendered: usize,
    pub duplicates: usize,
    pub advanced: bool,
}

#[derive(Debug)]
pub struct PaginationController<S> {
    strategy: S,
    state: PaginationState,
    seen: SeenIds,
    settled: bool,
}

impl<S: PageStrategy> PaginationController<S> {
    pub fn new(strategy: S, page_size: u32) -> Self {
        Self {
            strategy,
            state: PaginationState::new(page_size),
            seen: SeenIds::default(),
            settled: false,
        }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    pub fn seen(&self) -> &SeenIds {
        &self.seen
    }

    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    /// The in-flight batch has been handed to the sink; the guard waits for [`Self::release`].
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Takes the guard and announces loading. `None` while a fetch is in flight.
    pub fn begin(&mut self, query: Option<&str>, sink: &mut impl ViewSink) -> Option<PageTicket> {
        if self.state.loading {
            debug!(
                page = self.state.current_page,
                "fetch already in flight; dropping trigger"
            );
            return None;
        }
        self.state.loading = true;
        self.settled = false;
        sink.emit(ViewEvent::ShowLoading);
        Some(PageTicket {
            page: self.state.current_page,
            page_size: self.state.page_size,
            query: self.strategy.fetch_query(query),
        })
    }

    /// Dedups and renders the result, moves the counter and emits `HideLoading`.
    ///
    /// The guard stays held until [`Self::release`], so a trigger computed
    /// against the grid before this batch was applied is still rejected.
    pub fn settle(
        &mut self,
        ticket: &PageTicket,
        result: Option<PhotoPage>,
        sink: &mut impl ViewSink,
    ) -> PageOutcome {
        let fetched = result.as_ref().map(PhotoPage::len);
        let settlement = self.strategy.settle(ticket.query.as_deref(), result);

        let mut outcome = PageOutcome {
            fetched: fetched.unwrap_or(0),
            ..PageOutcome::default()
        };
        for photo in &settlement.photos {
            if self.seen.observe(photo.id) {
                sink.emit(self.strategy.render_unit(photo));
                outcome.rendered += 1;
            } else {
                outcome.duplicates += 1;
            }
        }
        if let Some(notice) = settlement.notice {
            sink.emit(ViewEvent::Notice(notice.to_owned()));
        }
        if let Some(count) = fetched {
            self.state.total_loaded += count;
        }
        if settlement.advance_page {
            self.state.current_page += 1;
            outcome.advanced = true;
        }

        self.settled = true;
        sink.emit(ViewEvent::HideLoading);

        info!(
            strategy = self.strategy.name(),
            page = ticket.page,
            fetched = outcome.fetched,
            rendered = outcome.rendered,
            duplicates = outcome.duplicates,
            next_page = self.state.current_page,
            absent = fetched.is_none(),
            "page settled"
        );
        outcome
    }

    /// Releases the guard once the settled batch is on screen. False when nothing was held.
    pub fn release(&mut self) -> bool {
        self.settled = false;
        std::mem::replace(&mut self.state.loading, false)
    }

    /// [`Self::settle`] followed by [`Self::release`], for sinks that render synchronously.
    pub fn finish(
        &mut self,
        ticket: &PageTicket,
        result: Option<PhotoPage>,
        sink: &mut impl ViewSink,
    ) -> PageOutcome {
        let outcome = self.settle(ticket, result, sink);
        self.release();
        outcome
    }

    /// Ends a fetch that produced nothing at all: hides the indicator without
    /// advancing. Like [`Self::settle`] it leaves the guard held.
    pub fn abandon(&mut self, sink: &mut impl ViewSink) -> bool {
        if !self.state.loading || self.settled {
            return false;
        }
        self.settled = true;
        sink.emit(ViewEvent::HideLoading);
        true
    }

    pub async fn request_next_page<A: PhotoApi>(
        &mut self,
        feed: &GalleryFeed<A>,
        query: Option<&str>,
        sink: &mut impl ViewSink,
    ) -> Option<PageOutcome> {
        let ticket = self.begin(query, sink)?;
        let result = feed
            .fetch_page(ticket.page, ticket.page_size, ticket.query.as_deref())
            .await;
        Some(self.finish(&ticket, result, sink))
    }
}

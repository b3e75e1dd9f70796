//! Scripted photo API used by unit and integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Semaphore;

use crate::error::FeedError;
use crate::feed::{FeedRequest, PhotoApi};
use crate::photo::{ApiPage, ApiPhoto, PhotoId, PhotoSources};

#[derive(Debug, Clone)]
pub enum StubResponse {
    Page(Vec<PhotoId>),
    NetworkFailure,
    DecodeFailure,
}

/// Answers requests from a queue; an exhausted queue yields empty pages.
#[derive(Debug, Default)]
pub struct StubApi {
    responses: Mutex<VecDeque<StubResponse>>,
    requests: Mutex<Vec<FeedRequest>>,
    gate: Option<Arc<Semaphore>>,
}

impl StubApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, response: StubResponse) -> Self {
        lock(&self.responses).push_back(response);
        self
    }

    pub fn with_page(self, ids: impl IntoIterator<Item = PhotoId>) -> Self {
        self.with(StubResponse::Page(ids.into_iter().collect()))
    }

    /// Every fetch waits for a permit on `gate` before answering.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn requests(&self) -> Vec<FeedRequest> {
        lock(&self.requests).clone()
    }

    pub fn calls(&self) -> usize {
        lock(&self.requests).len()
    }
}

impl PhotoApi for StubApi {
    async fn fetch(&self, request: &FeedRequest) -> Result<ApiPage, FeedError> {
        lock(&self.requests).push(request.clone());

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let next = lock(&self.responses).pop_front();
        match next.unwrap_or(StubResponse::Page(Vec::new())) {
            StubResponse::Page(ids) => Ok(api_page(request.page(), ids)),
            StubResponse::NetworkFailure => Err(FeedError::Status(
                reqwest::StatusCode::SERVICE_UNAVAILABLE,
            )),
            StubResponse::DecodeFailure => {
                serde_json::from_str::<ApiPage>("{\"photos\": 7}").map_err(FeedError::from)
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn api_page(page: u32, ids: impl IntoIterator<Item = PhotoId>) -> ApiPage {
    let photos: Vec<ApiPhoto> = ids.into_iter().map(api_photo).collect();
    ApiPage {
        page,
        per_page: photos.len() as u32,
        photos,
        total_results: None,
        next_page: None,
    }
}

pub fn api_photo(id: PhotoId) -> ApiPhoto {
    ApiPhoto {
        id,
        photographer: photographer_for(id),
        src: PhotoSources {
            original: format!("https://images.example/{id}/original.jpg"),
            large2x: image_url_for(id),
            ..PhotoSources::default()
        },
    }
}

pub fn image_url_for(id: PhotoId) -> String {
    format!("https://images.example/{id}/large2x.jpg")
}

pub fn photographer_for(id: PhotoId) -> String {
    format!("Photographer {id}")
}

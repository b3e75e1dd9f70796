//! Remote photo listings behind a single "fetch page N for query Q" call.
//!
//! [`PhotoApi`] is the transport seam: [`PexelsClient`] speaks HTTP, tests
//! plug in [`crate::testkit::StubApi`]. [`GalleryFeed`] sits on top and is the
//! error boundary: every failure is logged and reported as an absent page.

use std::future::Future;

use reqwest::header::AUTHORIZATION;
use tracing::{debug, warn};
use url::Url;

use crate::config::ApiOptions;
use crate::error::FeedError;
use crate::photo::{ApiPage, ImageSize, PhotoPage};

/// One listing request. Built by [`FeedRequest::new`], which picks the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedRequest {
    Curated {
        page: u32,
        per_page: u32,
    },
    Search {
        query: String,
        page: u32,
        per_page: u32,
    },
}

impl FeedRequest {
    /// Search when `query` has visible characters, curated otherwise.
    pub fn new(page: u32, per_page: u32, query: Option<&str>) -> Self {
        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => Self::Search {
                query: q.to_owned(),
                page,
                per_page,
            },
            None => Self::Curated { page, per_page },
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::Curated { .. } => "curated",
            Self::Search { .. } => "search",
        }
    }

    pub fn page(&self) -> u32 {
        match self {
            Self::Curated { page, .. } | Self::Search { page, .. } => *page,
        }
    }

    pub fn per_page(&self) -> u32 {
        match self {
            Self::Curated { per_page, .. } | Self::Search { per_page, .. } => *per_page,
        }
    }

    pub fn query(&self) -> Option<&str> {
        match self {
            Self::Curated { .. } => None,
            Self::Search { query, .. } => Some(query),
        }
    }
}

pub trait PhotoApi: Send + Sync {
    fn fetch(
        &self,
        request: &FeedRequest,
    ) -> impl Future<Output = Result<ApiPage, FeedError>> + Send;
}

/// HTTP client for a Pexels-compatible API.
#[derive(Debug, Clone)]
pub struct PexelsClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl PexelsClient {
    pub fn new(opts: &ApiOptions, api_key: String) -> Result<Self, FeedError> {
        let mut base = opts.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("rust-photo-gallery/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = opts.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url,
            api_key,
        })
    }

    pub fn endpoint(&self, request: &FeedRequest) -> Result<Url, FeedError> {
        let mut url = self.base_url.join(request.path())?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(query) = request.query() {
                pairs.append_pair("query", query);
            }
            pairs
                .append_pair("page", &request.page().to_string())
                .append_pair("per_page", &request.per_page().to_string());
        }
        Ok(url)
    }
}

impl PhotoApi for PexelsClient {
    async fn fetch(&self, request: &FeedRequest) -> Result<ApiPage, FeedError> {
        let url = self.endpoint(request)?;
        debug!(%url, "requesting photo listing");
        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Uniform page access over a [`PhotoApi`].
#[derive(Debug)]
pub struct GalleryFeed<A> {
    api: A,
    image_size: ImageSize,
}

impl<A: PhotoApi> GalleryFeed<A> {
    pub fn new(api: A, image_size: ImageSize) -> Self {
        Self { api, image_size }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// `None` on any transport or decode failure; an empty page is still `Some`.
    /// Never retries.
    pub async fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
        query: Option<&str>,
    ) -> Option<PhotoPage> {
        let request = FeedRequest::new(page, page_size, query);
        match self.api.fetch(&request).await {
            Ok(raw) => {
                let photos = raw.into_page(self.image_size);
                debug!(
                    endpoint = request.path(),
                    page,
                    photos = photos.len(),
                    "photo page received"
                );
                Some(photos)
            }
            Err(err) => {
                warn!(
                    endpoint = request.path(),
                    page,
                    kind = ?err.kind(),
                    error = %err,
                    "photo feed request failed"
                );
                None
            }
        }
    }
}

/// Where the current search term comes from.
pub trait QuerySource: Send {
    fn search_term(&self) -> Option<String>;
}

/// A term fixed at startup.
impl QuerySource for Option<String> {
    fn search_term(&self) -> Option<String> {
        self.clone()
    }
}

/// A page location carrying `?search-term=...`.
impl QuerySource for Url {
    fn search_term(&self) -> Option<String> {
        self.query_pairs()
            .find(|(key, _)| key == "search-term")
            .map(|(_, value)| value.into_owned())
    }
}

use serde::Deserialize;

pub type PhotoId = u64;

/// A photo as handed to the page model. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    pub id: PhotoId,
    pub image_url: String,
    pub photographer: String,
}

/// One page of normalized results.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PhotoPage {
    pub page: u32,
    pub per_page: u32,
    pub photos: Vec<Photo>,
    pub total_results: Option<u64>,
    pub next_page: Option<String>,
}

impl PhotoPage {
    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }
}

/// Which rendition of a photo to request from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageSize {
    Original,
    #[default]
    #[serde(rename = "large2x")]
    Large2x,
    Large,
    Medium,
    Small,
    Portrait,
    Landscape,
    Tiny,
}

/// Listing body as returned by the curated and search endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPage {
    #[serde(default = "ApiPage::first_page")]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    pub photos: Vec<ApiPhoto>,
    #[serde(default)]
    pub total_results: Option<u64>,
    #[serde(default)]
    pub next_page: Option<String>,
}

impl ApiPage {
    const fn first_page() -> u32 {
        1
    }

    pub fn into_page(self, size: ImageSize) -> PhotoPage {
        PhotoPage {
            page: self.page,
            per_page: self.per_page,
            photos: self
                .photos
                .into_iter()
                .map(|photo| photo.into_photo(size))
                .collect(),
            total_results: self.total_results,
            next_page: self.next_page,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiPhoto {
    pub id: PhotoId,
    #[serde(default)]
    pub photographer: String,
    pub src: PhotoSources,
}

impl ApiPhoto {
    pub fn into_photo(self, size: ImageSize) -> Photo {
        let image_url = self.src.url(size).to_owned();
        Photo {
            id: self.id,
            image_url,
            photographer: self.photographer,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PhotoSources {
    pub original: String,
    pub large2x: String,
    pub large: String,
    pub medium: String,
    pub small: String,
    pub portrait: String,
    pub landscape: String,
    pub tiny: String,
}

impl PhotoSources {
    /// Requested rendition, or the original when the API left it out.
    pub fn url(&self, size: ImageSize) -> &str {
        let picked = match size {
            ImageSize::Original => &self.original,
            ImageSize::Large2x => &self.large2x,
            ImageSize::Large => &self.large,
            ImageSize::Medium => &self.medium,
            ImageSize::Small => &self.small,
            ImageSize::Portrait => &self.portrait,
            ImageSize::Landscape => &self.landscape,
            ImageSize::Tiny => &self.tiny,
        };
        if picked.is_empty() {
            &self.original
        } else {
            picked
        }
    }
}

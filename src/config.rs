use std::fmt;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use serde::de::{self, Deserializer};

use crate::photo::ImageSize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Remote photo API settings.
    pub api: ApiOptions,
    /// Photos requested per page.
    pub page_size: u32,
    /// Position of the sentinel image counted from the end of the grid.
    pub sentinel_offset: usize,
    /// Deferred image loading.
    pub lazy_load: LazyLoadOptions,
    /// How long inline notices stay up.
    #[serde(with = "humantime_serde")]
    pub notice_duration: Duration,
    /// Initial size of the headless viewport.
    pub viewport: ViewportOptions,
    /// Tile grid geometry.
    pub layout: LayoutOptions,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(self.page_size > 0, "page-size must be greater than zero");
        ensure!(
            self.sentinel_offset > 0,
            "sentinel-offset must be greater than zero"
        );
        ensure!(
            self.notice_duration > Duration::ZERO,
            "notice-duration must be positive"
        );
        self.api.validate().context("invalid api configuration")?;
        self.lazy_load.validate()?;
        self.viewport.validate()?;
        self.layout.validate()?;
        Ok(self)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            api: ApiOptions::default(),
            page_size: 12,
            sentinel_offset: 3,
            lazy_load: LazyLoadOptions::default(),
            notice_duration: Duration::from_secs(2),
            viewport: ViewportOptions::default(),
            layout: LayoutOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ApiOptions {
    /// Endpoint root; `curated` and `search` are resolved against it.
    pub base_url: String,
    /// Key sent in the `Authorization` header. Takes precedence over `api-key-env`.
    pub api_key: Option<String>,
    /// Environment variable consulted when `api-key` is unset.
    pub api_key_env: String,
    /// Rendition used for the grid.
    pub image_size: ImageSize,
    /// Per-request timeout. Unset means requests may hang indefinitely.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
}

impl ApiOptions {
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.to_owned());
        }
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .with_context(|| {
                format!(
                    "no api key: set api.api-key or the {} environment variable",
                    self.api_key_env
                )
            })
    }

    fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.base_url)
            .with_context(|| format!("base-url {:?} is not a valid url", self.base_url))?;
        ensure!(
            matches!(parsed.scheme(), "http" | "https"),
            "base-url must use http or https"
        );
        if let Some(timeout) = self.request_timeout {
            ensure!(timeout > Duration::ZERO, "request-timeout must be positive");
        }
        Ok(())
    }
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            base_url: "https://api.pexels.com/v1/".to_owned(),
            api_key: None,
            api_key_env: "PEXELS_API_KEY".to_owned(),
            image_size: ImageSize::default(),
            request_timeout: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LazyLoadMode {
    /// Use intersection observation when the surface supports it.
    #[default]
    Auto,
    Intersection,
    Fallback,
}

impl LazyLoadMode {
    const ALL: &'static [Self] = &[Self::Auto, Self::Intersection, Self::Fallback];
    const NAMES: &'static [&'static str] = &["auto", "intersection", "fallback"];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Intersection => "intersection",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for LazyLoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LazyLoadMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        for mode in Self::ALL {
            if raw == mode.as_str() {
                return Ok(*mode);
            }
        }
        Err(de::Error::unknown_variant(&raw, Self::NAMES))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LazyLoadOptions {
    pub mode: LazyLoadMode,
    /// Visible fraction of an image that counts as an intersection.
    pub threshold: f32,
    /// Extra pixels around the viewport treated as visible.
    pub root_margin: f32,
    /// Quiet period before the fallback sweep runs.
    #[serde(with = "humantime_serde")]
    pub debounce: Duration,
}

impl LazyLoadOptions {
    fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.threshold),
            "lazy-load.threshold must be within [0, 1]"
        );
        ensure!(
            self.root_margin.is_finite(),
            "lazy-load.root-margin must be finite"
        );
        Ok(())
    }
}

impl Default for LazyLoadOptions {
    fn default() -> Self {
        Self {
            mode: LazyLoadMode::default(),
            threshold: 0.1,
            root_margin: 0.0,
            debounce: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ViewportOptions {
    pub width: f32,
    pub height: f32,
}

impl ViewportOptions {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.width > 0.0 && self.height > 0.0,
            "viewport width and height must be positive"
        );
        Ok(())
    }
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LayoutOptions {
    pub columns: usize,
    pub tile_height: f32,
    pub gap: f32,
}

impl LayoutOptions {
    fn validate(&self) -> Result<()> {
        ensure!(self.columns >= 1, "layout.columns must be >= 1");
        ensure!(self.tile_height > 0.0, "layout.tile-height must be positive");
        ensure!(self.gap >= 0.0, "layout.gap must not be negative");
        Ok(())
    }
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            columns: 3,
            tile_height: 320.0,
            gap: 16.0,
        }
    }
}

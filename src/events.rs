use crate::gallery::ImageId;

/// Render requests from the pagination task, applied in order by the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    ShowLoading,
    HideLoading,
    AppendPhoto {
        image_url: String,
        photographer: Option<String>,
    },
    Notice(String),
}

/// Sent back by the viewer once it has applied a batch through its `HideLoading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRendered;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Initial,
    Scroll,
    Search,
}

/// Ask the pagination task for the next page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadMore {
    pub source: TriggerSource,
}

impl LoadMore {
    pub const fn new(source: TriggerSource) -> Self {
        Self { source }
    }
}

/// Host input delivered to the viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Scroll { dy: f32 },
    Resize { width: f32, height: f32 },
    OrientationChange { width: f32, height: f32 },
    Click { image: ImageId },
    CloseOverlay,
    SubmitSearch,
}

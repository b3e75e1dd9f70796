pub mod config;
pub mod error;
pub mod events;
pub mod feed;
pub mod gallery;
pub mod geometry;
pub mod layout;
pub mod lazy_load;
pub mod pagination;
pub mod photo;
pub mod scroll;
#[doc(hidden)]
pub mod testkit;
pub mod tasks {
    pub mod autoscroll;
    pub mod pagination;
    pub mod viewer;
}

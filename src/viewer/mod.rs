//! Catalog viewer: controller, zoom/pan transform, and page presentation

pub mod controller;
pub mod presenter;
pub mod transform;

pub use controller::{CatalogViewer, ViewerAction, ViewerPhase};
pub use presenter::{PageView, view_mapping};
pub use transform::{Transform, ZoomConfig};

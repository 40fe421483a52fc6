pub mod mouse_tracker;

pub use mouse_tracker::{ClickType, MouseTracker};

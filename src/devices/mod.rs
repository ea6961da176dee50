//! Device drivers using the platform abstraction

pub mod wt2605c;

pub use wt2605c::{PlaybackMode, Wt2605c};

//! Core abstraction traits

pub mod sync;

pub use sync::{ModuleState, MockState, SharedState};

#[cfg(feature = "embassy")]
pub use sync::EmbassyState;

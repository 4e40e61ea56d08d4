//! Progressive-session lifecycle state.

mod progressive;

pub use progressive::{ProgressiveSession, SessionConfig, ZOOM_RATE};

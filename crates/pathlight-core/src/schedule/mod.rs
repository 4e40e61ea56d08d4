//! Render scheduling.
//!
//! The scheduler reconciles external events with the render/accumulate
//! cycle: it owns the session state, the jitter grid, and the film pair,
//! coalesces parameter changes into at most one pending submission per tick,
//! and self-schedules while progressive refinement is enabled.

mod event;
mod scheduler;

pub use event::ViewEvent;
pub use scheduler::{
    DirtyUniforms, FrameOutcome, FrameSnapshot, RenderScheduler, SchedulerPhase,
};

//! Pathlight core crate.
//!
//! GPU-free control state for a progressive stochastic renderer: the
//! stratified-jitter sample grid, the uniform blocks pushed to the device,
//! the ping-pong accumulation film pair, and the scheduler that reconciles
//! user events with the render/accumulate cycle.
//!
//! The GPU itself is a collaborator, not a concern of this crate: the host
//! supplies film buffers and render/copy closures, and arms its own
//! "run on next frame" primitive whenever the scheduler asks for one.

pub mod film;
pub mod sampling;
pub mod schedule;
pub mod session;
pub mod uniforms;

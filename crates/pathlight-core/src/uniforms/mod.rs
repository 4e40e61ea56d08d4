//! Uniform state pushed to the device.
//!
//! Two fixed-layout blocks, each uploaded as one contiguous write: the
//! float block (camera/shading) and the integer block (sampling/frame).
//! Mode selectors are enums so an out-of-range index cannot be constructed;
//! the numeric encodings match what the shaders expect.

mod blocks;
mod modes;

pub use blocks::{RenderUniforms, SamplingUniforms};
pub use modes::{AddressMode, FilterMode, ShaderMode};

//! Stratified sub-pixel jitter sampling.
//!
//! One pixel is divided into a grid of equal cells and one uniform random
//! offset is drawn per cell. A fresh grid is generated whole whenever the
//! subdivision factor or the pixel size changes; grids are never patched
//! in place.

mod grid;

pub use grid::{MAX_SUBDIVISIONS, SampleGrid};

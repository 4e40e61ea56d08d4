//! Ping-pong accumulation films.
//!
//! Two same-extent buffers: a render *source* written each cycle and a read
//! *destination* holding the previous cycle's result. The pair enforces the
//! one invariant that keeps progressive blending honest: after every cycle
//! the destination is a full copy of the source, made exactly once.

mod pair;

pub use pair::{AccumulationPair, Extent, FilmBuffer, FilmError};

use std::fmt;

use thiserror::Error;

/// Film dimensions in pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Configuration errors detected by the film pair.
#[derive(Debug, Error)]
pub enum FilmError {
    /// The two films must always match; a mismatched pair would silently
    /// truncate the copy, so construction refuses it outright.
    #[error("accumulation films have mismatched extents: {src} vs {dst}")]
    ExtentMismatch { src: Extent, dst: Extent },
}

/// Anything that can serve as one side of the accumulation pair.
///
/// The viewer implements this for a GPU texture wrapper; tests use a plain
/// CPU pixel vector.
pub trait FilmBuffer {
    fn extent(&self) -> Extent;
}

/// Source/destination film pair driving progressive accumulation.
///
/// Only the source is ever rendered into; the destination is written solely
/// by the end-of-cycle copy, so it always reflects the state as of the end
/// of the previous submission.
#[derive(Debug)]
pub struct AccumulationPair<B> {
    source: B,
    destination: B,
    extent: Extent,
}

impl<B: FilmBuffer> AccumulationPair<B> {
    /// Pairs two films, failing fast on an extent mismatch.
    pub fn new(source: B, destination: B) -> Result<Self, FilmError> {
        let src = source.extent();
        let dst = destination.extent();
        if src != dst {
            return Err(FilmError::ExtentMismatch { src, dst });
        }

        Ok(Self {
            source,
            destination,
            extent: src,
        })
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn source(&self) -> &B {
        &self.source
    }

    pub fn destination(&self) -> &B {
        &self.destination
    }

    /// Runs one accumulation cycle.
    ///
    /// `render` draws into the source film while reading the destination;
    /// `copy` then propagates the source into the destination for the next
    /// cycle. The copy is unconditional and happens exactly once — unless
    /// `render` fails, in which case the destination is left untouched and
    /// the error is surfaced to the caller.
    pub fn advance<C, E>(
        &mut self,
        ctx: &mut C,
        render: impl FnOnce(&mut C, &mut B, &B) -> Result<(), E>,
        copy: impl FnOnce(&mut C, &B, &mut B),
    ) -> Result<(), E> {
        render(ctx, &mut self.source, &self.destination)?;
        copy(ctx, &self.source, &mut self.destination);
        Ok(())
    }
}

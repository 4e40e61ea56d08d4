use crate::uniforms::{AddressMode, FilterMode, ShaderMode};

/// External triggers the reconciler maps onto session mutations.
///
/// The host translates its input source (wheel deltas, menu selections,
/// button presses) into these; the scheduler decides what each one
/// invalidates and whether a new submission is needed.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ViewEvent {
    /// Wheel/zoom delta; scales the camera constant.
    Zoom { delta: f32 },

    SetShaderMode(ShaderMode),
    SetAddressMode(AddressMode),
    SetFilterMode(FilterMode),

    /// Saturating subdivision step; regenerates the jitter grid.
    IncreaseSubdivisions,
    DecreaseSubdivisions,

    /// Pauses/resumes progressive refinement without restarting
    /// accumulation.
    ToggleProgressive,
}

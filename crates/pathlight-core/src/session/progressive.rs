use crate::sampling::MAX_SUBDIVISIONS;
use crate::uniforms::{AddressMode, FilterMode, RenderUniforms, SamplingUniforms, ShaderMode};

/// Camera-constant multiplier per unit of wheel delta.
pub const ZOOM_RATE: f32 = 2.5e-4;

/// Initial session parameters.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub aspect: f32,
    pub cam_const: f32,
    pub gamma: f32,
    pub shader_mode: ShaderMode,
    pub address_mode: AddressMode,
    pub filter_mode: FilterMode,
    pub subdivisions: u32,
    pub progressive: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            aspect: 1.0,
            cam_const: 1.0,
            gamma: 1.0,
            shader_mode: ShaderMode::default(),
            address_mode: AddressMode::default(),
            filter_mode: FilterMode::default(),
            subdivisions: 1,
            progressive: true,
        }
    }
}

/// Scalar state for one rendering session.
///
/// Created once at startup and mutated through the scheduler for the
/// lifetime of the view; the accumulation frame counter resets whenever a
/// parameter that invalidates the accumulated average changes.
#[derive(Debug, Clone)]
pub struct ProgressiveSession {
    aspect: f32,
    cam_const: f32,
    gamma: f32,
    shader_mode: ShaderMode,
    address_mode: AddressMode,
    filter_mode: FilterMode,
    subdivisions: u32,
    frame: u32,
    progressive: bool,
}

impl ProgressiveSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            aspect: config.aspect,
            cam_const: config.cam_const,
            gamma: config.gamma,
            shader_mode: config.shader_mode,
            address_mode: config.address_mode,
            filter_mode: config.filter_mode,
            subdivisions: config.subdivisions.clamp(1, MAX_SUBDIVISIONS),
            frame: 0,
            progressive: config.progressive,
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn cam_const(&self) -> f32 {
        self.cam_const
    }

    pub fn shader_mode(&self) -> ShaderMode {
        self.shader_mode
    }

    pub fn address_mode(&self) -> AddressMode {
        self.address_mode
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.filter_mode
    }

    pub fn subdivisions(&self) -> u32 {
        self.subdivisions
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn progressive(&self) -> bool {
        self.progressive
    }

    /// Float uniform block in its device layout.
    pub fn render_uniforms(&self) -> RenderUniforms {
        RenderUniforms {
            aspect: self.aspect,
            cam_const: self.cam_const,
            gamma: self.gamma,
            shader_mode: self.shader_mode.index() as f32,
        }
    }

    /// Integer uniform block in its device layout.
    pub fn sampling_uniforms(&self) -> SamplingUniforms {
        SamplingUniforms {
            address_mode: self.address_mode.index(),
            filter_mode: self.filter_mode.index(),
            sample_count: self.subdivisions * self.subdivisions,
            frame: self.frame,
        }
    }

    // ── mutation (scheduler-driven) ───────────────────────────────────────

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Applies a wheel delta: `cam_const *= 1 + ZOOM_RATE * delta`.
    pub fn zoom(&mut self, delta: f32) {
        self.cam_const *= 1.0 + ZOOM_RATE * delta;
    }

    pub fn set_shader_mode(&mut self, mode: ShaderMode) {
        self.shader_mode = mode;
    }

    pub fn set_address_mode(&mut self, mode: AddressMode) {
        self.address_mode = mode;
    }

    pub fn set_filter_mode(&mut self, mode: FilterMode) {
        self.filter_mode = mode;
    }

    /// Saturating step up, clamped at [`MAX_SUBDIVISIONS`].
    pub fn increment_subdivisions(&mut self) {
        if self.subdivisions < MAX_SUBDIVISIONS {
            self.subdivisions += 1;
        }
    }

    /// Saturating step down, clamped at 1.
    pub fn decrement_subdivisions(&mut self) {
        if self.subdivisions > 1 {
            self.subdivisions -= 1;
        }
    }

    /// Flips the progressive flag; returns the new value.
    ///
    /// The frame counter is intentionally left alone so accumulation pauses
    /// and resumes in place.
    pub fn toggle_progressive(&mut self) -> bool {
        self.progressive = !self.progressive;
        self.progressive
    }

    /// Restarts accumulation from frame 0.
    pub fn reset_accumulation(&mut self) {
        self.frame = 0;
    }

    /// Advances the accumulation counter after a successful submission.
    pub fn advance_frame(&mut self) {
        self.frame += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── zoom ──────────────────────────────────────────────────────────────

    #[test]
    fn wheel_delta_scales_cam_const() {
        let mut session = ProgressiveSession::new(SessionConfig::default());
        session.zoom(100.0);
        assert!((session.cam_const() - 1.025).abs() < 1e-6);
    }

    // ── subdivisions ──────────────────────────────────────────────────────

    #[test]
    fn subdivisions_saturate_at_bounds() {
        let mut session = ProgressiveSession::new(SessionConfig {
            subdivisions: 1,
            ..Default::default()
        });

        session.decrement_subdivisions();
        assert_eq!(session.subdivisions(), 1);

        for _ in 0..30 {
            session.increment_subdivisions();
        }
        assert_eq!(session.subdivisions(), MAX_SUBDIVISIONS);
    }

    #[test]
    fn config_subdivisions_clamped() {
        let session = ProgressiveSession::new(SessionConfig {
            subdivisions: 99,
            ..Default::default()
        });
        assert_eq!(session.subdivisions(), MAX_SUBDIVISIONS);
    }

    // ── uniform blocks ────────────────────────────────────────────────────

    #[test]
    fn sampling_block_carries_sample_count() {
        let mut session = ProgressiveSession::new(SessionConfig {
            subdivisions: 3,
            ..Default::default()
        });
        assert_eq!(session.sampling_uniforms().sample_count, 9);

        session.increment_subdivisions();
        assert_eq!(session.sampling_uniforms().sample_count, 16);
    }

    #[test]
    fn toggle_preserves_frame_counter() {
        let mut session = ProgressiveSession::new(SessionConfig::default());
        for _ in 0..42 {
            session.advance_frame();
        }

        session.toggle_progressive();
        session.toggle_progressive();
        assert_eq!(session.frame(), 42);
    }
}

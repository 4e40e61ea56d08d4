use bytemuck::{Pod, Zeroable};

/// Float uniform block: camera and shading parameters.
///
/// `aspect` is fixed for the life of a surface size; the rest are mutable.
/// The whole block is written to the device whenever any field changes.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct RenderUniforms {
    /// Surface width / height.
    pub aspect: f32,
    /// Camera constant (focal scale); wheel zoom multiplies this.
    pub cam_const: f32,
    pub gamma: f32,
    /// `ShaderMode` index, stored as a float lane for the shader's switch.
    pub shader_mode: f32,
}

/// Integer uniform block: sampling parameters and the accumulation frame.
///
/// `frame` increments by exactly one per successful submission while
/// progressive accumulation runs; frame 0 tells the shader to discard the
/// previously accumulated average instead of blending into it.
#[repr(C)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Pod, Zeroable)]
pub struct SamplingUniforms {
    pub address_mode: u32,
    pub filter_mode: u32,
    /// `subdivisions²`, the jitter buffer's live length.
    pub sample_count: u32,
    pub frame: u32,
}

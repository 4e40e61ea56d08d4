/// Shading model selector.
///
/// Discriminants are the 1-based indices the shader switches on.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderMode {
    Lambertian = 1,
    Phong = 2,
    Mirror = 3,
    Transmissive = 4,
    PathTraced = 5,
}

impl ShaderMode {
    pub const ALL: [ShaderMode; 5] = [
        ShaderMode::Lambertian,
        ShaderMode::Phong,
        ShaderMode::Mirror,
        ShaderMode::Transmissive,
        ShaderMode::PathTraced,
    ];

    /// Shader-facing index.
    pub fn index(self) -> u32 {
        self as u32
    }
}

impl Default for ShaderMode {
    fn default() -> Self {
        ShaderMode::PathTraced
    }
}

/// Texture address mode selector (0-based shader index).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum AddressMode {
    #[default]
    Clamp = 0,
    Repeat = 1,
}

impl AddressMode {
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Cycles to the next mode (menu-style stepping).
    pub fn next(self) -> Self {
        match self {
            AddressMode::Clamp => AddressMode::Repeat,
            AddressMode::Repeat => AddressMode::Clamp,
        }
    }
}

/// Texture filter mode selector (0-based shader index).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum FilterMode {
    #[default]
    Nearest = 0,
    Linear = 1,
}

impl FilterMode {
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Cycles to the next mode.
    pub fn next(self) -> Self {
        match self {
            FilterMode::Nearest => FilterMode::Linear,
            FilterMode::Linear => FilterMode::Nearest,
        }
    }
}

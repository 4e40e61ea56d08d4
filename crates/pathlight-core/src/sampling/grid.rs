/// Upper bound on the subdivision factor (10 → 100 samples per pixel).
pub const MAX_SUBDIVISIONS: u32 = 10;

/// Ordered set of `(dx, dy)` sub-pixel offsets for stratified sampling.
///
/// The grid length is always `subdivisions²`. For a subdivision factor of 1
/// it degenerates to the single centered offset `(0, 0)`; otherwise each of
/// the `s × s` cells contributes one offset drawn uniformly within the cell,
/// with the whole grid centered on the pixel.
#[derive(Debug, Clone)]
pub struct SampleGrid {
    offsets: Vec<[f32; 2]>,
    subdivisions: u32,
    pixel_size: f32,
}

impl SampleGrid {
    /// Generates a fresh grid for `subdivisions × subdivisions` cells.
    ///
    /// `subdivisions` outside `[1, MAX_SUBDIVISIONS]` is clamped, never an
    /// error. Offsets are not reproducible across calls; jitter differs per
    /// regeneration by design of the sampling scheme.
    pub fn generate(pixel_size: f32, subdivisions: u32) -> Self {
        let subdivisions = subdivisions.clamp(1, MAX_SUBDIVISIONS);
        let mut offsets = Vec::with_capacity((subdivisions * subdivisions) as usize);

        if subdivisions < 2 {
            offsets.push([0.0, 0.0]);
        } else {
            let step = pixel_size / subdivisions as f32;
            let half = pixel_size * 0.5;

            for i in 0..subdivisions {
                for j in 0..subdivisions {
                    let dx = (rand::random_range(0.0f32..1.0) + j as f32) * step - half;
                    let dy = (rand::random_range(0.0f32..1.0) + i as f32) * step - half;
                    offsets.push([dx, dy]);
                }
            }
        }

        Self {
            offsets,
            subdivisions,
            pixel_size,
        }
    }

    /// Offsets in cell order (row-major over `(i, j)`).
    pub fn offsets(&self) -> &[[f32; 2]] {
        &self.offsets
    }

    /// Number of offsets (`subdivisions²`).
    pub fn sample_count(&self) -> u32 {
        self.offsets.len() as u32
    }

    pub fn subdivisions(&self) -> u32 {
        self.subdivisions
    }

    pub fn pixel_size(&self) -> f32 {
        self.pixel_size
    }

    /// Raw byte view for a GPU buffer upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.offsets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── counts ────────────────────────────────────────────────────────────

    #[test]
    fn count_is_subdivisions_squared() {
        for s in 1..=MAX_SUBDIVISIONS {
            let grid = SampleGrid::generate(0.01, s);
            assert_eq!(grid.sample_count(), s * s);
            assert_eq!(grid.offsets().len(), (s * s) as usize);
        }
    }

    #[test]
    fn subdivisions_clamped_high() {
        let grid = SampleGrid::generate(0.01, 37);
        assert_eq!(grid.subdivisions(), MAX_SUBDIVISIONS);
        assert_eq!(grid.sample_count(), MAX_SUBDIVISIONS * MAX_SUBDIVISIONS);
    }

    #[test]
    fn subdivisions_clamped_low() {
        let grid = SampleGrid::generate(0.01, 0);
        assert_eq!(grid.subdivisions(), 1);
        assert_eq!(grid.offsets(), &[[0.0, 0.0]]);
    }

    // ── offsets ───────────────────────────────────────────────────────────

    #[test]
    fn single_subdivision_is_centered() {
        let grid = SampleGrid::generate(1.0 / 512.0, 1);
        assert_eq!(grid.offsets(), &[[0.0, 0.0]]);
    }

    #[test]
    fn offsets_stay_within_half_pixel() {
        let pixel_size = 1.0 / 512.0;
        for s in 2..=MAX_SUBDIVISIONS {
            let grid = SampleGrid::generate(pixel_size, s);
            for [dx, dy] in grid.offsets() {
                assert!(dx.abs() <= pixel_size * 0.5, "dx {dx} out of range at s={s}");
                assert!(dy.abs() <= pixel_size * 0.5, "dy {dy} out of range at s={s}");
            }
        }
    }

    #[test]
    fn offsets_are_stratified_per_cell() {
        // Each cell's offset must land inside that cell, not just the pixel.
        let pixel_size = 1.0;
        let s = 4u32;
        let step = pixel_size / s as f32;
        let grid = SampleGrid::generate(pixel_size, s);

        for i in 0..s {
            for j in 0..s {
                let [dx, dy] = grid.offsets()[(i * s + j) as usize];
                let x0 = j as f32 * step - pixel_size * 0.5;
                let y0 = i as f32 * step - pixel_size * 0.5;
                assert!(dx >= x0 && dx <= x0 + step, "cell ({i},{j}) dx {dx}");
                assert!(dy >= y0 && dy <= y0 + step, "cell ({i},{j}) dy {dy}");
            }
        }
    }

    #[test]
    fn byte_view_covers_all_offsets() {
        let grid = SampleGrid::generate(0.01, 3);
        assert_eq!(grid.as_bytes().len(), 9 * 2 * std::mem::size_of::<f32>());
    }
}

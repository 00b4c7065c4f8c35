use glam::UVec2;

/// Low-discrepancy sampler driven by precomputed sampling tables.
///
/// Tables follow the layout of Heitz et al.'s "A Low-Discrepancy Sampler that
/// Distributes Monte Carlo Errors as a Blue Noise in Screen Space":
///
/// - `sequence` holds 256 samples of 256 dimensions, 8 bits each,
/// - `scrambling_tile` and `ranking_tile` hold 8 values per pixel of a 128x128
///   tile that's repeated across the screen.
#[derive(Clone, Copy)]
pub struct BlueNoise<'a> {
    sequence: &'a [u32],
    scrambling_tile: &'a [u32],
    ranking_tile: &'a [u32],
}

impl<'a> BlueNoise<'a> {
    pub const SAMPLES: u32 = 256;
    pub const DIMENSIONS: u32 = 256;
    pub const TILE_SIZE: u32 = 128;
    pub const TILE_DIMENSIONS: u32 = 8;

    pub const SEQUENCE_LEN: usize = (Self::SAMPLES * Self::DIMENSIONS) as usize;

    pub const TILE_LEN: usize =
        (Self::TILE_SIZE * Self::TILE_SIZE * Self::TILE_DIMENSIONS) as usize;

    pub fn new(
        sequence: &'a [u32],
        scrambling_tile: &'a [u32],
        ranking_tile: &'a [u32],
    ) -> Self {
        Self {
            sequence,
            scrambling_tile,
            ranking_tile,
        }
    }

    /// Returns a sample in range `(0.0, 1.0)`; all arguments wrap around the
    /// tables' extents.
    pub fn sample(self, pixel: UVec2, sample_idx: u32, dimension: u32) -> f32 {
        let x = pixel.x & (Self::TILE_SIZE - 1);
        let y = pixel.y & (Self::TILE_SIZE - 1);
        let sample_idx = sample_idx & (Self::SAMPLES - 1);
        let dimension = dimension & (Self::DIMENSIONS - 1);

        let tile_idx = (dimension % Self::TILE_DIMENSIONS
            + (x + y * Self::TILE_SIZE) * Self::TILE_DIMENSIONS)
            as usize;

        let ranked_sample_idx = sample_idx ^ self.ranking_tile[tile_idx];

        let value = self.sequence
            [(dimension + ranked_sample_idx * Self::DIMENSIONS) as usize];

        let value = value ^ self.scrambling_tile[tile_idx];

        (0.5 + value as f32) / 256.0
    }
}

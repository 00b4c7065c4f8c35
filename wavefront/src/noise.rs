use log::info;

use crate::gpu::BlueNoise;

/// Sampling tables consumed by [`BlueNoise`], taken from Heitz et al.'s
/// 2-spp optimized sampler.
#[derive(Clone, Debug)]
pub struct SamplingTables {
    pub sequence: Vec<u32>,
    pub scrambling_tile: Vec<u32>,
    pub ranking_tile: Vec<u32>,
}

impl SamplingTables {
    pub fn new() -> Self {
        use blue_noise_sampler::spp2 as bn;

        info!("Loading sampling tables");

        Self {
            sequence: bn::SOBOL.iter().map(|&v| v as u32).collect(),
            scrambling_tile: bn::SCRAMBLING_TILE
                .iter()
                .map(|&v| v as u32)
                .collect(),
            ranking_tile: bn::RANKING_TILE.iter().map(|&v| v as u32).collect(),
        }
    }

    /// Returns a sampler reading from these tables.
    pub fn sampler(&self) -> BlueNoise<'_> {
        BlueNoise::new(
            &self.sequence,
            &self.scrambling_tile,
            &self.ranking_tile,
        )
    }
}

impl Default for SamplingTables {
    fn default() -> Self {
        Self::new()
    }
}

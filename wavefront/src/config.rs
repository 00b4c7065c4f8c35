use glam::{uvec2, UVec2};

use crate::{Error, Result};

/// Configuration of an [`crate::Integrator`]; fixed for its entire lifetime.
#[derive(Clone, Debug, PartialEq)]
pub struct IntegratorConfig {
    pub width: u32,
    pub height: u32,

    /// Number of bounces performed per progressive frame; zero means that
    /// primary rays get generated, but never traced.
    pub max_bounces: u32,

    /// Seed of the generator that provides per-frame seeds for ray
    /// generation; two integrators with the same seed, scene and camera
    /// produce identical images.
    pub seed: u64,

    /// Bounce starting from which paths become subject to Russian roulette.
    pub roulette_start: u32,
}

impl IntegratorConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn with_max_bounces(mut self, max_bounces: u32) -> Self {
        self.max_bounces = max_bounces;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_roulette_start(mut self, roulette_start: u32) -> Self {
        self.roulette_start = roulette_start;
        self
    }

    pub fn size(&self) -> UVec2 {
        uvec2(self.width, self.height)
    }

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "resolution must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }

        // Ray streams hold two `Vec4`s per ray, so their size in bytes must
        // still fit in an `u32`-indexed buffer
        let fits = self
            .width
            .checked_mul(self.height)
            .and_then(|n| n.checked_mul(32))
            .is_some();

        if !fits {
            return Err(Error::InvalidConfig(format!(
                "resolution is too large: {}x{}",
                self.width, self.height
            )));
        }

        Ok(())
    }

    pub(crate) fn describe(&self) -> String {
        format!(
            "{}x{}, max_bounces={}, seed={}",
            self.width, self.height, self.max_bounces, self.seed
        )
    }
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            max_bounces: 4,
            seed: 0,
            roulette_start: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate() {
        assert!(IntegratorConfig::default().validate().is_ok());
        assert!(IntegratorConfig::new(1, 1).validate().is_ok());
        assert!(IntegratorConfig::new(0, 16).validate().is_err());
        assert!(IntegratorConfig::new(16, 0).validate().is_err());
        assert!(IntegratorConfig::new(65536, 65536).validate().is_err());
    }

    #[test]
    fn builder() {
        let config = IntegratorConfig::new(4, 2)
            .with_max_bounces(7)
            .with_seed(1234)
            .with_roulette_start(1);

        assert_eq!(8, config.pixel_count());
        assert_eq!(uvec2(4, 2), config.size());
        assert_eq!(7, config.max_bounces);
        assert_eq!(1234, config.seed);
        assert_eq!(1, config.roulette_start);
    }
}

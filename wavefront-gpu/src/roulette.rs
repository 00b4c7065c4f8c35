use glam::Vec3;

/// Russian-roulette path termination.
///
/// Starting from bounce `start_bounce`, a path survives with probability
/// proportional to its throughput's largest component, clamped into
/// `[MIN_SURVIVAL, MAX_SURVIVAL]`; survivors get their throughput divided by
/// that probability so that the estimator stays unbiased.
#[derive(Clone, Copy, Debug)]
pub struct RussianRoulette {
    pub start_bounce: u32,
}

impl RussianRoulette {
    pub const MIN_SURVIVAL: f32 = 0.05;
    pub const MAX_SURVIVAL: f32 = 0.95;

    pub fn new(start_bounce: u32) -> Self {
        Self { start_bounce }
    }

    pub fn survival_probability(self, bounce: u32, throughput: Vec3) -> f32 {
        if bounce < self.start_bounce {
            return 1.0;
        }

        throughput
            .max_element()
            .clamp(Self::MIN_SURVIVAL, Self::MAX_SURVIVAL)
    }

    /// Returns the adjusted throughput if the path survives, `None` if it gets
    /// terminated; `u` is a uniform number from `<0.0, 1.0)`.
    pub fn apply(self, bounce: u32, throughput: Vec3, u: f32) -> Option<Vec3> {
        if throughput.max_element() <= 0.0 {
            return None;
        }

        let p = self.survival_probability(bounce, throughput);

        if u >= p {
            return None;
        }

        Some(throughput / p)
    }
}

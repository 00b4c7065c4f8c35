use std::fmt;

use derivative::Derivative;
use glam::{Vec3, Vec4, Vec4Swizzles};
use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{
    gpu, AccelerationStructure, BruteForceAccel, Camera, Device, Error,
    IntegratorBuffers, IntegratorConfig, IntegratorPasses, Result, Scene,
};

/// Where the integrator is within a progressive frame.
///
/// A frame always walks the same path:
///
/// ```text
/// Idle
///   -> Generated
///   -> (Intersecting -> MissShaded -> CounterCleared -> HitShaded) * bounces
///   -> SampleAdvanced
///   -> Resolved
/// ```
///
/// `Resolved` is equivalent to `Idle`, i.e. both mean "between frames".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Generated,
    Intersecting { bounce: u32 },
    MissShaded { bounce: u32 },
    CounterCleared { bounce: u32 },
    HitShaded { bounce: u32 },
    SampleAdvanced,
    Resolved,

    /// A device operation failed mid-frame; only [`Integrator::reset()`] can
    /// leave this state.
    Faulted,
}

impl FrameState {
    pub fn is_between_frames(self) -> bool {
        matches!(self, Self::Idle | Self::Resolved)
    }
}

impl fmt::Display for FrameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Generated => write!(f, "generated"),
            Self::Intersecting { bounce } => {
                write!(f, "intersecting (bounce {bounce})")
            }
            Self::MissShaded { bounce } => {
                write!(f, "miss-shaded (bounce {bounce})")
            }
            Self::CounterCleared { bounce } => {
                write!(f, "counter-cleared (bounce {bounce})")
            }
            Self::HitShaded { bounce } => {
                write!(f, "hit-shaded (bounce {bounce})")
            }
            Self::SampleAdvanced => write!(f, "sample-advanced"),
            Self::Resolved => write!(f, "resolved"),
            Self::Faulted => write!(f, "faulted"),
        }
    }
}

/// Wavefront path tracer: schedules the stages of a progressive frame and
/// keeps the ray streams, counters and accumulators consistent between them.
///
/// Each call to [`Self::integrate()`] adds one sample per pixel to the
/// accumulated image and resolves it into [`Self::surface()`]; the individual
/// stages are public as well, for callers that want to interleave their own
/// work (or inspect the streams) between them.
#[derive(Derivative)]
#[derivative(Debug(bound = "A: fmt::Debug"))]
pub struct Integrator<D, A = BruteForceAccel<D>>
where
    D: Device,
{
    device: D,
    config: IntegratorConfig,
    buffers: IntegratorBuffers<D>,
    passes: IntegratorPasses<D>,
    accel: A,
    camera: gpu::RaygenPassParams,
    #[derivative(Debug = "ignore")]
    rng: StdRng,
    state: FrameState,
}

impl<D> Integrator<D>
where
    D: Device,
{
    /// Creates an integrator that uses [`BruteForceAccel`] for intersections.
    pub fn new(device: D, config: IntegratorConfig) -> Result<Self> {
        let accel = BruteForceAccel::new(&device)?;

        Self::with_accel(device, config, accel)
    }
}

impl<D, A> Integrator<D, A>
where
    D: Device,
    A: AccelerationStructure<D>,
{
    pub fn with_accel(
        device: D,
        config: IntegratorConfig,
        accel: A,
    ) -> Result<Self> {
        config.validate()?;

        info!("Creating integrator: {}", config.describe());

        let buffers = IntegratorBuffers::new(&device, &config)?;
        let passes = IntegratorPasses::new(&device, &config, &buffers)?;

        // Until the first `set_camera_data()`, rays get generated from the
        // default camera
        let camera = Camera::default().serialize(&config, 0)?;

        let mut this = Self {
            rng: StdRng::seed_from_u64(config.seed),
            device,
            config,
            buffers,
            passes,
            accel,
            camera,
            state: FrameState::Idle,
        };

        this.reset()?;

        debug!("Integrator created");

        Ok(this)
    }

    /// Clears the radiance accumulator and the sample counter, restarting
    /// the accumulation.
    ///
    /// Allowed only between frames or when the pipeline is faulted.
    pub fn reset(&mut self) -> Result<()> {
        let is_allowed = self.state.is_between_frames()
            || self.state == FrameState::Faulted;

        if !is_allowed {
            return Err(Error::OutOfOrder {
                operation: "reset",
                state: self.state,
            });
        }

        debug!("Resetting accumulation");

        let result = self
            .passes
            .reset_radiance
            .run(&self.device, &self.config)
            .and_then(|_| {
                self.passes
                    .clear_counter
                    .run(&self.device, &self.buffers.sample_counter)
            });

        self.state = if result.is_ok() {
            FrameState::Idle
        } else {
            FrameState::Faulted
        };

        result
    }

    /// Updates the camera used by subsequent calls to
    /// [`Self::generate_rays()`], drawing a fresh seed for the frame.
    pub fn set_camera_data(&mut self, camera: &Camera) -> Result<()> {
        self.expect("set_camera_data", FrameState::is_between_frames)?;

        let camera_params = camera.serialize(&self.config, 0)?;

        self.camera = gpu::RaygenPassParams {
            seed: self.rng.gen(),
            ..camera_params
        };

        trace!(
            "Camera updated: {}; seed={}",
            camera.describe(),
            self.camera.seed
        );

        Ok(())
    }

    /// Binds scene's buffers into the stages that read them.
    ///
    /// Must be called after every upload of the scene, since stages keep
    /// referring to the buffers they were given here.
    pub fn set_scene_data(&mut self, scene: &Scene<D>) -> Result<()> {
        self.expect("set_scene_data", FrameState::is_between_frames)?;

        debug!("Rebinding scene");

        self.passes
            .shade_hit
            .set_geometry(&scene.triangles, &scene.materials)?;

        self.passes.shade_miss.set_environment(&scene.environment)?;
        self.accel.set_scene(&self.device, scene)?;

        Ok(())
    }

    /// Renders one progressive frame, adding a sample to every pixel.
    pub fn integrate(&mut self) -> Result<()> {
        #[cfg(feature = "metrics")]
        let tt = std::time::Instant::now();

        self.generate_rays()?;

        for bounce in 0..self.config.max_bounces {
            self.intersect_rays(bounce)?;
            self.shade_missed_rays(bounce)?;
            self.clear_outgoing_ray_counter(bounce)?;
            self.shade_surface_hits(bounce)?;
        }

        self.advance_sample_count()?;
        self.resolve_radiance()?;

        #[cfg(feature = "metrics")]
        info!(
            "Frame integrated; tt = {}",
            humantime::format_duration(tt.elapsed())
        );

        Ok(())
    }

    /// Fills the first ray stream with one primary ray per pixel.
    pub fn generate_rays(&mut self) -> Result<()> {
        self.step(
            "generate_rays",
            FrameState::is_between_frames,
            FrameState::Generated,
            |this| this.passes.raygen.run(&this.device, &this.camera),
        )
    }

    pub fn intersect_rays(&mut self, bounce: u32) -> Result<()> {
        let prev = self.prev_of_bounce(bounce);

        self.step(
            "intersect_rays",
            |state| Some(state) == prev,
            FrameState::Intersecting { bounce },
            |this| {
                let stream = this.buffers.streams.incoming(bounce);

                this.accel.intersect_rays(
                    &this.device,
                    &stream.rays,
                    &stream.counter,
                    this.config.pixel_count(),
                    &this.buffers.hits,
                )
            },
        )
    }

    pub fn shade_missed_rays(&mut self, bounce: u32) -> Result<()> {
        self.step(
            "shade_missed_rays",
            |state| state == FrameState::Intersecting { bounce },
            FrameState::MissShaded { bounce },
            |this| {
                this.passes.shade_miss.run(
                    &this.device,
                    &this.config,
                    &this.buffers,
                    bounce,
                )
            },
        )
    }

    pub fn clear_outgoing_ray_counter(&mut self, bounce: u32) -> Result<()> {
        self.step(
            "clear_outgoing_ray_counter",
            |state| state == FrameState::MissShaded { bounce },
            FrameState::CounterCleared { bounce },
            |this| {
                let stream = this.buffers.streams.outgoing(bounce);

                this.passes.clear_counter.run(&this.device, &stream.counter)
            },
        )
    }

    pub fn shade_surface_hits(&mut self, bounce: u32) -> Result<()> {
        self.step(
            "shade_surface_hits",
            |state| state == FrameState::CounterCleared { bounce },
            FrameState::HitShaded { bounce },
            |this| {
                this.passes.shade_hit.run(
                    &this.device,
                    &this.config,
                    &this.buffers,
                    bounce,
                )
            },
        )
    }

    pub fn advance_sample_count(&mut self) -> Result<()> {
        let prev = match self.config.max_bounces {
            0 => FrameState::Generated,
            n => FrameState::HitShaded { bounce: n - 1 },
        };

        self.step(
            "advance_sample_count",
            |state| state == prev,
            FrameState::SampleAdvanced,
            |this| this.passes.increment_counter.run(&this.device),
        )
    }

    /// Writes the average radiance into the surface and waits for the frame
    /// to complete.
    pub fn resolve_radiance(&mut self) -> Result<()> {
        self.step(
            "resolve_radiance",
            |state| state == FrameState::SampleAdvanced,
            FrameState::Resolved,
            |this| {
                let surface = &this.buffers.surface;

                this.device.acquire_surface(surface)?;

                let result = this
                    .passes
                    .resolve
                    .run(&this.device, &this.config)
                    .and_then(|_| this.device.finish());

                // Release even if the resolve failed, so that the presenting
                // layer doesn't get stuck on a surface it can't read
                let released = this.device.release_surface(surface);

                result.and(released)
            },
        )
    }

    /// Returns the state a given bounce's intersection must follow, or
    /// `None` if there's no such bounce.
    fn prev_of_bounce(&self, bounce: u32) -> Option<FrameState> {
        if bounce >= self.config.max_bounces {
            return None;
        }

        Some(match bounce {
            0 => FrameState::Generated,
            n => FrameState::HitShaded { bounce: n - 1 },
        })
    }

    fn expect(
        &self,
        operation: &'static str,
        is_expected: impl FnOnce(FrameState) -> bool,
    ) -> Result<()> {
        if self.state == FrameState::Faulted {
            return Err(Error::Faulted);
        }

        if !is_expected(self.state) {
            return Err(Error::OutOfOrder {
                operation,
                state: self.state,
            });
        }

        Ok(())
    }

    /// Runs a single stage, moving to `next` on success and to
    /// [`FrameState::Faulted`] on failure.
    fn step(
        &mut self,
        operation: &'static str,
        is_expected: impl FnOnce(FrameState) -> bool,
        next: FrameState,
        f: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        self.expect(operation, is_expected)?;

        trace!("Stage: {operation} ({} -> {next})", self.state);

        match f(self) {
            Ok(()) => {
                self.state = next;
                Ok(())
            }

            Err(err) => {
                self.state = FrameState::Faulted;
                Err(err)
            }
        }
    }
}

impl<D, A> Integrator<D, A>
where
    D: Device,
{
    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn config(&self) -> &IntegratorConfig {
        &self.config
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn accel(&self) -> &A {
        &self.accel
    }

    /// Surface the resolved image gets written into.
    pub fn surface(&self) -> &D::Surface {
        &self.buffers.surface
    }

    /// Reads back the live-ray counter of given stream slot (`0` or `1`).
    pub fn ray_count(&self, slot: u32) -> Result<u32> {
        self.read_u32(&self.buffers.streams.slot(slot).counter)
    }

    /// Reads back the number of accumulated samples per pixel.
    pub fn sample_count(&self) -> Result<u32> {
        self.read_u32(&self.buffers.sample_counter)
    }

    /// Reads back the (non-averaged) radiance accumulated for each pixel.
    pub fn radiance(&self) -> Result<Vec<Vec3>> {
        let bytes = self.device.read_buffer(&self.buffers.radiance)?;
        let texels: Vec<Vec4> = bytemuck::pod_collect_to_vec(&bytes);

        Ok(texels
            .into_iter()
            .take(self.config.pixel_count() as usize)
            .map(|texel| texel.xyz())
            .collect())
    }

    /// Reads back the resolved image, row by row.
    pub fn surface_texels(&self) -> Result<Vec<Vec4>> {
        self.device.read_surface(&self.buffers.surface)
    }

    fn read_u32(&self, buffer: &D::Buffer) -> Result<u32> {
        let bytes = self.device.read_buffer(buffer)?;
        let words: Vec<u32> = bytemuck::pod_collect_to_vec(&bytes);

        Ok(words.first().copied().unwrap_or_default())
    }
}

impl<D, A> Drop for Integrator<D, A>
where
    D: Device,
{
    fn drop(&mut self) {
        info!("Deleting integrator: {}", self.config.describe());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CpuDevice;

    #[test]
    fn frame_state_display() {
        assert_eq!("idle", FrameState::Idle.to_string());

        assert_eq!(
            "hit-shaded (bounce 2)",
            FrameState::HitShaded { bounce: 2 }.to_string()
        );
    }

    #[test]
    fn invalid_config() {
        let err = Integrator::new(CpuDevice::new(), IntegratorConfig::new(0, 4))
            .unwrap_err();

        assert!(matches!(err, Error::InvalidConfig(_)), "{err}");
    }

    #[test]
    fn starts_idle() {
        let target =
            Integrator::new(CpuDevice::new(), IntegratorConfig::new(2, 2))
                .unwrap();

        assert_eq!(FrameState::Idle, target.state());
        assert_eq!(0, target.sample_count().unwrap());
    }
}

mod double_buffered;

use std::mem;

use glam::Vec4;
use log::debug;

pub use self::double_buffered::*;
use crate::{gpu, Device, IntegratorConfig, Result, SamplingTables};

/// A ray stream together with its pixel indices and its live-ray counter.
#[derive(Debug)]
pub struct RayStreamBuffers<B> {
    pub rays: B,
    pub pixel_indices: B,
    pub counter: B,
}

/// All device memory used by the integrator.
///
/// Sized once for a given resolution; changing the resolution requires
/// building a new integrator.
#[derive(Debug)]
pub struct IntegratorBuffers<D>
where
    D: Device,
{
    pub radiance: D::Buffer,
    pub streams: DoubleBuffered<RayStreamBuffers<D::Buffer>>,
    pub hits: D::Buffer,
    pub throughputs: D::Buffer,
    pub sample_counter: D::Buffer,
    pub blue_noise_sequence: D::Buffer,
    pub blue_noise_scrambling_tile: D::Buffer,
    pub blue_noise_ranking_tile: D::Buffer,
    pub surface: D::Surface,
}

impl<D> IntegratorBuffers<D>
where
    D: Device,
{
    pub fn new(device: &D, config: &IntegratorConfig) -> Result<Self> {
        debug!("Initializing integrator buffers");

        let n = config.pixel_count() as usize;
        let vec4_size = mem::size_of::<Vec4>();
        let u32_size = mem::size_of::<u32>();

        let radiance =
            device.create_buffer("wavefront_radiance", n * vec4_size)?;

        let streams = DoubleBuffered::try_new(|side| {
            Ok(RayStreamBuffers {
                rays: device.create_buffer(
                    &format!("wavefront_rays_{side}"),
                    n * gpu::Ray::STRIDE * vec4_size,
                )?,
                pixel_indices: device.create_buffer(
                    &format!("wavefront_pixel_indices_{side}"),
                    n * u32_size,
                )?,
                counter: device.create_buffer(
                    &format!("wavefront_ray_counter_{side}"),
                    u32_size,
                )?,
            })
        })?;

        let hits = device.create_buffer("wavefront_hits", n * vec4_size)?;

        let throughputs =
            device.create_buffer("wavefront_throughputs", n * vec4_size)?;

        let sample_counter =
            device.create_buffer("wavefront_sample_counter", u32_size)?;

        let tables = SamplingTables::new();

        let blue_noise_sequence = device.create_buffer_init(
            "wavefront_blue_noise_sequence",
            bytemuck::cast_slice(&tables.sequence),
        )?;

        let blue_noise_scrambling_tile = device.create_buffer_init(
            "wavefront_blue_noise_scrambling_tile",
            bytemuck::cast_slice(&tables.scrambling_tile),
        )?;

        let blue_noise_ranking_tile = device.create_buffer_init(
            "wavefront_blue_noise_ranking_tile",
            bytemuck::cast_slice(&tables.ranking_tile),
        )?;

        let surface =
            device.create_surface("wavefront_surface", config.size())?;

        Ok(Self {
            radiance,
            streams,
            hits,
            throughputs,
            sample_counter,
            blue_noise_sequence,
            blue_noise_scrambling_tile,
            blue_noise_ranking_tile,
            surface,
        })
    }
}

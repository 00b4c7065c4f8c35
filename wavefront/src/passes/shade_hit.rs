use crate::{
    gpu, ComputePass, Device, IntegratorBuffers, IntegratorConfig, Kernel,
    Result,
};

#[derive(Debug)]
pub struct ShadeHitPass<D>
where
    D: Device,
{
    pass: ComputePass<D, gpu::ShadeHitPassParams>,
}

impl<D> ShadeHitPass<D>
where
    D: Device,
{
    pub fn new(
        device: &D,
        _: &IntegratorConfig,
        buffers: &IntegratorBuffers<D>,
    ) -> Result<Self> {
        let mut pass = ComputePass::new(device, Kernel::ShadeHit)?;

        pass.bind("hits", &buffers.hits)?
            .bind("sample_counter", &buffers.sample_counter)?
            .bind("blue_noise_sequence", &buffers.blue_noise_sequence)?
            .bind(
                "blue_noise_scrambling_tile",
                &buffers.blue_noise_scrambling_tile,
            )?
            .bind("blue_noise_ranking_tile", &buffers.blue_noise_ranking_tile)?
            .bind("throughputs", &buffers.throughputs)?
            .bind("radiance", &buffers.radiance)?;

        Ok(Self { pass })
    }

    pub fn set_geometry(
        &mut self,
        triangles: &D::Buffer,
        materials: &D::Buffer,
    ) -> Result<()> {
        self.pass
            .bind("triangles", triangles)?
            .bind("materials", materials)?;

        Ok(())
    }

    pub fn run(
        &mut self,
        device: &D,
        config: &IntegratorConfig,
        buffers: &IntegratorBuffers<D>,
        bounce: u32,
    ) -> Result<()> {
        let (incoming, outgoing) = buffers.streams.split(bounce);

        self.pass
            .bind("in_rays", &incoming.rays)?
            .bind("in_pixel_indices", &incoming.pixel_indices)?
            .bind("in_ray_counter", &incoming.counter)?
            .bind("out_rays", &outgoing.rays)?
            .bind("out_pixel_indices", &outgoing.pixel_indices)?
            .bind("out_ray_counter", &outgoing.counter)?;

        let params = gpu::ShadeHitPassParams {
            width: config.width,
            height: config.height,
            bounce,
            roulette_start: config.roulette_start,
        };

        self.pass.run(device, &params, config.pixel_count())
    }
}

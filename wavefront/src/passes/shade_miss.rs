use crate::{
    gpu, ComputePass, Device, IntegratorBuffers, IntegratorConfig, Kernel,
    Result,
};

#[derive(Debug)]
pub struct ShadeMissPass<D>
where
    D: Device,
{
    pass: ComputePass<D, gpu::ShadeMissPassParams>,
}

impl<D> ShadeMissPass<D>
where
    D: Device,
{
    pub fn new(
        device: &D,
        _: &IntegratorConfig,
        buffers: &IntegratorBuffers<D>,
    ) -> Result<Self> {
        let mut pass = ComputePass::new(device, Kernel::ShadeMiss)?;

        pass.bind("hits", &buffers.hits)?
            .bind("throughputs", &buffers.throughputs)?
            .bind("radiance", &buffers.radiance)?;

        Ok(Self { pass })
    }

    pub fn set_environment(&mut self, environment: &D::Buffer) -> Result<()> {
        self.pass.bind("environment", environment)?;

        Ok(())
    }

    pub fn run(
        &mut self,
        device: &D,
        config: &IntegratorConfig,
        buffers: &IntegratorBuffers<D>,
        bounce: u32,
    ) -> Result<()> {
        let stream = buffers.streams.incoming(bounce);

        self.pass
            .bind("rays", &stream.rays)?
            .bind("pixel_indices", &stream.pixel_indices)?
            .bind("ray_counter", &stream.counter)?;

        let params = gpu::ShadeMissPassParams {
            max_rays: config.pixel_count(),
            ..Default::default()
        };

        // Only the device knows how many rays are alive, so this pass gets
        // launched over the entire screen and the kernel skips dead slots:
        self.pass.run(device, &params, config.pixel_count())
    }
}

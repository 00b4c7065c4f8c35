use crate::{
    gpu, ComputePass, Device, IntegratorBuffers, IntegratorConfig, Kernel,
    Result,
};

#[derive(Debug)]
pub struct ResolvePass<D>
where
    D: Device,
{
    pass: ComputePass<D, gpu::ResolvePassParams>,
}

impl<D> ResolvePass<D>
where
    D: Device,
{
    pub fn new(
        device: &D,
        _: &IntegratorConfig,
        buffers: &IntegratorBuffers<D>,
    ) -> Result<Self> {
        let mut pass = ComputePass::new(device, Kernel::Resolve)?;

        pass.bind("radiance", &buffers.radiance)?
            .bind("sample_counter", &buffers.sample_counter)?
            .bind_surface("surface", &buffers.surface)?;

        Ok(Self { pass })
    }

    /// Enqueues the resolve; the surface must be acquired by the caller.
    pub fn run(&self, device: &D, config: &IntegratorConfig) -> Result<()> {
        let params = gpu::ResolvePassParams {
            width: config.width,
            height: config.height,
            ..Default::default()
        };

        self.pass.run(device, &params, config.pixel_count())
    }
}

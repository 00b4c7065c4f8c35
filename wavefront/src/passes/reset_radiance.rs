use crate::{
    gpu, ComputePass, Device, IntegratorBuffers, IntegratorConfig, Kernel,
    Result,
};

#[derive(Debug)]
pub struct ResetRadiancePass<D>
where
    D: Device,
{
    pass: ComputePass<D, gpu::ResetRadiancePassParams>,
}

impl<D> ResetRadiancePass<D>
where
    D: Device,
{
    pub fn new(
        device: &D,
        _: &IntegratorConfig,
        buffers: &IntegratorBuffers<D>,
    ) -> Result<Self> {
        let mut pass = ComputePass::new(device, Kernel::ResetRadiance)?;

        pass.bind("radiance", &buffers.radiance)?;

        Ok(Self { pass })
    }

    pub fn run(&self, device: &D, config: &IntegratorConfig) -> Result<()> {
        let params = gpu::ResetRadiancePassParams {
            pixel_count: config.pixel_count(),
            ..Default::default()
        };

        self.pass.run(device, &params, config.pixel_count())
    }
}

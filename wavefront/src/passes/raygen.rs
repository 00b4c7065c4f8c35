use crate::{
    gpu, ComputePass, Device, IntegratorBuffers, IntegratorConfig, Kernel,
    Result,
};

#[derive(Debug)]
pub struct RaygenPass<D>
where
    D: Device,
{
    pass: ComputePass<D, gpu::RaygenPassParams>,
}

impl<D> RaygenPass<D>
where
    D: Device,
{
    pub fn new(
        device: &D,
        _: &IntegratorConfig,
        buffers: &IntegratorBuffers<D>,
    ) -> Result<Self> {
        let mut pass = ComputePass::new(device, Kernel::Raygen)?;

        // Primary rays always land in the stream read by the first bounce:
        let stream = buffers.streams.incoming(0);

        pass.bind("rays", &stream.rays)?
            .bind("pixel_indices", &stream.pixel_indices)?
            .bind("ray_counter", &stream.counter)?
            .bind("throughputs", &buffers.throughputs)?;

        Ok(Self { pass })
    }

    pub fn run(
        &self,
        device: &D,
        params: &gpu::RaygenPassParams,
    ) -> Result<()> {
        self.pass.run(device, params, params.pixel_count())
    }
}

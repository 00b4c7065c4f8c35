use crate::{
    ComputePass, Device, IntegratorBuffers, IntegratorConfig, Kernel, Result,
};

#[derive(Debug)]
pub struct IncrementCounterPass<D>
where
    D: Device,
{
    pass: ComputePass<D, ()>,
}

impl<D> IncrementCounterPass<D>
where
    D: Device,
{
    pub fn new(
        device: &D,
        _: &IntegratorConfig,
        buffers: &IntegratorBuffers<D>,
    ) -> Result<Self> {
        let mut pass = ComputePass::new(device, Kernel::IncrementCounter)?;

        pass.bind("counter", &buffers.sample_counter)?;

        Ok(Self { pass })
    }

    pub fn run(&self, device: &D) -> Result<()> {
        self.pass.run(device, &(), 1)
    }
}

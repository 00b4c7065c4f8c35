use crate::{
    ComputePass, Device, IntegratorBuffers, IntegratorConfig, Kernel, Result,
};

/// Zeroes a single device-side counter.
#[derive(Debug)]
pub struct ClearCounterPass<D>
where
    D: Device,
{
    pass: ComputePass<D, ()>,
}

impl<D> ClearCounterPass<D>
where
    D: Device,
{
    pub fn new(
        device: &D,
        _: &IntegratorConfig,
        _: &IntegratorBuffers<D>,
    ) -> Result<Self> {
        let pass = ComputePass::new(device, Kernel::ClearCounter)?;

        Ok(Self { pass })
    }

    pub fn run(&mut self, device: &D, counter: &D::Buffer) -> Result<()> {
        self.pass.bind("counter", counter)?;
        self.pass.run(device, &(), 1)
    }
}

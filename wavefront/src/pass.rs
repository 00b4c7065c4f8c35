use std::marker::PhantomData;

use bytemuck::Pod;
use derivative::Derivative;
use fxhash::FxHashMap;
use log::{debug, trace};

use crate::{Access, Device, Error, Kernel, Resource, Result};

/// A kernel together with resources bound to its parameters.
///
/// Resources are bound by name; the binding survives until it's replaced, so
/// per-scene and per-frame resources need to be bound just once, while
/// ping-ponged streams get rebound on every bounce.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct ComputePass<D, P>
where
    D: Device,
{
    kernel: Kernel,
    pipeline: D::Pipeline,
    bindings: FxHashMap<&'static str, Resource<D>>,
    _params: PhantomData<P>,
}

impl<D, P> ComputePass<D, P>
where
    D: Device,
    P: Pod,
{
    pub fn new(device: &D, kernel: Kernel) -> Result<Self> {
        debug!("Initializing pass: {kernel}");

        Ok(Self {
            kernel,
            pipeline: device.create_pipeline(kernel)?,
            bindings: Default::default(),
            _params: PhantomData,
        })
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    pub fn bind(
        &mut self,
        name: &str,
        buffer: &D::Buffer,
    ) -> Result<&mut Self> {
        self.bind_resource(name, Resource::Buffer(buffer.clone()), false)
    }

    pub fn bind_surface(
        &mut self,
        name: &str,
        surface: &D::Surface,
    ) -> Result<&mut Self> {
        self.bind_resource(name, Resource::Surface(surface.clone()), true)
    }

    fn bind_resource(
        &mut self,
        name: &str,
        resource: Resource<D>,
        is_surface: bool,
    ) -> Result<&mut Self> {
        let param = self
            .kernel
            .param(name)
            .filter(|param| (param.access == Access::Surface) == is_surface)
            .ok_or_else(|| Error::UnknownParameter {
                kernel: self.kernel,
                param: name.into(),
            })?;

        self.bindings.insert(param.name, resource);

        Ok(self)
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Enqueues this pass over `work_items` work-items; fails if any of the
    /// kernel's parameters is not bound.
    pub fn run(&self, device: &D, params: &P, work_items: u32) -> Result<()> {
        let resources = self
            .kernel
            .params()
            .iter()
            .map(|param| {
                self.bindings.get(param.name).ok_or(Error::UnboundParameter {
                    kernel: self.kernel,
                    param: param.name,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        trace!("Running pass: {}; work_items={work_items}", self.kernel);

        device.dispatch(
            &self.pipeline,
            &resources,
            bytemuck::bytes_of(params),
            work_items,
        )
    }
}

mod cpu_device;
#[cfg(feature = "wgpu")]
mod wgpu_device;

use std::fmt;

use derivative::Derivative;
use glam::{UVec2, Vec4};

pub use self::cpu_device::*;
#[cfg(feature = "wgpu")]
pub use self::wgpu_device::*;
use crate::Result;

/// Compute device the integrator dispatches its kernels on.
///
/// Dispatches are enqueued in order and observe all writes of the dispatches
/// enqueued before them; only [`Device::finish()`], the readbacks and resource
/// creation are allowed to block.
pub trait Device: Sized + fmt::Debug {
    type Buffer: Clone + fmt::Debug;
    type Surface: Clone + fmt::Debug;
    type Pipeline: fmt::Debug;

    /// Creates a zero-initialized buffer of given size, in bytes.
    fn create_buffer(&self, label: &str, size: usize) -> Result<Self::Buffer>;

    /// Creates a buffer holding given bytes.
    fn create_buffer_init(
        &self,
        label: &str,
        contents: &[u8],
    ) -> Result<Self::Buffer>;

    fn write_buffer(
        &self,
        buffer: &Self::Buffer,
        offset: usize,
        data: &[u8],
    ) -> Result<()>;

    /// Reads the entire buffer back, waiting for all pending dispatches.
    fn read_buffer(&self, buffer: &Self::Buffer) -> Result<Vec<u8>>;

    /// Creates a `size.x * size.y` surface of RGBA texels.
    fn create_surface(&self, label: &str, size: UVec2) -> Result<Self::Surface>;

    /// Reads the surface back; fails while the surface is acquired.
    fn read_surface(&self, surface: &Self::Surface) -> Result<Vec<Vec4>>;

    fn create_pipeline(&self, kernel: Kernel) -> Result<Self::Pipeline>;

    /// Enqueues given pipeline over `work_items` work-items.
    ///
    /// `resources` must follow the order of [`Kernel::params()`]; `params` is
    /// the kernel's parameter block, empty for kernels without one.
    fn dispatch(
        &self,
        pipeline: &Self::Pipeline,
        resources: &[&Resource<Self>],
        params: &[u8],
        work_items: u32,
    ) -> Result<()>;

    /// Acquires the surface for writing; kernels can't write into a surface
    /// that's not acquired.
    fn acquire_surface(&self, surface: &Self::Surface) -> Result<()>;

    /// Releases the surface back to the presenting layer.
    fn release_surface(&self, surface: &Self::Surface) -> Result<()>;

    /// Waits until all enqueued dispatches complete.
    fn finish(&self) -> Result<()>;
}

#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""))]
pub enum Resource<D>
where
    D: Device,
{
    Buffer(D::Buffer),
    Surface(D::Surface),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kernel {
    Raygen,
    Intersect,
    ShadeMiss,
    ShadeHit,
    ClearCounter,
    IncrementCounter,
    ResetRadiance,
    Resolve,
}

impl Kernel {
    pub const ALL: [Self; 8] = [
        Self::Raygen,
        Self::Intersect,
        Self::ShadeMiss,
        Self::ShadeHit,
        Self::ClearCounter,
        Self::IncrementCounter,
        Self::ResetRadiance,
        Self::Resolve,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Raygen => "raygen",
            Self::Intersect => "intersect",
            Self::ShadeMiss => "shade_miss",
            Self::ShadeHit => "shade_hit",
            Self::ClearCounter => "clear_counter",
            Self::IncrementCounter => "increment_counter",
            Self::ResetRadiance => "reset_radiance",
            Self::Resolve => "resolve",
        }
    }

    /// Returns parameters this kernel expects, in the order backends bind
    /// them.
    pub fn params(self) -> &'static [Param] {
        use Access::*;

        macro_rules! params {
            ($($name:ident: $access:ident),* $(,)?) => {
                &[$(Param {
                    name: stringify!($name),
                    access: $access,
                }),*]
            };
        }

        match self {
            Self::Raygen => params![
                rays: ReadWrite,
                pixel_indices: ReadWrite,
                ray_counter: ReadWrite,
                throughputs: ReadWrite,
            ],

            Self::Intersect => params![
                rays: Read,
                ray_counter: Read,
                triangles: Read,
                hits: ReadWrite,
            ],

            Self::ShadeMiss => params![
                rays: Read,
                pixel_indices: Read,
                ray_counter: Read,
                hits: Read,
                throughputs: Read,
                environment: Read,
                radiance: ReadWrite,
            ],

            Self::ShadeHit => params![
                in_rays: Read,
                in_pixel_indices: Read,
                in_ray_counter: Read,
                hits: Read,
                triangles: Read,
                materials: Read,
                sample_counter: Read,
                blue_noise_sequence: Read,
                blue_noise_scrambling_tile: Read,
                blue_noise_ranking_tile: Read,
                throughputs: ReadWrite,
                out_rays: ReadWrite,
                out_pixel_indices: ReadWrite,
                out_ray_counter: ReadWrite,
                radiance: ReadWrite,
            ],

            Self::ClearCounter | Self::IncrementCounter => {
                params![counter: ReadWrite]
            }

            Self::ResetRadiance => params![radiance: ReadWrite],

            Self::Resolve => params![
                radiance: Read,
                sample_counter: Read,
                surface: Surface,
            ],
        }
    }

    pub fn param(self, name: &str) -> Option<&'static Param> {
        self.params().iter().find(|param| param.name == name)
    }

    /// Returns whether this kernel takes a parameter block.
    pub fn has_params(self) -> bool {
        !matches!(self, Self::ClearCounter | Self::IncrementCounter)
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub access: Access,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Read,
    ReadWrite,
    Surface,
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn params_are_unique() {
        for kernel in Kernel::ALL {
            let names: HashSet<_> =
                kernel.params().iter().map(|param| param.name).collect();

            assert_eq!(kernel.params().len(), names.len(), "{kernel}");
        }
    }

    #[test]
    fn params_order() {
        let names: Vec<_> = Kernel::Resolve
            .params()
            .iter()
            .map(|param| param.name)
            .collect();

        assert_eq!(vec!["radiance", "sample_counter", "surface"], names);
        assert_eq!(Access::ReadWrite, Kernel::Intersect.params()[3].access);
    }

    #[test]
    fn param() {
        let param = Kernel::Resolve.param("surface").unwrap();

        assert_eq!(Access::Surface, param.access);
        assert!(Kernel::Resolve.param("rays").is_none());
    }
}

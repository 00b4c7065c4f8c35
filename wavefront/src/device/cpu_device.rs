use std::slice;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

use bytemuck::AnyBitPattern;
use glam::{UVec2, Vec4};
use log::{info, trace};
use wavefront_kernels as kernels;

use crate::{Access, Device, Error, Kernel, Param, Resource, Result};

/// Reference device that runs kernels on the host, one work-item at a time.
///
/// It's slow, but deterministic and always available, which makes it the
/// backend of choice for tests and for validating other backends.
#[derive(Clone, Debug, Default)]
pub struct CpuDevice;

impl CpuDevice {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Clone, Debug)]
pub struct CpuBuffer {
    label: Arc<str>,
    size: usize,
    data: Arc<RwLock<Vec<Vec4>>>,
}

impl CpuBuffer {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

#[derive(Clone, Debug)]
pub struct CpuSurface {
    label: Arc<str>,
    size: UVec2,
    acquired: Arc<AtomicBool>,
    texels: Arc<RwLock<Vec<Vec4>>>,
}

impl CpuSurface {
    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn is_acquired(&self) -> bool {
        self.acquired.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct CpuPipeline {
    kernel: Kernel,
}

impl Device for CpuDevice {
    type Buffer = CpuBuffer;
    type Surface = CpuSurface;
    type Pipeline = CpuPipeline;

    fn create_buffer(&self, label: &str, size: usize) -> Result<CpuBuffer> {
        info!("Allocating storage buffer `{label}`; size={size}");

        // Storage is kept in `Vec4`s so that it can be viewed both as `&[Vec4]`
        // and as `&[u32]`; the extra padding is never visible outside
        let len = (size / 16 + usize::from(size % 16 != 0)).max(1);
        let mut data = Vec::new();

        data.try_reserve_exact(len)
            .map_err(|err| Error::resource(label, err))?;

        data.resize(len, Vec4::ZERO);

        Ok(CpuBuffer {
            label: label.into(),
            size,
            data: Arc::new(RwLock::new(data)),
        })
    }

    fn create_buffer_init(
        &self,
        label: &str,
        contents: &[u8],
    ) -> Result<CpuBuffer> {
        let buffer = self.create_buffer(label, contents.len())?;

        self.write_buffer(&buffer, 0, contents)?;

        Ok(buffer)
    }

    fn write_buffer(
        &self,
        buffer: &CpuBuffer,
        offset: usize,
        data: &[u8],
    ) -> Result<()> {
        let end = offset
            .checked_add(data.len())
            .filter(|end| *end <= buffer.size)
            .ok_or_else(|| {
                Error::transfer(
                    &buffer.label,
                    format!(
                        "write of {} bytes at {offset} overflows buffer of \
                         {} bytes",
                        data.len(),
                        buffer.size
                    ),
                )
            })?;

        let mut storage = buffer
            .data
            .write()
            .map_err(|_| Error::transfer(&buffer.label, "buffer poisoned"))?;

        bytemuck::cast_slice_mut::<_, u8>(&mut storage[..])[offset..end]
            .copy_from_slice(data);

        Ok(())
    }

    fn read_buffer(&self, buffer: &CpuBuffer) -> Result<Vec<u8>> {
        let storage = buffer
            .data
            .read()
            .map_err(|_| Error::transfer(&buffer.label, "buffer poisoned"))?;

        Ok(bytemuck::cast_slice::<_, u8>(&storage[..])[..buffer.size].to_vec())
    }

    fn create_surface(&self, label: &str, size: UVec2) -> Result<CpuSurface> {
        info!("Allocating surface `{label}`; size={size}");

        Ok(CpuSurface {
            label: label.into(),
            size,
            acquired: Default::default(),
            texels: Arc::new(RwLock::new(vec![
                Vec4::ZERO;
                (size.x * size.y) as usize
            ])),
        })
    }

    fn read_surface(&self, surface: &CpuSurface) -> Result<Vec<Vec4>> {
        if surface.is_acquired() {
            return Err(Error::SurfaceAcquired(surface.label.to_string()));
        }

        let texels = surface.texels.read().map_err(|_| {
            Error::transfer(&surface.label, "surface poisoned")
        })?;

        Ok(texels.clone())
    }

    fn create_pipeline(&self, kernel: Kernel) -> Result<CpuPipeline> {
        Ok(CpuPipeline { kernel })
    }

    fn dispatch(
        &self,
        pipeline: &CpuPipeline,
        resources: &[&Resource<Self>],
        params: &[u8],
        work_items: u32,
    ) -> Result<()> {
        let kernel = pipeline.kernel;
        let decls = kernel.params();

        if resources.len() != decls.len() {
            return Err(Error::dispatch(
                kernel,
                format!(
                    "expected {} resources, got {}",
                    decls.len(),
                    resources.len()
                ),
            ));
        }

        trace!("Dispatching `{kernel}`; work_items={work_items}");

        let mut slots = decls
            .iter()
            .zip(resources)
            .map(|(decl, resource)| Slot::lock(kernel, decl, resource))
            .collect::<Result<Vec<_>>>()?;

        let mut args = Args {
            kernel,
            slots: slots.iter_mut(),
        };

        match kernel {
            Kernel::Raygen => {
                let params = args.params(params)?;
                let rays = args.vec4_mut()?;
                let pixel_indices = args.u32_mut()?;
                let ray_counter = args.u32_mut()?;
                let throughputs = args.vec4_mut()?;

                for idx in 0..work_items {
                    kernels::raygen::main(
                        idx,
                        &params,
                        rays,
                        pixel_indices,
                        ray_counter,
                        throughputs,
                    );
                }
            }

            Kernel::Intersect => {
                let params = args.params(params)?;
                let rays = args.vec4()?;
                let ray_counter = args.u32()?;
                let triangles = args.vec4()?;
                let hits = args.vec4_mut()?;

                for idx in 0..work_items {
                    kernels::intersect::main(
                        idx,
                        &params,
                        rays,
                        ray_counter,
                        triangles,
                        hits,
                    );
                }
            }

            Kernel::ShadeMiss => {
                let params = args.params(params)?;
                let rays = args.vec4()?;
                let pixel_indices = args.u32()?;
                let ray_counter = args.u32()?;
                let hits = args.vec4()?;
                let throughputs = args.vec4()?;
                let environment = args.vec4()?;
                let radiance = args.vec4_mut()?;

                for idx in 0..work_items {
                    kernels::shade_miss::main(
                        idx,
                        &params,
                        rays,
                        pixel_indices,
                        ray_counter,
                        hits,
                        throughputs,
                        environment,
                        radiance,
                    );
                }
            }

            Kernel::ShadeHit => {
                let params = args.params(params)?;
                let in_rays = args.vec4()?;
                let in_pixel_indices = args.u32()?;
                let in_ray_counter = args.u32()?;
                let hits = args.vec4()?;
                let triangles = args.vec4()?;
                let materials = args.vec4()?;
                let sample_counter = args.u32()?;
                let blue_noise_sequence = args.u32()?;
                let blue_noise_scrambling_tile = args.u32()?;
                let blue_noise_ranking_tile = args.u32()?;
                let throughputs = args.vec4_mut()?;
                let out_rays = args.vec4_mut()?;
                let out_pixel_indices = args.u32_mut()?;
                let out_ray_counter = args.u32_mut()?;
                let radiance = args.vec4_mut()?;

                for idx in 0..work_items {
                    kernels::shade_hit::main(
                        idx,
                        &params,
                        in_rays,
                        in_pixel_indices,
                        in_ray_counter,
                        hits,
                        triangles,
                        materials,
                        sample_counter,
                        blue_noise_sequence,
                        blue_noise_scrambling_tile,
                        blue_noise_ranking_tile,
                        throughputs,
                        out_rays,
                        out_pixel_indices,
                        out_ray_counter,
                        radiance,
                    );
                }
            }

            Kernel::ClearCounter => {
                let counter = args.u32_mut()?;

                for idx in 0..work_items {
                    kernels::clear_counter::main(idx, counter);
                }
            }

            Kernel::IncrementCounter => {
                let counter = args.u32_mut()?;

                for idx in 0..work_items {
                    kernels::increment_counter::main(idx, counter);
                }
            }

            Kernel::ResetRadiance => {
                let params = args.params(params)?;
                let radiance = args.vec4_mut()?;

                for idx in 0..work_items {
                    kernels::reset_radiance::main(idx, &params, radiance);
                }
            }

            Kernel::Resolve => {
                let params = args.params(params)?;
                let radiance = args.vec4()?;
                let sample_counter = args.u32()?;
                let surface = args.vec4_mut()?;

                for idx in 0..work_items {
                    kernels::resolve::main(
                        idx,
                        &params,
                        radiance,
                        sample_counter,
                        surface,
                    );
                }
            }
        }

        Ok(())
    }

    fn acquire_surface(&self, surface: &CpuSurface) -> Result<()> {
        if surface.acquired.swap(true, Ordering::SeqCst) {
            return Err(Error::SurfaceAcquired(surface.label.to_string()));
        }

        Ok(())
    }

    fn release_surface(&self, surface: &CpuSurface) -> Result<()> {
        if !surface.acquired.swap(false, Ordering::SeqCst) {
            return Err(Error::SurfaceNotAcquired(surface.label.to_string()));
        }

        Ok(())
    }

    fn finish(&self) -> Result<()> {
        Ok(())
    }
}

/// A locked resource, ready to be handed to a kernel.
enum Slot<'a> {
    Read(RwLockReadGuard<'a, Vec<Vec4>>),
    Write(RwLockWriteGuard<'a, Vec<Vec4>>),
}

impl<'a> Slot<'a> {
    fn lock(
        kernel: Kernel,
        decl: &Param,
        resource: &'a Resource<CpuDevice>,
    ) -> Result<Self> {
        let (label, storage) = match (decl.access, resource) {
            (Access::Read | Access::ReadWrite, Resource::Buffer(buffer)) => {
                (&buffer.label, &buffer.data)
            }

            (Access::Surface, Resource::Surface(surface)) => {
                if !surface.is_acquired() {
                    return Err(Error::SurfaceNotAcquired(
                        surface.label.to_string(),
                    ));
                }

                (&surface.label, &surface.texels)
            }

            _ => {
                return Err(Error::dispatch(
                    kernel,
                    format!(
                        "`{}` is bound to a wrong kind of resource",
                        decl.name
                    ),
                ));
            }
        };

        // A buffer bound twice with at least one writable binding would alias
        // within a single dispatch; that's reported instead of deadlocking
        let aliased = || {
            Error::dispatch(
                kernel,
                format!(
                    "`{label}` is bound more than once (as `{}`)",
                    decl.name
                ),
            )
        };

        if decl.access == Access::Read {
            match storage.try_read() {
                Ok(guard) => Ok(Self::Read(guard)),
                Err(TryLockError::WouldBlock) => Err(aliased()),
                Err(TryLockError::Poisoned(_)) => {
                    Err(Error::dispatch(kernel, format!("`{label}` poisoned")))
                }
            }
        } else {
            match storage.try_write() {
                Ok(guard) => Ok(Self::Write(guard)),
                Err(TryLockError::WouldBlock) => Err(aliased()),
                Err(TryLockError::Poisoned(_)) => {
                    Err(Error::dispatch(kernel, format!("`{label}` poisoned")))
                }
            }
        }
    }
}

/// Hands out locked resources in the order kernels declare them.
struct Args<'s, 'a> {
    kernel: Kernel,
    slots: slice::IterMut<'s, Slot<'a>>,
}

impl<'s, 'a> Args<'s, 'a> {
    fn params<T>(&self, bytes: &[u8]) -> Result<T>
    where
        T: AnyBitPattern,
    {
        bytemuck::try_pod_read_unaligned(bytes).map_err(|err| {
            Error::dispatch(self.kernel, format!("invalid params: {err}"))
        })
    }

    fn next(&mut self) -> Result<&'s mut Slot<'a>> {
        self.slots.next().ok_or_else(|| {
            Error::dispatch(self.kernel, "not enough resources")
        })
    }

    fn vec4(&mut self) -> Result<&'s [Vec4]> {
        match self.next()? {
            Slot::Read(guard) => Ok(&guard[..]),
            Slot::Write(guard) => Ok(&guard[..]),
        }
    }

    fn vec4_mut(&mut self) -> Result<&'s mut [Vec4]> {
        match self.next()? {
            Slot::Write(guard) => Ok(&mut guard[..]),
            Slot::Read(_) => {
                Err(Error::dispatch(self.kernel, "resource is read-only"))
            }
        }
    }

    fn u32(&mut self) -> Result<&'s [u32]> {
        Ok(bytemuck::cast_slice(self.vec4()?))
    }

    fn u32_mut(&mut self) -> Result<&'s mut [u32]> {
        Ok(bytemuck::cast_slice_mut(self.vec4_mut()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers() {
        let device = CpuDevice::new();
        let data: Vec<u32> = (0..5).collect();

        let buffer = device
            .create_buffer_init("test", bytemuck::cast_slice(&data))
            .unwrap();

        assert_eq!(20, buffer.size());

        device
            .write_buffer(&buffer, 4, bytemuck::bytes_of(&123u32))
            .unwrap();

        let actual: Vec<u32> =
            bytemuck::pod_collect_to_vec(&device.read_buffer(&buffer).unwrap());

        assert_eq!(vec![0, 123, 2, 3, 4], actual);

        // Writes can't go past the buffer, even though its storage is padded
        assert!(device
            .write_buffer(&buffer, 20, bytemuck::bytes_of(&0u32))
            .is_err());
    }

    #[test]
    fn oversized_buffer() {
        let err = CpuDevice::new()
            .create_buffer("huge", usize::MAX)
            .unwrap_err();

        assert!(
            matches!(
                &err,
                Error::Resource { resource, .. } if resource == "huge"
            ),
            "{err}"
        );
    }

    #[test]
    fn aliasing() {
        let device = CpuDevice::new();
        let counter = device.create_buffer("counter", 4).unwrap();
        let radiance = device.create_buffer("radiance", 64).unwrap();
        let pipeline = device.create_pipeline(Kernel::Resolve).unwrap();
        let surface = device.create_surface("surface", UVec2::ONE).unwrap();

        let radiance = Resource::Buffer(radiance);
        let counter = Resource::Buffer(counter);
        let surface = Resource::Surface(surface.clone());

        let params = crate::gpu::ResolvePassParams {
            width: 1,
            height: 1,
            ..Default::default()
        };

        // ---
        // Case 1: Writing into a surface that's not been acquired

        let err = device
            .dispatch(
                &pipeline,
                &[&radiance, &counter, &surface],
                bytemuck::bytes_of(&params),
                1,
            )
            .unwrap_err();

        assert!(matches!(err, Error::SurfaceNotAcquired(_)), "{err}");

        // ---
        // Case 2: Binding a buffer where a surface is expected

        let err = device
            .dispatch(
                &pipeline,
                &[&radiance, &counter, &radiance],
                bytemuck::bytes_of(&params),
                1,
            )
            .unwrap_err();

        assert!(matches!(err, Error::Dispatch { .. }), "{err}");

        // ---
        // Case 3: Binding the same buffer as both read-only and writable

        let pipeline = device.create_pipeline(Kernel::Intersect).unwrap();

        let params = crate::gpu::IntersectPassParams {
            max_rays: 1,
            ..Default::default()
        };

        let err = device
            .dispatch(
                &pipeline,
                &[&radiance, &counter, &radiance, &radiance],
                bytemuck::bytes_of(&params),
                1,
            )
            .unwrap_err();

        assert!(matches!(err, Error::Dispatch { .. }), "{err}");
    }

    #[test]
    fn surface() {
        let device = CpuDevice::new();
        let surface = device.create_surface("surface", UVec2::ONE).unwrap();

        assert!(device.read_surface(&surface).is_ok());
        assert!(device.release_surface(&surface).is_err());

        device.acquire_surface(&surface).unwrap();

        assert!(device.acquire_surface(&surface).is_err());
        assert!(device.read_surface(&surface).is_err());

        device.release_surface(&surface).unwrap();

        assert_eq!(vec![Vec4::ZERO], device.read_surface(&surface).unwrap());
    }
}

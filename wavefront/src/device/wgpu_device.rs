use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use glam::{UVec2, Vec4};
use log::{info, trace};
use wgpu::util::DeviceExt;

use crate::{Access, Device, Error, Kernel, Resource, Result};

const WORKGROUP_SIZE: u32 = 64;
const SURFACE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// Device that runs kernels on a GPU through `wgpu`.
///
/// Every dispatch gets submitted on its own, so the queue's submission order
/// is what orders consecutive stages.
#[derive(Clone, Debug)]
pub struct WgpuDevice {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
}

impl WgpuDevice {
    /// Picks the default adapter and opens a device on it, blocking until
    /// both are ready.
    pub fn new() -> Result<Self> {
        pollster::block_on(Self::new_async())
    }

    pub async fn new_async() -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                ..Default::default()
            })
            .await
            .ok_or_else(|| {
                Error::resource("adapter", "no compatible adapter found")
            })?;

        info!("Using adapter: {:?}", adapter.get_info());

        // Hit-shading binds more storage buffers than the default limits
        // allow, so ask for whatever the adapter supports
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("wavefront"),
                    features: wgpu::Features::empty(),
                    limits: adapter.limits(),
                },
                None,
            )
            .await
            .map_err(|err| Error::resource("device", err))?;

        Ok(Self::from_raw(Arc::new(device), Arc::new(queue)))
    }

    /// Wraps a device created elsewhere, e.g. by the application's renderer.
    pub fn from_raw(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
    ) -> Self {
        Self { device, queue }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn scoped<T>(
        &self,
        f: impl FnOnce() -> T,
        on_error: impl FnOnce(wgpu::Error) -> Error,
    ) -> Result<T> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let value = f();

        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(on_error(err)),
            None => Ok(value),
        }
    }

    /// Copies `size` bytes out of given buffer, waiting for the queue.
    fn read_back(
        &self,
        label: &str,
        size: u64,
        copy: impl FnOnce(&mut wgpu::CommandEncoder, &wgpu::Buffer),
    ) -> Result<Vec<u8>> {
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{label}_staging")),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self.device.create_command_encoder(
            &wgpu::CommandEncoderDescriptor {
                label: Some(&format!("{label}_readback")),
            },
        );

        copy(&mut encoder, &staging);

        self.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = mpsc::channel();

        slice.map_async(wgpu::MapMode::Read, move |result| {
            _ = tx.send(result);
        });

        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|err| Error::transfer(label, err))?
            .map_err(|err| Error::transfer(label, err))?;

        let bytes = slice.get_mapped_range().to_vec();

        staging.unmap();

        Ok(bytes)
    }
}

#[derive(Clone, Debug)]
pub struct WgpuBuffer {
    label: Arc<str>,
    size: usize,
    buffer: Arc<wgpu::Buffer>,
}

impl WgpuBuffer {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

#[derive(Clone, Debug)]
pub struct WgpuSurface {
    label: Arc<str>,
    size: UVec2,
    acquired: Arc<AtomicBool>,
    texture: Arc<wgpu::Texture>,
    view: Arc<wgpu::TextureView>,
}

impl WgpuSurface {
    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn is_acquired(&self) -> bool {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Texture the resolved image lands in; it's `Rgba32Float`.
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }
}

#[derive(Debug)]
pub struct WgpuPipeline {
    kernel: Kernel,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline: wgpu::ComputePipeline,
}

impl Device for WgpuDevice {
    type Buffer = WgpuBuffer;
    type Surface = WgpuSurface;
    type Pipeline = WgpuPipeline;

    fn create_buffer(&self, label: &str, size: usize) -> Result<WgpuBuffer> {
        info!("Allocating storage buffer `{label}`; size={size}");

        let buffer = self.scoped(
            || {
                self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(label),
                    size: padded_size(size),
                    usage: buffer_usages(),
                    mapped_at_creation: false,
                })
            },
            |err| Error::resource(label, err),
        )?;

        Ok(WgpuBuffer {
            label: label.into(),
            size,
            buffer: Arc::new(buffer),
        })
    }

    fn create_buffer_init(
        &self,
        label: &str,
        contents: &[u8],
    ) -> Result<WgpuBuffer> {
        info!(
            "Allocating storage buffer `{label}`; size={}",
            contents.len()
        );

        let mut padded = contents.to_vec();

        padded.resize(padded_size(contents.len()) as usize, 0);

        let buffer = self.scoped(
            || {
                self.device.create_buffer_init(
                    &wgpu::util::BufferInitDescriptor {
                        label: Some(label),
                        contents: &padded,
                        usage: buffer_usages(),
                    },
                )
            },
            |err| Error::resource(label, err),
        )?;

        Ok(WgpuBuffer {
            label: label.into(),
            size: contents.len(),
            buffer: Arc::new(buffer),
        })
    }

    fn write_buffer(
        &self,
        buffer: &WgpuBuffer,
        offset: usize,
        data: &[u8],
    ) -> Result<()> {
        let fits = offset
            .checked_add(data.len())
            .map_or(false, |end| end <= buffer.size);

        if !fits || offset % 4 != 0 || data.len() % 4 != 0 {
            return Err(Error::transfer(
                &buffer.label,
                format!(
                    "unaligned or out-of-bounds write of {} bytes at {offset}",
                    data.len()
                ),
            ));
        }

        self.queue.write_buffer(&buffer.buffer, offset as u64, data);

        Ok(())
    }

    fn read_buffer(&self, buffer: &WgpuBuffer) -> Result<Vec<u8>> {
        let size = padded_size(buffer.size);

        let mut bytes = self.read_back(&buffer.label, size, |encoder, staging| {
            encoder.copy_buffer_to_buffer(&buffer.buffer, 0, staging, 0, size);
        })?;

        bytes.truncate(buffer.size);

        Ok(bytes)
    }

    fn create_surface(&self, label: &str, size: UVec2) -> Result<WgpuSurface> {
        info!("Allocating surface `{label}`; size={size}");

        let texture = self.scoped(
            || {
                self.device.create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size: wgpu::Extent3d {
                        width: size.x,
                        height: size.y,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: SURFACE_FORMAT,
                    usage: wgpu::TextureUsages::STORAGE_BINDING
                        | wgpu::TextureUsages::TEXTURE_BINDING
                        | wgpu::TextureUsages::COPY_SRC,
                    view_formats: &[],
                })
            },
            |err| Error::resource(label, err),
        )?;

        let view = texture.create_view(&Default::default());

        Ok(WgpuSurface {
            label: label.into(),
            size,
            acquired: Default::default(),
            texture: Arc::new(texture),
            view: Arc::new(view),
        })
    }

    fn read_surface(&self, surface: &WgpuSurface) -> Result<Vec<Vec4>> {
        if surface.is_acquired() {
            return Err(Error::SurfaceAcquired(surface.label.to_string()));
        }

        let texel_size = std::mem::size_of::<Vec4>() as u32;
        let row_size = surface.size.x * texel_size;

        let padded_row_size = {
            let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

            (row_size + align - 1) / align * align
        };

        let bytes = self.read_back(
            &surface.label,
            (padded_row_size * surface.size.y) as u64,
            |encoder, staging| {
                encoder.copy_texture_to_buffer(
                    wgpu::ImageCopyTexture {
                        texture: &surface.texture,
                        mip_level: 0,
                        origin: wgpu::Origin3d::ZERO,
                        aspect: wgpu::TextureAspect::All,
                    },
                    wgpu::ImageCopyBuffer {
                        buffer: staging,
                        layout: wgpu::ImageDataLayout {
                            offset: 0,
                            bytes_per_row: Some(padded_row_size),
                            rows_per_image: Some(surface.size.y),
                        },
                    },
                    wgpu::Extent3d {
                        width: surface.size.x,
                        height: surface.size.y,
                        depth_or_array_layers: 1,
                    },
                );
            },
        )?;

        Ok(bytes
            .chunks(padded_row_size as usize)
            .flat_map(|row| {
                bytemuck::pod_collect_to_vec::<u8, Vec4>(
                    &row[..row_size as usize],
                )
            })
            .collect())
    }

    fn create_pipeline(&self, kernel: Kernel) -> Result<WgpuPipeline> {
        let label = format!("wavefront_{}", kernel.name());

        info!("Compiling kernel `{kernel}`");

        self.scoped(
            || {
                let module = self.device.create_shader_module(
                    wgpu::ShaderModuleDescriptor {
                        label: Some(&label),
                        source: wgpu::ShaderSource::Wgsl(
                            shader_source(kernel).into(),
                        ),
                    },
                );

                let bind_group_layout = self.device.create_bind_group_layout(
                    &wgpu::BindGroupLayoutDescriptor {
                        label: Some(&format!("{label}_layout")),
                        entries: &layout_entries(kernel),
                    },
                );

                let pipeline_layout = self.device.create_pipeline_layout(
                    &wgpu::PipelineLayoutDescriptor {
                        label: Some(&format!("{label}_pipeline_layout")),
                        bind_group_layouts: &[&bind_group_layout],
                        push_constant_ranges: &[],
                    },
                );

                let pipeline = self.device.create_compute_pipeline(
                    &wgpu::ComputePipelineDescriptor {
                        label: Some(&label),
                        layout: Some(&pipeline_layout),
                        module: &module,
                        entry_point: "main",
                    },
                );

                WgpuPipeline {
                    kernel,
                    bind_group_layout,
                    pipeline,
                }
            },
            |err| Error::resource(&label, err),
        )
    }

    fn dispatch(
        &self,
        pipeline: &WgpuPipeline,
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

        if work_items == 0 {
            return Ok(());
        }

        let workgroups = (work_items + WORKGROUP_SIZE - 1) / WORKGROUP_SIZE;
        let max_workgroups =
            self.device.limits().max_compute_workgroups_per_dimension;

        if workgroups > max_workgroups {
            return Err(Error::dispatch(
                kernel,
                format!(
                    "{work_items} work-items need {workgroups} workgroups, \
                     but the device supports up to {max_workgroups}"
                ),
            ));
        }

        let label = format!("wavefront_{}", kernel.name());

        let params = kernel.has_params().then(|| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{label}_params")),
                    contents: params,
                    usage: wgpu::BufferUsages::UNIFORM,
                })
        });

        let mut entries = Vec::with_capacity(decls.len() + 1);

        for (binding, (decl, resource)) in
            decls.iter().zip(resources).enumerate()
        {
            let resource = match (decl.access, resource) {
                (Access::Surface, Resource::Buffer(_)) => {
                    return Err(wrong_resource(kernel, decl.name));
                }

                (_, Resource::Buffer(buffer)) => {
                    buffer.buffer.as_entire_binding()
                }

                (Access::Surface, Resource::Surface(surface)) => {
                    if !surface.is_acquired() {
                        return Err(Error::SurfaceNotAcquired(
                            surface.label.to_string(),
                        ));
                    }

                    wgpu::BindingResource::TextureView(&surface.view)
                }

                (_, Resource::Surface(_)) => {
                    return Err(wrong_resource(kernel, decl.name));
                }
            };

            entries.push(wgpu::BindGroupEntry {
                binding: binding as u32,
                resource,
            });
        }

        if let Some(params) = &params {
            entries.push(wgpu::BindGroupEntry {
                binding: decls.len() as u32,
                resource: params.as_entire_binding(),
            });
        }

        trace!("Dispatching `{kernel}`; work_items={work_items}");

        // A buffer bound twice with at least one writable binding fails the
        // validation here, which gets reported as a dispatch error
        self.scoped(
            || {
                let bind_group =
                    self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                        label: Some(&label),
                        layout: &pipeline.bind_group_layout,
                        entries: &entries,
                    });

                let mut encoder = self.device.create_command_encoder(
                    &wgpu::CommandEncoderDescriptor {
                        label: Some(&label),
                    },
                );

                {
                    let mut pass = encoder.begin_compute_pass(
                        &wgpu::ComputePassDescriptor {
                            label: Some(&label),
                            ..Default::default()
                        },
                    );

                    pass.set_pipeline(&pipeline.pipeline);
                    pass.set_bind_group(0, &bind_group, &[]);
                    pass.dispatch_workgroups(workgroups, 1, 1);
                }

                self.queue.submit(Some(encoder.finish()));
            },
            |err| Error::dispatch(kernel, err),
        )
    }

    fn acquire_surface(&self, surface: &WgpuSurface) -> Result<()> {
        if surface.acquired.swap(true, Ordering::SeqCst) {
            return Err(Error::SurfaceAcquired(surface.label.to_string()));
        }

        Ok(())
    }

    fn release_surface(&self, surface: &WgpuSurface) -> Result<()> {
        if !surface.acquired.swap(false, Ordering::SeqCst) {
            return Err(Error::SurfaceNotAcquired(surface.label.to_string()));
        }

        Ok(())
    }

    fn finish(&self) -> Result<()> {
        self.device.poll(wgpu::Maintain::Wait);

        Ok(())
    }
}

fn wrong_resource(kernel: Kernel, param: &str) -> Error {
    Error::dispatch(
        kernel,
        format!("`{param}` is bound to a wrong kind of resource"),
    )
}

fn buffer_usages() -> wgpu::BufferUsages {
    wgpu::BufferUsages::STORAGE
        | wgpu::BufferUsages::COPY_SRC
        | wgpu::BufferUsages::COPY_DST
}

/// Rounds the size up to whole `Vec4`s; `wgpu` doesn't allow for empty
/// bindings and copies must be 4-byte aligned.
fn padded_size(size: usize) -> u64 {
    (((size + 15) / 16).max(1) * 16) as u64
}

fn layout_entries(kernel: Kernel) -> Vec<wgpu::BindGroupLayoutEntry> {
    let storage = |read_only| wgpu::BindingType::Buffer {
        ty: wgpu::BufferBindingType::Storage { read_only },
        has_dynamic_offset: false,
        min_binding_size: None,
    };

    let mut entries: Vec<_> = kernel
        .params()
        .iter()
        .enumerate()
        .map(|(binding, param)| wgpu::BindGroupLayoutEntry {
            binding: binding as u32,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: match param.access {
                Access::Read => storage(true),
                Access::ReadWrite => storage(false),
                Access::Surface => wgpu::BindingType::StorageTexture {
                    access: wgpu::StorageTextureAccess::WriteOnly,
                    format: SURFACE_FORMAT,
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
            },
            count: None,
        })
        .collect();

    // Parameter block always goes right after the declared parameters
    if kernel.has_params() {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: entries.len() as u32,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        });
    }

    entries
}

macro_rules! shader {
    ($name:literal) => {
        concat!(
            include_str!("shaders/common.wgsl"),
            include_str!(concat!("shaders/", $name, ".wgsl")),
        )
    };
}

fn shader_source(kernel: Kernel) -> &'static str {
    match kernel {
        Kernel::Raygen => shader!("raygen"),
        Kernel::Intersect => shader!("intersect"),
        Kernel::ShadeMiss => shader!("shade_miss"),
        Kernel::ShadeHit => shader!("shade_hit"),
        Kernel::ClearCounter => shader!("clear_counter"),
        Kernel::IncrementCounter => shader!("increment_counter"),
        Kernel::ResetRadiance => shader!("reset_radiance"),
        Kernel::Resolve => shader!("resolve"),
    }
}

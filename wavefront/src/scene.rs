use derivative::Derivative;
use glam::{Vec3, Vec4};
use log::info;

use crate::{gpu, Device, Error, Result};

/// Device-side handles of a scene, as consumed by the integrator.
///
/// Handles are cheap to clone; after a scene gets re-uploaded, the new one
/// must be passed to [`crate::Integrator::set_scene_data()`].
#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""))]
pub struct Scene<D>
where
    D: Device,
{
    pub triangles: D::Buffer,
    pub materials: D::Buffer,
    pub environment: D::Buffer,
}

impl<D> Scene<D>
where
    D: Device,
{
    pub fn new(
        triangles: D::Buffer,
        materials: D::Buffer,
        environment: D::Buffer,
    ) -> Self {
        Self {
            triangles,
            materials,
            environment,
        }
    }

    /// Uploads given geometry into freshly allocated buffers.
    pub fn upload(
        device: &D,
        triangles: &[gpu::Triangle],
        materials: &[gpu::Material],
        environment: &Environment,
    ) -> Result<Self> {
        info!(
            "Uploading scene; triangles = {}, materials = {}, env = {}x{}",
            triangles.len(),
            materials.len(),
            environment.width(),
            environment.height(),
        );

        // Backends don't like empty buffers, so an empty list gets a single
        // zeroed entry; views compute their lengths in whole items, which
        // makes that entry invisible
        let triangles = if triangles.is_empty() {
            device.create_buffer_init(
                "wavefront_triangles",
                bytemuck::bytes_of(&Vec4::ZERO),
            )?
        } else {
            device.create_buffer_init(
                "wavefront_triangles",
                bytemuck::cast_slice(triangles),
            )?
        };

        let materials = if materials.is_empty() {
            device.create_buffer_init(
                "wavefront_materials",
                bytemuck::bytes_of(&Vec4::ZERO),
            )?
        } else {
            device.create_buffer_init(
                "wavefront_materials",
                bytemuck::cast_slice(materials),
            )?
        };

        let environment = device.create_buffer_init(
            "wavefront_environment",
            bytemuck::cast_slice(&environment.serialize()),
        )?;

        Ok(Self::new(triangles, materials, environment))
    }
}

/// Latitude-longitude environment map.
#[derive(Clone, Debug, PartialEq)]
pub struct Environment {
    width: u32,
    height: u32,
    texels: Vec<Vec3>,
}

impl Environment {
    /// Environment that doesn't emit any light.
    pub fn black() -> Self {
        Self {
            width: 0,
            height: 0,
            texels: Vec::new(),
        }
    }

    /// Environment emitting the same radiance from every direction.
    pub fn constant(color: Vec3) -> Self {
        Self {
            width: 1,
            height: 1,
            texels: vec![color],
        }
    }

    /// Creates an environment out of row-major texels, with the top row
    /// mapping to `+Y`.
    pub fn lat_long(
        width: u32,
        height: u32,
        texels: Vec<Vec3>,
    ) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| {
                Error::InvalidScene(format!(
                    "environment is too large: {width}x{height}"
                ))
            })?;

        if expected != texels.len() {
            return Err(Error::InvalidScene(format!(
                "{width}x{height} environment needs {expected} texels, got {}",
                texels.len()
            )));
        }

        if expected == 0 {
            return Ok(Self::black());
        }

        Ok(Self {
            width,
            height,
            texels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn texels(&self) -> &[Vec3] {
        &self.texels
    }

    pub fn serialize(&self) -> Vec<Vec4> {
        let header =
            gpu::EnvironmentView::encode_header(self.width, self.height);

        Some(header)
            .into_iter()
            .chain(self.texels.iter().map(|texel| texel.extend(1.0)))
            .collect()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::black()
    }
}

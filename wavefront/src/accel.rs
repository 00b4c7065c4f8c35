use log::debug;

use crate::{gpu, ComputePass, Device, Kernel, Result, Scene};

/// Structure that finds the nearest hit of every ray in a stream.
///
/// Implementations are free to keep any acceleration data they need, as long
/// as `hits[i]` ends up describing `rays[i]` for every
/// `i < min(ray_counter, max_rays)`; entries past that are left unspecified.
pub trait AccelerationStructure<D>
where
    D: Device,
{
    /// Called whenever the scene changes (including its first upload).
    fn set_scene(&mut self, device: &D, scene: &Scene<D>) -> Result<()>;

    /// Enqueues intersection of given ray stream.
    fn intersect_rays(
        &mut self,
        device: &D,
        rays: &D::Buffer,
        ray_counter: &D::Buffer,
        max_rays: u32,
        hits: &D::Buffer,
    ) -> Result<()>;
}

/// Acceleration structure that tests every ray against every triangle.
///
/// It has no build step, which makes it a good fit for small scenes and for
/// testing.
#[derive(Debug)]
pub struct BruteForceAccel<D>
where
    D: Device,
{
    pass: ComputePass<D, gpu::IntersectPassParams>,
}

impl<D> BruteForceAccel<D>
where
    D: Device,
{
    pub fn new(device: &D) -> Result<Self> {
        Ok(Self {
            pass: ComputePass::new(device, Kernel::Intersect)?,
        })
    }

    pub fn set_triangles(&mut self, triangles: &D::Buffer) -> Result<()> {
        debug!("Rebinding triangles");

        self.pass.bind("triangles", triangles)?;

        Ok(())
    }
}

impl<D> AccelerationStructure<D> for BruteForceAccel<D>
where
    D: Device,
{
    fn set_scene(&mut self, _: &D, scene: &Scene<D>) -> Result<()> {
        self.set_triangles(&scene.triangles)
    }

    fn intersect_rays(
        &mut self,
        device: &D,
        rays: &D::Buffer,
        ray_counter: &D::Buffer,
        max_rays: u32,
        hits: &D::Buffer,
    ) -> Result<()> {
        self.pass
            .bind("rays", rays)?
            .bind("ray_counter", ray_counter)?
            .bind("hits", hits)?;

        let params = gpu::IntersectPassParams {
            max_rays,
            ..Default::default()
        };

        self.pass.run(device, &params, max_rays)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{vec3, Vec3, Vec4};

    use super::*;
    use crate::{CpuDevice, Environment, Error};

    #[test]
    fn intersect_rays() {
        let device = CpuDevice::new();

        let triangle = gpu::Triangle::new(
            [
                vec3(-1.0, -1.0, -2.0),
                vec3(1.0, -1.0, -2.0),
                vec3(0.0, 1.0, -2.0),
            ],
            gpu::MaterialId::new(0),
        );

        let scene = Scene::upload(
            &device,
            &[triangle],
            &[gpu::Material::default()],
            &Environment::black(),
        )
        .unwrap();

        let rays: Vec<Vec4> = [
            gpu::Ray::new(Vec3::ZERO, Vec3::NEG_Z),
            gpu::Ray::new(Vec3::ZERO, Vec3::Z),
            gpu::Ray::new(Vec3::ZERO, Vec3::NEG_Z),
        ]
        .into_iter()
        .flat_map(|ray| ray.pack())
        .collect();

        let rays = device
            .create_buffer_init("rays", bytemuck::cast_slice(&rays))
            .unwrap();

        // The third ray is past the counter, so it must not get traced
        let ray_counter = device
            .create_buffer_init("ray_counter", bytemuck::bytes_of(&2u32))
            .unwrap();

        let hits = device.create_buffer("hits", 3 * 16).unwrap();

        let mut accel = BruteForceAccel::new(&device).unwrap();

        // ---
        // Case 1: No scene yet

        let err = accel
            .intersect_rays(&device, &rays, &ray_counter, 3, &hits)
            .unwrap_err();

        assert!(
            matches!(err, Error::UnboundParameter { param: "triangles", .. }),
            "{err}"
        );

        // ---
        // Case 2: All good

        accel.set_scene(&device, &scene).unwrap();
        accel
            .intersect_rays(&device, &rays, &ray_counter, 3, &hits)
            .unwrap();

        let hits: Vec<Vec4> =
            bytemuck::pod_collect_to_vec(&device.read_buffer(&hits).unwrap());

        let hit0 = gpu::TriangleHit::unpack(hits[0]);
        let hit1 = gpu::TriangleHit::unpack(hits[1]);
        let hit2 = gpu::TriangleHit::unpack(hits[2]);

        assert!(hit0.is_some());
        assert_relative_eq!(2.0, hit0.distance, epsilon = 1e-5);
        assert!(hit1.is_none());

        // Untouched, i.e. still zeroed
        assert_eq!(0, hit2.triangle_id.get());
    }
}

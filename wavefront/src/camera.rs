use std::f32::consts::PI;

use glam::Vec3;

use crate::{gpu, Error, IntegratorConfig, Result};

/// Camera as seen by the integrator.
///
/// `up` doesn't have to be orthogonal to `front`; the integrator derives an
/// orthonormal basis out of both.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub origin: Vec3,
    pub front: Vec3,
    pub up: Vec3,
    pub frame_count: u32,
    pub aperture: f32,
    pub focus_distance: f32,

    /// Vertical field of view, in radians.
    pub fov: f32,
}

impl Camera {
    pub fn describe(&self) -> String {
        format!(
            "origin={}, front={}, up={}, aperture={}",
            self.origin, self.front, self.up, self.aperture
        )
    }

    pub(crate) fn serialize(
        &self,
        config: &IntegratorConfig,
        seed: u32,
    ) -> Result<gpu::RaygenPassParams> {
        let (front, right, up) = self.basis()?;

        if !(self.fov > 0.0 && self.fov < PI) {
            return Err(Error::InvalidCamera(format!(
                "field of view must be within (0, pi), got {}",
                self.fov
            )));
        }

        Ok(gpu::RaygenPassParams {
            origin: self.origin.extend(self.aperture.max(0.0)),
            front: front.extend(self.focus_distance),
            right: right.extend((0.5 * self.fov).tan()),
            up: up.extend(0.0),
            width: config.width,
            height: config.height,
            frame: self.frame_count,
            seed,
        })
    }

    fn basis(&self) -> Result<(Vec3, Vec3, Vec3)> {
        if self.front.length_squared() == 0.0 {
            return Err(Error::InvalidCamera("front vector is zero".into()));
        }

        if self.front.cross(self.up).length_squared() == 0.0 {
            return Err(Error::InvalidCamera(
                "front and up vectors are collinear".into(),
            ));
        }

        Ok(gpu::LensCamera::basis(self.front, self.up))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            frame_count: 0,
            aperture: 0.0,
            focus_distance: 1.0,
            fov: PI / 3.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec3;

    use super::*;

    #[test]
    fn serialize() {
        let config = IntegratorConfig::new(8, 4);

        let camera = Camera {
            origin: vec3(1.0, 2.0, 3.0),
            front: vec3(0.0, 0.0, 5.0),
            up: vec3(0.0, 1.0, 1.0),
            frame_count: 12,
            aperture: 0.25,
            focus_distance: 3.0,
            fov: PI / 2.0,
        };

        let params = camera.serialize(&config, 1234).unwrap();
        let lens = params.camera();

        assert_eq!(camera.origin, lens.origin);
        assert_relative_eq!(1.0, lens.front.z);
        assert_relative_eq!(1.0, lens.up.y);
        assert_relative_eq!(-1.0, lens.right.x);
        assert_relative_eq!(1.0, lens.tan_half_fov, epsilon = 1e-6);
        assert_relative_eq!(0.25, lens.aperture);
        assert_relative_eq!(3.0, lens.focus_distance);
        assert_eq!(8, params.width);
        assert_eq!(4, params.height);
        assert_eq!(12, params.frame);
        assert_eq!(1234, params.seed);
    }

    #[test]
    fn degenerate() {
        let config = IntegratorConfig::new(1, 1);

        let camera = Camera {
            front: Vec3::ZERO,
            ..Default::default()
        };

        assert!(camera.serialize(&config, 0).is_err());

        let camera = Camera {
            front: Vec3::Y,
            up: Vec3::Y * 2.0,
            ..Default::default()
        };

        assert!(camera.serialize(&config, 0).is_err());

        let camera = Camera {
            fov: 0.0,
            ..Default::default()
        };

        assert!(camera.serialize(&config, 0).is_err());
    }
}

use core::f32::consts::PI;

use glam::{vec2, Vec2, Vec3};

/// Perfectly diffuse BRDF.
#[derive(Clone, Copy)]
pub struct LambertBrdf {
    pub base_color: Vec3,
}

impl LambertBrdf {
    pub fn new(base_color: Vec3) -> Self {
        Self { base_color }
    }

    /// Samples an outgoing direction proportionally to the cosine term around
    /// given normal, using two uniform numbers from `<0.0, 1.0)`.
    ///
    /// Returns the direction and the path weight, i.e. `brdf * cos / pdf`;
    /// for cosine-weighted sampling of a Lambertian surface that's just its
    /// base color.
    pub fn sample(self, normal: Vec3, u: Vec2) -> (Vec3, Vec3) {
        let (t, b) = normal.any_orthonormal_pair();
        let local = Self::sample_cosine_hemisphere(u);

        let direction =
            (t * local.x + b * local.y + normal * local.z).normalize();

        (direction, self.base_color)
    }

    pub fn pdf(normal: Vec3, direction: Vec3) -> f32 {
        normal.dot(direction).max(0.0) / PI
    }

    fn sample_cosine_hemisphere(u: Vec2) -> Vec3 {
        let radius = u.x.sqrt();
        let angle = 2.0 * PI * u.y;
        let disk = vec2(angle.cos(), angle.sin()) * radius;

        disk.extend((1.0 - u.x).max(0.0).sqrt())
    }
}

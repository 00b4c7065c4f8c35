use glam::{vec2, UVec2, Vec2, Vec3};

use crate::Ray;

/// Thin-lens camera used to generate primary rays.
///
/// With `aperture` equal to zero this degenerates into a pinhole camera, in
/// which case `focus_distance` doesn't matter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LensCamera {
    pub origin: Vec3,
    pub front: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub tan_half_fov: f32,
    pub aperture: f32,
    pub focus_distance: f32,
}

impl LensCamera {
    /// Builds an orthonormal basis out of the front and up vectors; `up`
    /// doesn't have to be orthogonal to `front`.
    ///
    /// Returns `(front, right, up)`.
    pub fn basis(front: Vec3, up: Vec3) -> (Vec3, Vec3, Vec3) {
        let front = front.normalize();
        let right = front.cross(up).normalize();
        let up = right.cross(front);

        (front, right, up)
    }

    /// Casts a ray through given pixel.
    ///
    /// `jitter` is the sub-pixel offset from `<0.0, 1.0)`, `lens` is a point
    /// on the unit disk.
    pub fn ray(
        &self,
        screen_size: UVec2,
        screen_pos: UVec2,
        jitter: Vec2,
        lens: Vec2,
    ) -> Ray {
        let screen_size = screen_size.as_vec2();
        let aspect = screen_size.x / screen_size.y;
        let ndc = (screen_pos.as_vec2() + jitter) / screen_size * 2.0 - 1.0;
        let ndc = vec2(ndc.x * aspect, -ndc.y) * self.tan_half_fov;

        let direction =
            (self.front + self.right * ndc.x + self.up * ndc.y).normalize();

        if self.aperture <= 0.0 {
            return Ray::new(self.origin, direction);
        }

        let focus_point = self.origin
            + direction * (self.focus_distance / direction.dot(self.front));

        let lens = lens * (0.5 * self.aperture);
        let origin = self.origin + self.right * lens.x + self.up * lens.y;

        Ray::new(origin, (focus_point - origin).normalize())
    }
}

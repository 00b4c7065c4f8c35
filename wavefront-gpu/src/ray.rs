use glam::{Vec3, Vec4, Vec4Swizzles};

/// A ray stored in a ray stream.
///
/// Packed as two `Vec4`s: `[origin, t_min]` and `[direction, t_max]`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
    t_min: f32,
    t_max: f32,
}

impl Ray {
    /// Number of `Vec4`s a single ray occupies in a stream.
    pub const STRIDE: usize = 2;

    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            t_min: 0.0,
            t_max: f32::MAX,
        }
    }

    pub fn with_range(mut self, t_min: f32, t_max: f32) -> Self {
        self.t_min = t_min;
        self.t_max = t_max;
        self
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn t_min(&self) -> f32 {
        self.t_min
    }

    pub fn t_max(&self) -> f32 {
        self.t_max
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    pub fn pack(self) -> [Vec4; 2] {
        [
            self.origin.extend(self.t_min),
            self.direction.extend(self.t_max),
        ]
    }

    pub fn unpack([d0, d1]: [Vec4; 2]) -> Self {
        Self {
            origin: d0.xyz(),
            direction: d1.xyz(),
            t_min: d0.w,
            t_max: d1.w,
        }
    }

    /// Reads `idx`-th ray from given stream.
    pub fn read(rays: &[Vec4], idx: usize) -> Self {
        Self::unpack([
            rays[Self::STRIDE * idx],
            rays[Self::STRIDE * idx + 1],
        ])
    }

    /// Writes this ray as `idx`-th ray of given stream.
    pub fn write(self, rays: &mut [Vec4], idx: usize) {
        let [d0, d1] = self.pack();

        rays[Self::STRIDE * idx] = d0;
        rays[Self::STRIDE * idx + 1] = d1;
    }
}

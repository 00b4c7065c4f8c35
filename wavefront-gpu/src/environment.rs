use core::f32::consts::PI;

use glam::{vec4, Vec3, Vec4, Vec4Swizzles};

/// Read-only view over the environment buffer.
///
/// The buffer starts with a header (`[width, height, 0, 0]`, stored as bits)
/// followed by `width * height` texels of a latitude-longitude map; an empty
/// map (`0x0`) is treated as a black environment.
#[derive(Clone, Copy)]
pub struct EnvironmentView<'a> {
    buffer: &'a [Vec4],
}

impl<'a> EnvironmentView<'a> {
    pub fn new(buffer: &'a [Vec4]) -> Self {
        Self { buffer }
    }

    pub fn encode_header(width: u32, height: u32) -> Vec4 {
        vec4(f32::from_bits(width), f32::from_bits(height), 0.0, 0.0)
    }

    pub fn width(self) -> u32 {
        self.buffer.first().map_or(0, |header| header.x.to_bits())
    }

    pub fn height(self) -> u32 {
        self.buffer.first().map_or(0, |header| header.y.to_bits())
    }

    /// Returns radiance arriving from given direction.
    pub fn sample(self, direction: Vec3) -> Vec3 {
        let width = self.width();
        let height = self.height();

        if width == 0 || height == 0 {
            return Vec3::ZERO;
        }

        let direction = direction.normalize_or_zero();
        let u = 0.5 + direction.x.atan2(-direction.z) / (2.0 * PI);
        let v = direction.y.clamp(-1.0, 1.0).acos() / PI;

        let x = ((u * width as f32) as u32).min(width - 1);
        let y = ((v * height as f32) as u32).min(height - 1);
        let idx = 1 + (y * width + x) as usize;

        self.buffer.get(idx).map_or(Vec3::ZERO, |texel| texel.xyz())
    }
}

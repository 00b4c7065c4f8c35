use glam::{vec4, Vec2, Vec4};

use crate::TriangleId;

/// Result of intersecting a single ray with the scene.
///
/// Packed as a single `Vec4`: `[distance, u, v, triangle id]`; a missed ray
/// carries `TriangleHit::NONE_ID` as its triangle id.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TriangleHit {
    pub distance: f32,
    pub uv: Vec2,
    pub triangle_id: TriangleId,
}

impl TriangleHit {
    pub const NONE_ID: u32 = u32::MAX;

    /// How far to move a hit point away from its surface to avoid
    /// self-intersection when spawning the next ray.
    pub const NUDGE_OFFSET: f32 = 0.001;

    pub fn none() -> Self {
        Self {
            distance: f32::MAX,
            uv: Vec2::ZERO,
            triangle_id: TriangleId::new(Self::NONE_ID),
        }
    }

    pub fn is_some(&self) -> bool {
        self.triangle_id.get() != Self::NONE_ID
    }

    pub fn is_none(&self) -> bool {
        !self.is_some()
    }

    pub fn pack(self) -> Vec4 {
        vec4(
            self.distance,
            self.uv.x,
            self.uv.y,
            f32::from_bits(self.triangle_id.get()),
        )
    }

    pub fn unpack(d0: Vec4) -> Self {
        Self {
            distance: d0.x,
            uv: Vec2::new(d0.y, d0.z),
            triangle_id: TriangleId::new(d0.w.to_bits()),
        }
    }
}

impl Default for TriangleHit {
    fn default() -> Self {
        Self::none()
    }
}

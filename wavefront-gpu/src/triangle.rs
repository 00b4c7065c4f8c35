use bytemuck::{Pod, Zeroable};
use glam::{vec2, Vec3, Vec4, Vec4Swizzles};

use crate::{MaterialId, Ray, TriangleHit};

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Triangle {
    pub d0: Vec4,
    pub d1: Vec4,
    pub d2: Vec4,
}

impl Triangle {
    /// Number of `Vec4`s a single triangle occupies in the buffer.
    pub const STRIDE: usize = 3;

    pub fn new(positions: [Vec3; 3], material_id: MaterialId) -> Self {
        Self {
            d0: positions[0].extend(f32::from_bits(material_id.get())),
            d1: positions[1].extend(0.0),
            d2: positions[2].extend(0.0),
        }
    }

    pub fn position0(&self) -> Vec3 {
        self.d0.xyz()
    }

    pub fn position1(&self) -> Vec3 {
        self.d1.xyz()
    }

    pub fn position2(&self) -> Vec3 {
        self.d2.xyz()
    }

    pub fn positions(&self) -> [Vec3; 3] {
        [self.position0(), self.position1(), self.position2()]
    }

    pub fn material_id(&self) -> MaterialId {
        MaterialId::new(self.d0.w.to_bits())
    }

    /// Returns the geometric normal, i.e. the one following the winding order.
    pub fn normal(&self) -> Vec3 {
        (self.position1() - self.position0())
            .cross(self.position2() - self.position0())
            .normalize()
    }

    /// Intersects given ray with this triangle, updating `hit` if this
    /// triangle is closer than whatever `hit` contains so far.
    ///
    /// See: Möller–Trumbore intersection algorithm.
    pub fn hit(&self, ray: Ray, id: TriangleId, hit: &mut TriangleHit) -> bool {
        let v0v1 = self.position1() - self.position0();
        let v0v2 = self.position2() - self.position0();

        // ---

        let pvec = ray.direction().cross(v0v2);
        let det = v0v1.dot(pvec);

        if det.abs() < f32::EPSILON {
            return false;
        }

        // ---

        let inv_det = 1.0 / det;
        let tvec = ray.origin() - self.position0();
        let u = tvec.dot(pvec) * inv_det;
        let qvec = tvec.cross(v0v1);
        let v = ray.direction().dot(qvec) * inv_det;
        let distance = v0v2.dot(qvec) * inv_det;

        if (u < 0.0)
            | (u > 1.0)
            | (v < 0.0)
            | (u + v > 1.0)
            | (distance <= ray.t_min())
            | (distance >= ray.t_max())
            | (distance >= hit.distance)
        {
            return false;
        }

        hit.distance = distance;
        hit.uv = vec2(u, v);
        hit.triangle_id = id;

        true
    }
}

/// Read-only view over the triangles buffer.
#[derive(Clone, Copy)]
pub struct TrianglesView<'a> {
    buffer: &'a [Vec4],
}

impl<'a> TrianglesView<'a> {
    pub fn new(buffer: &'a [Vec4]) -> Self {
        Self { buffer }
    }

    pub fn len(self) -> usize {
        self.buffer.len() / Triangle::STRIDE
    }

    /// Returns triangle with given id, or `None` if the id points outside of
    /// the buffer.
    pub fn get(self, id: TriangleId) -> Option<Triangle> {
        if id.get() as usize >= self.len() {
            return None;
        }

        let idx = Triangle::STRIDE * id.get() as usize;

        Some(Triangle {
            d0: self.buffer[idx],
            d1: self.buffer[idx + 1],
            d2: self.buffer[idx + 2],
        })
    }

    /// Finds the nearest triangle hit by given ray.
    ///
    /// This is a brute-force loop over all triangles; fine for small scenes
    /// and for the reference backend.
    pub fn trace_nearest(self, ray: Ray) -> TriangleHit {
        let mut hit = TriangleHit::none();
        let mut id = 0;

        while id < self.len() as u32 {
            let triangle_id = TriangleId::new(id);

            if let Some(triangle) = self.get(triangle_id) {
                triangle.hit(ray, triangle_id, &mut hit);
            }

            id += 1;
        }

        hit
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TriangleId(u32);

impl TriangleId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

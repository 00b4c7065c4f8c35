use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4, Vec4Swizzles};

/// A Lambertian material with optional emission.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Material {
    pub base_color: Vec4,
    pub emissive: Vec4,
}

impl Material {
    /// Number of `Vec4`s a single material occupies in the buffer.
    pub const STRIDE: usize = 2;

    pub fn new(base_color: Vec3, emissive: Vec3) -> Self {
        Self {
            base_color: base_color.extend(1.0),
            emissive: emissive.extend(0.0),
        }
    }

    pub fn base_color(&self) -> Vec3 {
        self.base_color.xyz()
    }

    pub fn emissive(&self) -> Vec3 {
        self.emissive.xyz()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MaterialId(u32);

impl MaterialId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// Read-only view over the materials buffer.
#[derive(Clone, Copy)]
pub struct MaterialsView<'a> {
    buffer: &'a [Vec4],
}

impl<'a> MaterialsView<'a> {
    pub fn new(buffer: &'a [Vec4]) -> Self {
        Self { buffer }
    }

    pub fn len(self) -> usize {
        self.buffer.len() / Material::STRIDE
    }

    /// Returns material with given id; ids pointing outside of the buffer
    /// resolve to a black, non-emissive material.
    pub fn get(self, id: MaterialId) -> Material {
        let idx = id.get() as usize;

        if idx >= self.len() {
            return Default::default();
        }

        Material {
            base_color: self.buffer[Material::STRIDE * idx],
            emissive: self.buffer[Material::STRIDE * idx + 1],
        }
    }
}

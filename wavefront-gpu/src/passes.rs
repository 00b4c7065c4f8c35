use bytemuck::{Pod, Zeroable};
use glam::{Vec4, Vec4Swizzles};

use crate::LensCamera;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct RaygenPassParams {
    /// Camera's origin; `w` holds the aperture.
    pub origin: Vec4,

    /// Camera's front vector; `w` holds the focus distance.
    pub front: Vec4,

    /// Camera's right vector; `w` holds `tan(fov / 2)`.
    pub right: Vec4,

    pub up: Vec4,
    pub width: u32,
    pub height: u32,
    pub frame: u32,
    pub seed: u32,
}

impl RaygenPassParams {
    pub fn camera(&self) -> LensCamera {
        LensCamera {
            origin: self.origin.xyz(),
            front: self.front.xyz(),
            right: self.right.xyz(),
            up: self.up.xyz(),
            tan_half_fov: self.right.w,
            aperture: self.origin.w,
            focus_distance: self.front.w,
        }
    }

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct IntersectPassParams {
    pub max_rays: u32,
    pub _pad0: u32,
    pub _pad1: u32,
    pub _pad2: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct ShadeMissPassParams {
    pub max_rays: u32,
    pub _pad0: u32,
    pub _pad1: u32,
    pub _pad2: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct ShadeHitPassParams {
    pub width: u32,
    pub height: u32,
    pub bounce: u32,
    pub roulette_start: u32,
}

impl ShadeHitPassParams {
    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct ResetRadiancePassParams {
    pub pixel_count: u32,
    pub _pad0: u32,
    pub _pad1: u32,
    pub _pad2: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct ResolvePassParams {
    pub width: u32,
    pub height: u32,
    pub _pad0: u32,
    pub _pad1: u32,
}

impl ResolvePassParams {
    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }
}

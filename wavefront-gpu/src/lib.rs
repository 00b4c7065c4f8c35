//! Common structs and algorithms shared by the wavefront kernels and the
//! integrator.
//!
//! Everything in here operates on plain `Vec4` / `u32` words, so that the same
//! layout can be uploaded into a storage buffer as-is.

#![allow(clippy::len_without_is_empty)]
#![allow(clippy::manual_range_contains)]

mod blue_noise;
mod brdf;
mod camera;
mod environment;
mod hit;
mod material;
mod noise;
mod passes;
mod ray;
mod roulette;
mod stream;
mod triangle;
mod utils;

pub use self::blue_noise::*;
pub use self::brdf::*;
pub use self::camera::*;
pub use self::environment::*;
pub use self::hit::*;
pub use self::material::*;
pub use self::noise::*;
pub use self::passes::*;
pub use self::ray::*;
pub use self::roulette::*;
pub use self::stream::*;
pub use self::triangle::*;
pub use self::utils::*;

pub mod prelude {
    pub use core::f32::consts::PI;

    pub use glam::*;

    pub use crate::*;
}

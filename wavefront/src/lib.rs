//! Scheduler of a wavefront path tracer.
//!
//! The [`Integrator`] drives one progressive frame per
//! [`Integrator::integrate()`] call: it generates camera rays, bounces them
//! through the scene while compacting surviving paths between two ping-ponged
//! ray streams, and finally resolves the accumulated radiance into a display
//! surface.
//!
//! All device work goes through the [`Device`] facade; [`CpuDevice`] runs the
//! kernels on the host, `WgpuDevice` (behind the `wgpu` feature) runs them on
//! a GPU.

mod accel;
mod buffers;
mod camera;
mod config;
mod device;
mod error;
mod integrator;
mod noise;
mod pass;
mod passes;
mod scene;

pub use wavefront_gpu as gpu;

pub use self::accel::*;
pub use self::buffers::*;
pub use self::camera::*;
pub use self::config::*;
pub use self::device::*;
pub use self::error::*;
pub use self::integrator::*;
pub use self::noise::*;
pub use self::pass::*;
pub use self::passes::*;
pub use self::scene::*;

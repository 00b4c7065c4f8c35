//! Wavefront stage kernels.
//!
//! Each module exposes a `main()` that processes a single work-item of its
//! stage; backends are responsible for launching it over the right number of
//! work-items and for handing it the buffers it declares.

pub mod clear_counter;
pub mod increment_counter;
pub mod intersect;
pub mod raygen;
pub mod reset_radiance;
pub mod resolve;
pub mod shade_hit;
pub mod shade_miss;

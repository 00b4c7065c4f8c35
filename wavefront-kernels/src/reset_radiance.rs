use wavefront_gpu::prelude::*;

pub fn main(
    global_idx: u32,
    params: &ResetRadiancePassParams,
    radiance: &mut [Vec4],
) {
    if global_idx >= params.pixel_count {
        return;
    }

    radiance[global_idx as usize] = Vec4::ZERO;
}

use wavefront_gpu::prelude::*;

pub fn main(
    global_idx: u32,
    params: &ResolvePassParams,
    radiance: &[Vec4],
    sample_counter: &[u32],
    surface: &mut [Vec4],
) {
    if global_idx >= params.pixel_count() {
        return;
    }

    let samples = sample_counter[0].max(1) as f32;
    let color = radiance[global_idx as usize].xyz() / samples;

    surface[global_idx as usize] = color.extend(1.0);
}

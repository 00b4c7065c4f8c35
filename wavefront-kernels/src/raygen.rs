use wavefront_gpu::prelude::*;

pub fn main(
    global_idx: u32,
    params: &RaygenPassParams,
    rays: &mut [Vec4],
    pixel_indices: &mut [u32],
    ray_counter: &mut [u32],
    throughputs: &mut [Vec4],
) {
    if global_idx >= params.pixel_count() {
        return;
    }

    // Generation always emits one ray per pixel, so there's no need to count
    // them one by one
    if global_idx == 0 {
        ray_counter[0] = params.pixel_count();
    }

    let screen_size = uvec2(params.width, params.height);
    let screen_pos = idx_to_screen(global_idx, params.width);
    let mut wnoise = WhiteNoise::new(params.seed ^ params.frame, global_idx);

    let jitter = vec2(wnoise.sample(), wnoise.sample());
    let lens = wnoise.sample_disk();
    let ray = params.camera().ray(screen_size, screen_pos, jitter, lens);

    ray.write(rays, global_idx as usize);
    pixel_indices[global_idx as usize] = global_idx;
    throughputs[global_idx as usize] = Vec4::ONE;
}

use wavefront_gpu::prelude::*;

/// Brute-force intersection of the incoming stream against all triangles.
pub fn main(
    global_idx: u32,
    params: &IntersectPassParams,
    rays: &[Vec4],
    ray_counter: &[u32],
    triangles: &[Vec4],
    hits: &mut [Vec4],
) {
    let live = ray_counter[0]
        .min(params.max_rays)
        .min((rays.len() / Ray::STRIDE) as u32);

    if global_idx >= live {
        return;
    }

    let ray = Ray::read(rays, global_idx as usize);
    let hit = TrianglesView::new(triangles).trace_nearest(ray);

    hits[global_idx as usize] = hit.pack();
}

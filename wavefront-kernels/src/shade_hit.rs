use wavefront_gpu::prelude::*;

#[allow(clippy::too_many_arguments)]
pub fn main(
    global_idx: u32,
    params: &ShadeHitPassParams,
    in_rays: &[Vec4],
    in_pixel_indices: &[u32],
    in_ray_counter: &[u32],
    hits: &[Vec4],
    triangles: &[Vec4],
    materials: &[Vec4],
    sample_counter: &[u32],
    blue_noise_sequence: &[u32],
    blue_noise_scrambling_tile: &[u32],
    blue_noise_ranking_tile: &[u32],
    throughputs: &mut [Vec4],
    out_rays: &mut [Vec4],
    out_pixel_indices: &mut [u32],
    out_ray_counter: &mut [u32],
    radiance: &mut [Vec4],
) {
    if global_idx >= params.pixel_count() {
        return;
    }

    let Some((ray, pixel_idx)) =
        RayStream::new(in_rays, in_pixel_indices, in_ray_counter)
            .get(global_idx)
    else {
        return;
    };

    let hit = TriangleHit::unpack(hits[global_idx as usize]);

    if hit.is_none() {
        return;
    }

    // A hit pointing outside of the scene terminates the path as if nothing
    // was hit
    let Some(triangle) = TrianglesView::new(triangles).get(hit.triangle_id)
    else {
        return;
    };

    let material = MaterialsView::new(materials).get(triangle.material_id());
    let throughput = throughputs[pixel_idx as usize].xyz();

    radiance[pixel_idx as usize] +=
        (throughput * material.emissive()).extend(0.0);

    // ---

    let mut normal = triangle.normal();

    if normal.dot(ray.direction()) > 0.0 {
        normal = -normal;
    }

    let point = ray.at(hit.distance) + normal * TriangleHit::NUDGE_OFFSET;

    // Each bounce consumes three dimensions: two for the direction and one
    // for the roulette
    let bnoise = BlueNoise::new(
        blue_noise_sequence,
        blue_noise_scrambling_tile,
        blue_noise_ranking_tile,
    );

    let screen_pos = idx_to_screen(pixel_idx, params.width);
    let sample_idx = sample_counter[0];
    let dimension = 3 * params.bounce;

    let u = vec2(
        bnoise.sample(screen_pos, sample_idx, dimension),
        bnoise.sample(screen_pos, sample_idx, dimension + 1),
    );

    let (direction, weight) =
        LambertBrdf::new(material.base_color()).sample(normal, u);

    let survivor = RussianRoulette::new(params.roulette_start).apply(
        params.bounce,
        throughput * weight,
        bnoise.sample(screen_pos, sample_idx, dimension + 2),
    );

    let Some(throughput) = survivor else {
        throughputs[pixel_idx as usize] = Vec4::ZERO;
        return;
    };

    throughputs[pixel_idx as usize] = throughput.extend(0.0);

    RayQueue::new(out_rays, out_pixel_indices, out_ray_counter)
        .push(Ray::new(point, direction), pixel_idx);
}

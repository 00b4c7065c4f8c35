use wavefront_gpu::prelude::*;

#[allow(clippy::too_many_arguments)]
pub fn main(
    global_idx: u32,
    params: &ShadeMissPassParams,
    rays: &[Vec4],
    pixel_indices: &[u32],
    ray_counter: &[u32],
    hits: &[Vec4],
    throughputs: &[Vec4],
    environment: &[Vec4],
    radiance: &mut [Vec4],
) {
    // This pass is launched over the entire screen, since only the device
    // knows how many rays are actually alive:
    if global_idx >= params.max_rays {
        return;
    }

    let Some((ray, pixel_idx)) =
        RayStream::new(rays, pixel_indices, ray_counter).get(global_idx)
    else {
        return;
    };

    if TriangleHit::unpack(hits[global_idx as usize]).is_some() {
        return;
    }

    let pixel_idx = pixel_idx as usize;
    let throughput = throughputs[pixel_idx].xyz();
    let color = EnvironmentView::new(environment).sample(ray.direction());

    radiance[pixel_idx] += (throughput * color).extend(0.0);
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn only_live_misses_contribute() {
        let mut rays = vec![Vec4::ZERO; 4 * Ray::STRIDE];

        for idx in 0..4 {
            Ray::new(Vec3::ZERO, Vec3::Y).write(&mut rays, idx);
        }

        let pixel_indices = [3, 1, 0, 2];
        let hits = [
            TriangleHit::none().pack(),
            TriangleHit {
                distance: 1.0,
                uv: Vec2::ZERO,
                triangle_id: TriangleId::new(0),
            }
            .pack(),
            TriangleHit::none().pack(),
            TriangleHit::none().pack(),
        ];

        let throughputs = [
            Vec4::ONE,
            Vec4::ONE,
            Vec4::ONE,
            vec4(0.5, 0.5, 0.5, 0.0),
        ];

        let environment = [
            EnvironmentView::encode_header(1, 1),
            vec4(1.0, 2.0, 3.0, 0.0),
        ];

        let mut radiance = vec![Vec4::ZERO; 4];
        let params = ShadeMissPassParams {
            max_rays: 4,
            ..Default::default()
        };

        for idx in 0..4 {
            main(
                idx,
                &params,
                &rays,
                &pixel_indices,
                &[2],
                &hits,
                &throughputs,
                &environment,
                &mut radiance,
            );
        }

        assert_relative_eq!(0.5, radiance[3].x);
        assert_relative_eq!(1.0, radiance[3].y);
        assert_relative_eq!(1.5, radiance[3].z);

        // Ray #1 hit something, rays #2 and #3 are past the counter
        assert_eq!(Vec4::ZERO, radiance[0]);
        assert_eq!(Vec4::ZERO, radiance[1]);
        assert_eq!(Vec4::ZERO, radiance[2]);
    }
}

use approx::assert_relative_eq;
use glam::{vec3, Vec3, Vec4};
use wavefront::gpu::{
    Material, MaterialId, Triangle, TriangleHit, TriangleId,
};
use wavefront::{
    AccelerationStructure, BruteForceAccel, Camera, CpuBuffer, CpuDevice,
    Device, Environment, Error, FrameState, Integrator, IntegratorConfig,
    Kernel, Scene,
};

const SKY: Vec3 = Vec3::new(0.25, 0.5, 1.0);

fn empty_scene(device: &CpuDevice, color: Vec3) -> Scene<CpuDevice> {
    Scene::upload(device, &[], &[], &Environment::constant(color)).unwrap()
}

/// A floor, a back wall and an emissive triangle, lit by a constant sky.
fn room_scene(device: &CpuDevice) -> Scene<CpuDevice> {
    let floor = MaterialId::new(0);
    let wall = MaterialId::new(1);
    let light = MaterialId::new(2);

    let triangles = [
        Triangle::new(
            [
                vec3(-5.0, -1.0, 5.0),
                vec3(5.0, -1.0, 5.0),
                vec3(5.0, -1.0, -5.0),
            ],
            floor,
        ),
        Triangle::new(
            [
                vec3(-5.0, -1.0, 5.0),
                vec3(5.0, -1.0, -5.0),
                vec3(-5.0, -1.0, -5.0),
            ],
            floor,
        ),
        Triangle::new(
            [
                vec3(-5.0, -1.0, -3.0),
                vec3(5.0, -1.0, -3.0),
                vec3(0.0, 4.0, -3.0),
            ],
            wall,
        ),
        Triangle::new(
            [
                vec3(-1.0, 2.0, -1.0),
                vec3(1.0, 2.0, -1.0),
                vec3(0.0, 2.0, 1.0),
            ],
            light,
        ),
    ];

    let materials = [
        Material::new(Vec3::splat(0.8), Vec3::ZERO),
        Material::new(vec3(0.8, 0.2, 0.2), Vec3::ZERO),
        Material::new(Vec3::ONE, Vec3::splat(4.0)),
    ];

    Scene::upload(device, &triangles, &materials, &Environment::constant(SKY))
        .unwrap()
}

fn room_camera(frame_count: u32) -> Camera {
    Camera {
        origin: vec3(0.0, 0.5, 4.0),
        front: vec3(0.0, -0.2, -1.0),
        up: Vec3::Y,
        frame_count,
        ..Default::default()
    }
}

fn integrator(config: IntegratorConfig) -> Integrator<CpuDevice> {
    Integrator::new(CpuDevice::new(), config).unwrap()
}

fn room_integrator(config: IntegratorConfig) -> Integrator<CpuDevice> {
    let mut target = integrator(config);
    let scene = room_scene(target.device());

    target.set_scene_data(&scene).unwrap();
    target
}

/// Accumulator and counter are both zeroed.
fn assert_cleared<A>(target: &Integrator<CpuDevice, A>) {
    assert_eq!(0, target.sample_count().unwrap());

    for texel in target.radiance().unwrap() {
        assert_eq!(Vec3::ZERO, texel);
    }
}

#[test]
fn constant_environment() {
    let config = IntegratorConfig::new(4, 4).with_max_bounces(1);
    let mut target = integrator(config);
    let scene = empty_scene(target.device(), SKY);

    target.set_scene_data(&scene).unwrap();
    target.integrate().unwrap();

    assert_eq!(FrameState::Resolved, target.state());
    assert_eq!(1, target.sample_count().unwrap());

    let radiance = target.radiance().unwrap();

    assert_eq!(16, radiance.len());

    for texel in radiance {
        assert_relative_eq!(SKY.x, texel.x);
        assert_relative_eq!(SKY.y, texel.y);
        assert_relative_eq!(SKY.z, texel.z);
    }

    let surface = target.surface_texels().unwrap();

    assert_eq!(16, surface.len());

    for texel in surface {
        assert_relative_eq!(SKY.x, texel.x);
        assert_relative_eq!(SKY.y, texel.y);
        assert_relative_eq!(SKY.z, texel.z);
        assert_relative_eq!(1.0, texel.w);
    }

    // Nothing got hit, so nothing survived into the second stream
    assert_eq!(0, target.ray_count(1).unwrap());
}

#[test]
fn constant_environment_converges() {
    let config = IntegratorConfig::new(4, 4).with_max_bounces(2);
    let mut target = integrator(config);
    let scene = empty_scene(target.device(), SKY);

    target.set_scene_data(&scene).unwrap();

    for frame in 0..5 {
        target.set_camera_data(&Camera {
            frame_count: frame,
            ..Default::default()
        })
        .unwrap();

        target.integrate().unwrap();
    }

    assert_eq!(5, target.sample_count().unwrap());

    for texel in target.surface_texels().unwrap() {
        assert_relative_eq!(SKY.x, texel.x, epsilon = 1e-5);
        assert_relative_eq!(SKY.y, texel.y, epsilon = 1e-5);
        assert_relative_eq!(SKY.z, texel.z, epsilon = 1e-5);
    }
}

#[test]
fn generation_fills_first_stream() {
    let config = IntegratorConfig::new(5, 3);
    let mut target = room_integrator(config);

    target.generate_rays().unwrap();

    assert_eq!(FrameState::Generated, target.state());
    assert_eq!(15, target.ray_count(0).unwrap());
}

#[test]
fn bounces_compact_streams() {
    let config = IntegratorConfig::new(8, 8)
        .with_max_bounces(6)
        .with_roulette_start(1);

    let mut target = room_integrator(config);

    target.set_camera_data(&room_camera(0)).unwrap();
    target.generate_rays().unwrap();

    let mut incoming = target.ray_count(0).unwrap();

    assert_eq!(64, incoming);

    for bounce in 0..6 {
        let (in_slot, out_slot) = (bounce & 1, (bounce + 1) & 1);

        target.intersect_rays(bounce).unwrap();
        target.shade_missed_rays(bounce).unwrap();
        target.clear_outgoing_ray_counter(bounce).unwrap();

        assert_eq!(0, target.ray_count(out_slot).unwrap());

        // Clearing the outgoing stream must not touch the incoming one
        assert_eq!(incoming, target.ray_count(in_slot).unwrap());

        target.shade_surface_hits(bounce).unwrap();

        let outgoing = target.ray_count(out_slot).unwrap();

        assert!(
            outgoing <= incoming,
            "bounce {bounce}: {outgoing} > {incoming}"
        );

        incoming = outgoing;
    }

    target.advance_sample_count().unwrap();
    target.resolve_radiance().unwrap();

    assert_eq!(1, target.sample_count().unwrap());

    // The camera looks at the floor and the wall, so some paths must've
    // survived the first bounce and some radiance must've been gathered
    assert!(target.radiance().unwrap().iter().any(|t| *t != Vec3::ZERO));
}

#[test]
fn reset_is_idempotent() {
    let config = IntegratorConfig::new(4, 4).with_max_bounces(2);
    let mut target = room_integrator(config);

    target.reset().unwrap();
    assert_cleared(&target);

    target.reset().unwrap();
    assert_cleared(&target);
}

#[test]
fn reset_after_frames() {
    let config = IntegratorConfig::new(4, 4).with_max_bounces(1);
    let mut target = integrator(config);
    let scene = empty_scene(target.device(), SKY);

    target.set_scene_data(&scene).unwrap();

    for _ in 0..3 {
        target.integrate().unwrap();
    }

    assert_eq!(3, target.sample_count().unwrap());

    target.reset().unwrap();

    assert_eq!(FrameState::Idle, target.state());
    assert_cleared(&target);
}

#[test]
fn additivity() {
    let config = IntegratorConfig::new(6, 4).with_max_bounces(3);
    let mut target = room_integrator(config);
    let mut prev = vec![Vec3::ZERO; 24];
    let mut sum = vec![Vec3::ZERO; 24];

    for frame in 0..4 {
        target.set_camera_data(&room_camera(frame)).unwrap();
        target.integrate().unwrap();

        let radiance = target.radiance().unwrap();

        for ((sum, curr), prev) in sum.iter_mut().zip(&radiance).zip(&prev) {
            *sum += *curr - *prev;
        }

        prev = radiance;
    }

    let surface = target.surface_texels().unwrap();

    for (texel, sum) in surface.iter().zip(&sum) {
        let expected = *sum / 4.0;

        assert_relative_eq!(expected.x, texel.x, epsilon = 1e-4);
        assert_relative_eq!(expected.y, texel.y, epsilon = 1e-4);
        assert_relative_eq!(expected.z, texel.z, epsilon = 1e-4);
    }
}

#[test]
fn determinism() {
    let render = |seed| {
        let config = IntegratorConfig::new(6, 4)
            .with_max_bounces(3)
            .with_seed(seed);

        let mut target = room_integrator(config);

        for frame in 0..3 {
            target.set_camera_data(&room_camera(frame)).unwrap();
            target.integrate().unwrap();
        }

        target.radiance().unwrap()
    };

    let a = render(1234);
    let b = render(1234);

    assert_eq!(a.len(), b.len());

    for (a, b) in a.iter().zip(&b) {
        assert_eq!(
            a.to_array().map(f32::to_bits),
            b.to_array().map(f32::to_bits)
        );
    }
}

#[test]
fn zero_bounces() {
    let config = IntegratorConfig::new(4, 4).with_max_bounces(0);
    let accel = CountingAccel::new(&CpuDevice::new());

    let mut target =
        Integrator::with_accel(CpuDevice::new(), config, accel).unwrap();

    // No scene on purpose: with zero bounces, nothing reads it
    target.integrate().unwrap();

    assert_eq!(0, target.accel().calls);
    assert_eq!(1, target.sample_count().unwrap());
    assert_eq!(16, target.ray_count(0).unwrap());

    for texel in target.surface_texels().unwrap() {
        assert_eq!(Vec4::new(0.0, 0.0, 0.0, 1.0), texel);
    }

    // ---

    let err = target.intersect_rays(0).unwrap_err();

    assert!(matches!(err, Error::OutOfOrder { .. }), "{err}");
}

#[test]
fn intersects_once_per_bounce() {
    let config = IntegratorConfig::new(4, 4).with_max_bounces(3);
    let accel = CountingAccel::new(&CpuDevice::new());

    let mut target =
        Integrator::with_accel(CpuDevice::new(), config, accel).unwrap();

    let scene = room_scene(target.device());

    target.set_scene_data(&scene).unwrap();
    target.integrate().unwrap();
    target.integrate().unwrap();

    assert_eq!(6, target.accel().calls);
}

#[test]
fn out_of_order() {
    let config = IntegratorConfig::new(4, 4).with_max_bounces(2);
    let mut target = room_integrator(config);

    let assert_out_of_order = |err: Error, expected_state: FrameState| {
        match err {
            Error::OutOfOrder { state, .. } => {
                assert_eq!(expected_state, state)
            }
            err => panic!("unexpected error: {err}"),
        }
    };

    assert_out_of_order(
        target.shade_missed_rays(0).unwrap_err(),
        FrameState::Idle,
    );

    assert_out_of_order(
        target.advance_sample_count().unwrap_err(),
        FrameState::Idle,
    );

    target.generate_rays().unwrap();

    assert_out_of_order(
        target.intersect_rays(1).unwrap_err(),
        FrameState::Generated,
    );

    assert_out_of_order(target.reset().unwrap_err(), FrameState::Generated);

    assert_out_of_order(
        target.set_camera_data(&Camera::default()).unwrap_err(),
        FrameState::Generated,
    );

    target.intersect_rays(0).unwrap();

    assert_out_of_order(
        target.shade_surface_hits(0).unwrap_err(),
        FrameState::Intersecting { bounce: 0 },
    );

    // Out-of-order calls don't break the frame, which can still be finished
    for bounce in 0..2 {
        if bounce > 0 {
            target.intersect_rays(bounce).unwrap();
        }

        target.shade_missed_rays(bounce).unwrap();
        target.clear_outgoing_ray_counter(bounce).unwrap();
        target.shade_surface_hits(bounce).unwrap();
    }

    assert_out_of_order(
        target.intersect_rays(2).unwrap_err(),
        FrameState::HitShaded { bounce: 1 },
    );

    target.advance_sample_count().unwrap();
    target.resolve_radiance().unwrap();

    assert_eq!(FrameState::Resolved, target.state());

    // Next frame can begin straight away
    target.generate_rays().unwrap();
}

#[test]
fn missing_scene_faults() {
    let config = IntegratorConfig::new(4, 4).with_max_bounces(1);
    let mut target = integrator(config);

    let err = target.integrate().unwrap_err();

    assert!(
        matches!(
            err,
            Error::UnboundParameter {
                kernel: Kernel::Intersect,
                param: "triangles"
            }
        ),
        "{err}"
    );

    assert_eq!(FrameState::Faulted, target.state());
}

#[test]
fn faulted_until_reset() {
    let config = IntegratorConfig::new(4, 4).with_max_bounces(2);

    let mut target =
        Integrator::with_accel(CpuDevice::new(), config, FailingAccel).unwrap();

    let scene = empty_scene(target.device(), SKY);

    target.set_scene_data(&scene).unwrap();

    let err = target.integrate().unwrap_err();

    assert!(matches!(err, Error::Dispatch { .. }), "{err}");
    assert_eq!(FrameState::Faulted, target.state());

    assert!(matches!(target.generate_rays(), Err(Error::Faulted)));
    assert!(matches!(target.set_scene_data(&scene), Err(Error::Faulted)));

    // The failed frame never reached the sample counter
    assert_eq!(0, target.sample_count().unwrap());

    target.reset().unwrap();

    assert_eq!(FrameState::Idle, target.state());
    assert_cleared(&target);
}

#[test]
fn stray_hits_terminate_paths() {
    let config = IntegratorConfig::new(4, 4).with_max_bounces(2);

    let mut target =
        Integrator::with_accel(CpuDevice::new(), config, StrayAccel).unwrap();

    let scene = room_scene(target.device());

    target.set_scene_data(&scene).unwrap();
    target.integrate().unwrap();

    assert_eq!(FrameState::Resolved, target.state());
    assert_eq!(1, target.sample_count().unwrap());

    // Every ray "hit" a triangle that doesn't exist, so nothing was shaded
    // and nothing got spawned
    assert_eq!(0, target.ray_count(1).unwrap());

    for texel in target.radiance().unwrap() {
        assert_eq!(Vec3::ZERO, texel);
    }
}

#[test]
fn invalid_camera() {
    let mut target = integrator(IntegratorConfig::new(2, 2));

    let err = target
        .set_camera_data(&Camera {
            front: Vec3::Y,
            up: Vec3::Y,
            ..Default::default()
        })
        .unwrap_err();

    assert!(matches!(err, Error::InvalidCamera(_)), "{err}");

    // A rejected camera isn't a device failure
    assert_eq!(FrameState::Idle, target.state());
}

/// Brute-force accel that counts how many times it's been asked to trace.
#[derive(Debug)]
struct CountingAccel {
    inner: BruteForceAccel<CpuDevice>,
    calls: usize,
}

impl CountingAccel {
    fn new(device: &CpuDevice) -> Self {
        Self {
            inner: BruteForceAccel::new(device).unwrap(),
            calls: 0,
        }
    }
}

impl AccelerationStructure<CpuDevice> for CountingAccel {
    fn set_scene(
        &mut self,
        device: &CpuDevice,
        scene: &Scene<CpuDevice>,
    ) -> wavefront::Result<()> {
        self.inner.set_scene(device, scene)
    }

    fn intersect_rays(
        &mut self,
        device: &CpuDevice,
        rays: &CpuBuffer,
        ray_counter: &CpuBuffer,
        max_rays: u32,
        hits: &CpuBuffer,
    ) -> wavefront::Result<()> {
        self.calls += 1;

        self.inner
            .intersect_rays(device, rays, ray_counter, max_rays, hits)
    }
}

/// Accel whose device keeps failing.
#[derive(Debug)]
struct FailingAccel;

impl AccelerationStructure<CpuDevice> for FailingAccel {
    fn set_scene(
        &mut self,
        _: &CpuDevice,
        _: &Scene<CpuDevice>,
    ) -> wavefront::Result<()> {
        Ok(())
    }

    fn intersect_rays(
        &mut self,
        _: &CpuDevice,
        _: &CpuBuffer,
        _: &CpuBuffer,
        _: u32,
        _: &CpuBuffer,
    ) -> wavefront::Result<()> {
        Err(Error::Dispatch {
            kernel: Kernel::Intersect,
            status: "device lost".into(),
        })
    }
}

/// Accel that reports a hit against a triangle past the end of the scene for
/// every ray.
#[derive(Debug)]
struct StrayAccel;

impl AccelerationStructure<CpuDevice> for StrayAccel {
    fn set_scene(
        &mut self,
        _: &CpuDevice,
        _: &Scene<CpuDevice>,
    ) -> wavefront::Result<()> {
        Ok(())
    }

    fn intersect_rays(
        &mut self,
        device: &CpuDevice,
        _: &CpuBuffer,
        _: &CpuBuffer,
        max_rays: u32,
        hits: &CpuBuffer,
    ) -> wavefront::Result<()> {
        let hit = TriangleHit {
            distance: 1.0,
            uv: Default::default(),
            triangle_id: TriangleId::new(7),
        };

        let hits_data = vec![hit.pack(); max_rays as usize];

        device.write_buffer(hits, 0, bytemuck::cast_slice(&hits_data))
    }
}

//! Renders a Cornell-style box on the CPU and saves it as `render.png`.
//!
//! Run with `RUST_LOG=debug` to see what the integrator is doing.

use std::error::Error;

use glam::{vec3, Vec3};
use image::{Rgb, RgbImage};
use wavefront::gpu::{Material, MaterialId, Triangle};
use wavefront::{
    Camera, CpuDevice, Environment, Integrator, IntegratorConfig, Scene,
};

const WIDTH: u32 = 160;
const HEIGHT: u32 = 120;
const FRAMES: u32 = 16;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = IntegratorConfig::new(WIDTH, HEIGHT)
        .with_max_bounces(4)
        .with_seed(0x5eed);

    let mut integrator = Integrator::new(CpuDevice::new(), config)?;
    let (triangles, materials) = cornell_box();

    let scene = Scene::upload(
        integrator.device(),
        &triangles,
        &materials,
        &Environment::black(),
    )?;

    integrator.set_scene_data(&scene)?;

    for frame in 0..FRAMES {
        integrator.set_camera_data(&Camera {
            origin: vec3(0.0, 1.0, 3.4),
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            frame_count: frame,
            fov: 40.0_f32.to_radians(),
            ..Default::default()
        })?;

        integrator.integrate()?;
    }

    let texels = integrator.surface_texels()?;

    let image = RgbImage::from_fn(WIDTH, HEIGHT, |x, y| {
        let texel = texels[(y * WIDTH + x) as usize];

        Rgb(texel.truncate().to_array().map(|c| {
            (c.clamp(0.0, 1.0).powf(1.0 / 2.2) * 255.0).round() as u8
        }))
    });

    image.save("render.png")?;

    println!("Saved render.png ({FRAMES} samples per pixel)");

    Ok(())
}

fn cornell_box() -> (Vec<Triangle>, Vec<Material>) {
    let white = MaterialId::new(0);
    let red = MaterialId::new(1);
    let green = MaterialId::new(2);
    let light = MaterialId::new(3);

    let materials = vec![
        Material::new(Vec3::splat(0.75), Vec3::ZERO),
        Material::new(vec3(0.75, 0.15, 0.15), Vec3::ZERO),
        Material::new(vec3(0.15, 0.75, 0.15), Vec3::ZERO),
        Material::new(Vec3::ONE, Vec3::splat(12.0)),
    ];

    let mut triangles = Vec::new();

    let mut quad = |a: Vec3, b: Vec3, c: Vec3, d: Vec3, material| {
        triangles.push(Triangle::new([a, b, c], material));
        triangles.push(Triangle::new([a, c, d], material));
    };

    // Floor, ceiling and back wall
    quad(
        vec3(-1.0, 0.0, 1.0),
        vec3(1.0, 0.0, 1.0),
        vec3(1.0, 0.0, -1.0),
        vec3(-1.0, 0.0, -1.0),
        white,
    );

    quad(
        vec3(-1.0, 2.0, 1.0),
        vec3(-1.0, 2.0, -1.0),
        vec3(1.0, 2.0, -1.0),
        vec3(1.0, 2.0, 1.0),
        white,
    );

    quad(
        vec3(-1.0, 0.0, -1.0),
        vec3(1.0, 0.0, -1.0),
        vec3(1.0, 2.0, -1.0),
        vec3(-1.0, 2.0, -1.0),
        white,
    );

    // Side walls
    quad(
        vec3(-1.0, 0.0, 1.0),
        vec3(-1.0, 0.0, -1.0),
        vec3(-1.0, 2.0, -1.0),
        vec3(-1.0, 2.0, 1.0),
        red,
    );

    quad(
        vec3(1.0, 0.0, -1.0),
        vec3(1.0, 0.0, 1.0),
        vec3(1.0, 2.0, 1.0),
        vec3(1.0, 2.0, -1.0),
        green,
    );

    // Ceiling light, slightly below the ceiling
    quad(
        vec3(-0.3, 1.99, 0.3),
        vec3(-0.3, 1.99, -0.3),
        vec3(0.3, 1.99, -0.3),
        vec3(0.3, 1.99, 0.3),
        light,
    );

    (triangles, materials)
}

use std::hint::black_box;
use std::sync::Arc;
use std::time::Instant;

use glam::{Mat4, UVec2, Vec2, Vec3};
use prism_kernel::{
    DeviceState, Geometry, Group, Instance, Material, ObjectArray, Parameterized, SceneObject,
    Surface, World,
};
use prism_render::{Camera, Frame, Renderer};

/// `count` unit spheres in a grid, each placed by its own instance.
fn make_world(device: &Arc<DeviceState>, count: usize) -> World {
    let geometry = Geometry::sphere(device);
    geometry.set_param("vertex.position", vec![Vec3::ZERO]);
    geometry.set_param("radius", 0.4f32);
    geometry.commit();
    let material = Material::new(device);
    material.commit();
    let surface = Surface::new(device);
    surface.set_param("geometry", Arc::new(geometry));
    surface.set_param("material", Arc::new(material));
    surface.commit();
    let group = Group::new(device);
    group.set_param(
        "surface",
        Arc::new(ObjectArray::from_objects(device, [Arc::new(surface)])),
    );
    group.commit();
    let group = Arc::new(group);

    let side = (count as f32).sqrt().ceil() as usize;
    let instances = (0..count).map(|i| {
        let inst = Instance::new(device);
        inst.set_param("group", group.clone());
        inst.set_param(
            "transform",
            Mat4::from_translation(Vec3::new(
                (i % side) as f32 - side as f32 * 0.5,
                (i / side) as f32 - side as f32 * 0.5,
                -(side as f32),
            )),
        );
        inst.commit();
        Arc::new(inst)
    });

    let mut world = World::new(device);
    world.set_param(
        "instance",
        Arc::new(ObjectArray::from_objects(device, instances.collect::<Vec<_>>())),
    );
    world.commit();
    world
}

fn bench_render_sample(count: usize, iterations: usize) {
    let device = DeviceState::new();
    let world = make_world(&device, count);
    let mut renderer = Renderer::new(&device);
    renderer.commit();
    let camera = Camera::perspective(&device);

    let start = Instant::now();
    for i in 0..iterations {
        let screen = Vec2::new((i % 97) as f32 / 97.0, (i % 89) as f32 / 89.0);
        let ray = camera.create_ray(screen);
        let _ = black_box(renderer.render_sample(black_box(screen), ray, black_box(&world)));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  render_sample ({count} instances, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn bench_frame(count: usize, size: u32) {
    let device = DeviceState::new();
    let world = make_world(&device, count);
    let mut renderer = Renderer::new(&device);
    renderer.commit();
    let camera = Camera::perspective(&device);

    let Ok(mut frame) = Frame::new(UVec2::splat(size)) else {
        return;
    };
    let start = Instant::now();
    frame.render(black_box(&world), &renderer, &camera);
    let elapsed = start.elapsed();
    println!("  frame ({count} instances, {size}x{size}): {elapsed:?}");
}

fn main() {
    println!("=== Render Sample Benchmarks ===\n");

    println!("Single samples:");
    bench_render_sample(1, 100_000);
    bench_render_sample(16, 10_000);
    bench_render_sample(256, 1_000);

    println!("\nParallel frames:");
    bench_frame(16, 128);
    bench_frame(256, 256);

    println!("\n=== Done ===");
}

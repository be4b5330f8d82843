//! Scene Hierarchy — a headless solar system.
//!
//! A sun spins in place, a planet orbits it, and a moon orbits the planet.
//! Each body only knows its local transform; the transform hierarchy turns
//! that into world positions every frame. Halfway through, the planet is
//! destroyed and the moon is left behind as a root.
//!
//! Run with: `RUST_LOG=debug cargo run -p skena --example scene_hierarchy`

use skena::prelude::*;

/// Radians per second around the local Y axis.
struct Spin(f32);

fn spin_system(scene: &mut Scene, dt: f32) {
    let spinning: Vec<_> = scene.view::<(Spin, Transform)>().collect();
    for id in spinning {
        let speed = scene.get::<Spin>(id).map_or(0.0, |s| s.0);
        if let Some(t) = scene.get_mut::<Transform>(id) {
            t.rotation *= Quat::from_rotation_y(speed * dt);
        }
    }
}

fn report_system(scene: &mut Scene, _dt: f32) {
    for id in scene.view::<(Transform,)>() {
        let name = scene.entity_name(id).unwrap_or("?");
        let p = scene.get::<Transform>(id).map(Transform::world_translation).unwrap_or_default();
        println!("  {name:<6} ({:>6.2}, {:>6.2}, {:>6.2})", p.x, p.y, p.z);
    }
}

fn on_orphaned(scene: &mut Scene, id: EntityId) {
    if let Some(name) = scene.entity_name(id) {
        log::info!("{name} detached from its parent");
    }
}

fn main() {
    env_logger::init();

    let mut scene = Scene::with_config(SceneConfig::default().with_label("solar_system"));
    TransformHierarchy::install(&mut scene);
    scene.register_reactive_system::<Child>(Reaction::OnRemove, on_orphaned);
    // PreUpdate, so the hierarchy sees this frame's rotations.
    scene.register_system(Phase::PreUpdate, spin_system);
    scene.register_system(Phase::Render, report_system);

    let sun = scene.new_entity("sun");
    scene.assign::<Transform>(sun);
    scene.assign_with(sun, Spin(0.5));

    let planet = scene.new_entity("planet");
    scene.assign_with(planet, Transform::from_xyz(10.0, 0.0, 0.0));
    scene.assign_with(planet, Spin(2.0));
    scene.set_parent(planet, sun);

    let moon = scene.new_entity("moon");
    scene.assign_with(moon, Transform::from_xyz(2.0, 0.0, 0.0).with_scale(0.25));
    scene.set_parent(moon, planet);

    let dt = 0.25;
    for frame in 0..8 {
        if frame == 4 {
            scene.destroy_entity(planet);
        }
        println!("frame {frame}");
        scene.simulate_scene(dt);
        scene.render_scene(dt);
    }

    let stats = scene.diagnostics_snapshot();
    match stats.to_json() {
        Ok(json) => println!("{json}"),
        Err(e) => log::warn!("Could not serialize scene stats: {e}"),
    }
}

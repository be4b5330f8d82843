//! Scene Switching — menu/game transitions between independent scenes.
//!
//! Each screen is its own [`Scene`] with its own component ids, pools and
//! systems. Switching tears the old scene down with `destroy_all` (so its
//! OnRemove callbacks still run) before dropping it.
//!
//! Run with: `RUST_LOG=debug cargo run -p skena --example scene_switching`

use skena::prelude::*;

#[derive(Default)]
struct Health(i32);

#[derive(Default)]
struct Velocity(Vec3);

struct MenuItem;

enum Screen {
    Menu,
    Game,
}

fn build_menu() -> Scene {
    let mut scene = Scene::with_config(SceneConfig::default().with_label("menu").with_capacity(16));
    for label in ["Play", "Options", "Quit"] {
        let id = scene.new_entity(label);
        scene.assign_with(id, MenuItem);
    }
    scene.register_system(Phase::Render, |scene: &mut Scene, _dt: f32| {
        let items: Vec<_> = scene.view::<(MenuItem,)>().filter_map(|id| scene.entity_name(id)).collect();
        println!("  menu: {}", items.join(" | "));
    });
    scene
}

fn build_game() -> Scene {
    let config = match SceneConfig::from_json(r#"{ "label": "level_1", "capacity": 256 }"#) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Bad level config, using defaults: {e}");
            SceneConfig::default()
        }
    };
    let mut scene = Scene::with_config(config);
    scene.register_reactive_system::<Health>(Reaction::OnRemove, on_enemy_removed);
    scene.register_system(Phase::Update, movement_system);
    scene.register_system(Phase::Update, damage_system);

    for i in 0..5 {
        let id = scene.new_entity(&format!("enemy_{i}"));
        scene.assign_with(id, Transform::from_xy(i as f32 * 3.0, 0.0));
        scene.assign_with(id, Velocity(Vec3::new(0.0, -1.0, 0.0)));
        scene.assign_with(id, Health(i * 2));
    }
    scene
}

fn movement_system(scene: &mut Scene, dt: f32) {
    let movers: Vec<_> = scene.view::<(Transform, Velocity)>().collect();
    for id in movers {
        let v = scene.get::<Velocity>(id).map_or(Vec3::ZERO, |v| v.0);
        if let Some(t) = scene.get_mut::<Transform>(id) {
            t.translation += v * dt;
        }
    }
}

/// Every enemy loses a point of health per frame; the dead are removed at the
/// end of the update.
fn damage_system(scene: &mut Scene, _dt: f32) {
    let mut cursor = scene.view_cursor::<(Health,)>();
    while let Some(id) = cursor.advance(scene) {
        let Some(health) = scene.get_mut::<Health>(id) else {
            continue;
        };
        health.0 -= 1;
        if health.0 < 0 {
            scene.defer_destroy(id);
        }
    }
}

fn on_enemy_removed(scene: &mut Scene, id: EntityId) {
    log::info!("{} removed", scene.entity_name(id).unwrap_or("?"));
}

fn main() {
    env_logger::init();

    let script = [Screen::Menu, Screen::Game, Screen::Game, Screen::Game, Screen::Menu];
    let mut current: Option<(usize, Scene)> = None;

    for (frame, screen) in script.iter().enumerate() {
        let wanted = match screen {
            Screen::Menu => 0,
            Screen::Game => 1,
        };
        if current.as_ref().is_none_or(|(active, _)| *active != wanted) {
            if let Some((_, mut old)) = current.take() {
                println!("leaving \"{}\"", old.label());
                old.destroy_all();
            }
            let scene = if wanted == 0 { build_menu() } else { build_game() };
            println!("entering \"{}\"", scene.label());
            current = Some((wanted, scene));
        }

        let Some((_, scene)) = current.as_mut() else {
            continue;
        };
        println!("frame {frame}: {} entities", scene.entity_count());
        scene.simulate_scene(1.0 / 60.0);
        scene.render_scene(1.0 / 60.0);
    }
}

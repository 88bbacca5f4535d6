//! Entity Hierarchies — headless solar system demo.
//!
//! Demonstrates parent/child relationships and transform propagation.
//! Planets orbit the sun; moons orbit their planet — all via hierarchy.
//! Input is scripted, so the demo runs the same way every time:
//!
//! - **R** (frame 60) — despawn a planet (its moon disappears too)
//! - **Space** (frame 120) — spawn a new planet with a moon
//!
//! Run with: `RUST_LOG=debug cargo run -p askr --example scene_hierarchy`

use std::time::Duration;

use askr::prelude::*;

const KEY_R: Key = Key(19);
const KEY_SPACE: Key = Key(57);

// ── Entities ─────────────────────────────────────────────────────────────

/// An invisible pivot that spins; everything under it orbits.
struct Orbit {
    speed: f32,
    transform: Transform2D,
}

impl Entity for Orbit {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let angle = self.transform.rotation() + self.speed * ctx.delta();
        self.transform.set_rotation(angle);
    }

    fn transform(&self) -> Option<&Transform2D> {
        Some(&self.transform)
    }

    fn transform_mut(&mut self) -> Option<&mut Transform2D> {
        Some(&mut self.transform)
    }
}

/// A visible body. Draws by printing its absolute position.
struct Body {
    name: String,
    transform: Transform2D,
}

impl Entity for Body {
    fn name(&self) -> &str {
        &self.name
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) {
        let p = self.transform.position();
        log::debug!(
            "  [{}] {:<10} at ({:>7.1}, {:>7.1})",
            ctx.draw_index(),
            self.name,
            p.x,
            p.y
        );
    }

    fn transform(&self) -> Option<&Transform2D> {
        Some(&self.transform)
    }

    fn transform_mut(&mut self) -> Option<&mut Transform2D> {
        Some(&mut self.transform)
    }
}

/// Logs layer boundaries instead of rendering.
struct LogStage;

impl RenderStage for LogStage {
    fn begin_layer(&mut self, layer: Layer) {
        log::debug!("layer {}", layer.0);
    }
}

// ── Setup ────────────────────────────────────────────────────────────────

fn main() {
    env_logger::init();

    let mut scene = Scene::new();
    let root = scene.hierarchy().root();
    let sun_body = Body {
        name: "sun".to_string(),
        transform: Transform2D::default(),
    };
    let Ok(sun) = scene.hierarchy_mut().add_entity(root, sun_body, Layer::DEFAULT) else {
        return;
    };

    // (distance, orbit speed in deg/s, moon orbit speed)
    let planet_configs = [(120.0, 60.0, 150.0), (200.0, 35.0, 100.0), (300.0, 20.0, 170.0)];
    for (idx, &(distance, speed, moon_speed)) in planet_configs.iter().enumerate() {
        spawn_planet(scene.hierarchy_mut(), sun, idx + 1, distance, speed, moon_speed);
    }

    let mut stage = LogStage;
    let mut planet_count = planet_configs.len();
    for frame in 1..=180u32 {
        let events = match frame {
            60 => vec![InputEvent::KeyPressed(KEY_R)],
            120 => vec![InputEvent::KeyPressed(KEY_SPACE)],
            _ => Vec::new(),
        };
        scene.frame(Duration::from_millis(16), &events, &mut stage);

        if scene.input().keys.just_pressed(KEY_R) {
            despawn_planet(&mut scene, sun);
        }
        if scene.input().keys.just_pressed(KEY_SPACE) {
            planet_count += 1;
            let distance = 100.0 + planet_count as f32 * 50.0;
            let speed = 80.0 / (planet_count as f32).sqrt();
            spawn_planet(scene.hierarchy_mut(), sun, planet_count, distance, speed, 120.0);
        }
    }

    for id in scene.hierarchy().descendants(sun) {
        let store = scene.hierarchy();
        if let (Some(name), Some(transform)) = (store.name(id), store.transform(id)) {
            let p = transform.position();
            println!("{name:<10} ({:>7.1}, {:>7.1})", p.x, p.y);
        }
    }
}

fn spawn_planet(
    store: &mut HierarchyStore,
    sun: EntityId,
    idx: usize,
    distance: f32,
    speed: f32,
    moon_speed: f32,
) {
    // The planet's parent transform controls the orbit angle.
    // By rotating the parent, the child (the visible body) orbits.
    let Ok(pivot) = store.add_entity(
        sun,
        Orbit {
            speed,
            transform: Transform2D::default(),
        },
        Layer::DEFAULT,
    ) else {
        return;
    };
    let Ok(planet) = store.add_entity(
        pivot,
        Body {
            name: format!("planet {idx}"),
            transform: Transform2D::from_xy(distance, 0.0),
        },
        Layer::DEFAULT,
    ) else {
        return;
    };

    let Ok(moon_pivot) = store.add_entity(
        planet,
        Orbit {
            speed: moon_speed,
            transform: Transform2D::default(),
        },
        Layer::DEFAULT,
    ) else {
        return;
    };
    let _ = store.add_entity(
        moon_pivot,
        Body {
            name: format!("moon {idx}"),
            transform: Transform2D::from_xy(24.0, 0.0),
        },
        Layer(1),
    );
}

fn despawn_planet(scene: &mut Scene, sun: EntityId) {
    // Pivots hang directly under the sun; removing one takes its planet and
    // moon with it.
    let pivots = scene.hierarchy().children(sun).to_vec();
    if pivots.is_empty() {
        return;
    }
    let victim = pivots[scene.time().frame_count() as usize % pivots.len()];
    if let Ok(removed) = scene.hierarchy_mut().remove_entity(victim) {
        log::info!("Despawned {victim} and {} descendant(s)", removed - 1);
    }
}

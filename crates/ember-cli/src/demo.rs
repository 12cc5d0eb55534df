//! Headless demo game: a turret sweeping up and down, firing pooled bullets
//! on a timer, with a camera following it and a stats system counting work.
//! The `pause` action toggles an advisory pause that the demo honors; `fire`
//! shoots an extra bullet.

use ember_core::{Rect, Result, Vec2};
use ember_runtime::{
    Camera, Delta, Entity, EntityCore, EntityInfo, Game, SpawnSettings, System,
};

pub const BULLET: &str = "bullet";
pub const BULLET_TAG: &str = "bullet";
pub const TURRET: &str = "turret";
pub const STATS_SYSTEM: &str = "stats";
pub const CONTROLS_SYSTEM: &str = "controls";
/// Timer tag for the turret's fire interval
const TURRET_TIMERS: &str = "turret";

/// Half-width of the play area; bullets leaving it remove themselves
const ARENA_HALF_WIDTH: f32 = 400.0;

#[derive(Default)]
pub struct Bullet {
    core: EntityCore,
    velocity: Vec2,
    age_ms: f64,
    lifetime_ms: f64,
}

impl Entity for Bullet {
    fn core(&self) -> &EntityCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn init(&mut self, settings: &SpawnSettings) -> Result<()> {
        let number = |key: &str, default: f64| {
            settings
                .properties
                .get(key)
                .and_then(|v| v.as_float())
                .unwrap_or(default)
        };
        self.velocity = Vec2::new(number("vx", 240.0) as f32, number("vy", 0.0) as f32);
        self.lifetime_ms = number("lifetime_ms", 2000.0);
        Ok(())
    }

    fn fixed_update(&mut self, game: &mut Game, delta: Delta) -> Result<()> {
        if game.is_paused() {
            return Ok(());
        }
        self.core.position += self.velocity * delta.secs as f32;
        self.age_ms += delta.ms;
        if self.core.position.x.abs() > ARENA_HALF_WIDTH || self.age_ms >= self.lifetime_ms {
            game.remove(self.core.id());
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.velocity = Vec2::ZERO;
        self.age_ms = 0.0;
        self.lifetime_ms = 0.0;
    }

    fn bounds(&self) -> Option<Rect> {
        Some(Rect::centered(self.core.position, Vec2::new(4.0, 4.0)))
    }
}

#[derive(Default)]
pub struct Turret {
    core: EntityCore,
    fire_ms: f64,
    phase: f64,
}

impl Entity for Turret {
    fn core(&self) -> &EntityCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn init(&mut self, settings: &SpawnSettings) -> Result<()> {
        self.fire_ms = settings
            .properties
            .get("fire_ms")
            .and_then(|v| v.as_float())
            .unwrap_or(250.0);
        Ok(())
    }

    fn ready(&mut self, game: &mut Game) -> Result<()> {
        game.timers_mut()
            .interval_tagged(TURRET_TIMERS, self.fire_ms, fire_from_turret);
        Ok(())
    }

    fn update(&mut self, game: &mut Game, _delta: Delta) -> Result<()> {
        if !game.is_paused() && game.input().is_action_just_pressed("fire") {
            fire(game, self.core.position)?;
        }
        Ok(())
    }

    fn fixed_update(&mut self, game: &mut Game, delta: Delta) -> Result<()> {
        if game.is_paused() {
            return Ok(());
        }
        self.phase += delta.secs;
        self.core.position.y = (self.phase.sin() * 40.0) as f32;
        Ok(())
    }

    fn bounds(&self) -> Option<Rect> {
        Some(Rect::centered(self.core.position, Vec2::new(16.0, 16.0)))
    }
}

fn fire_from_turret(game: &mut Game) -> Result<()> {
    let Some(origin) = game
        .get_by_name(TURRET)
        .and_then(|id| game.entity(id))
        .map(|turret| turret.position())
    else {
        return Ok(());
    };
    fire(game, origin)
}

fn fire(game: &mut Game, origin: Vec2) -> Result<()> {
    game.spawn(
        BULLET,
        SpawnSettings::at(origin.x, origin.y)
            .with_tag(BULLET_TAG)
            .with_property("vx", 240.0)
            .with_property("vy", 0.0),
    )?;
    Ok(())
}

/// Toggles the advisory pause on the `pause` action and holds the turret's
/// fire timer while paused
#[derive(Debug, Default)]
pub struct Controls;

impl System for Controls {
    fn name(&self) -> &str {
        CONTROLS_SYSTEM
    }

    fn update(&mut self, game: &mut Game, _delta: Delta) -> Result<()> {
        if !game.input().is_action_just_pressed("pause") {
            return Ok(());
        }
        if game.is_paused() {
            game.resume();
            game.timers_mut().resume_tag(TURRET_TIMERS);
        } else {
            game.pause();
            game.timers_mut().pause_tag(TURRET_TIMERS);
        }
        Ok(())
    }
}

/// Counts what the runtime did; read back by the simulate command
#[derive(Debug, Default)]
pub struct Stats {
    pub pauses: u64,
    pub fixed_ticks: u64,
    pub updates: u64,
    pub bullets_spawned: u64,
    pub bullets_removed: u64,
    pub peak_live_bullets: usize,
}

impl System for Stats {
    fn name(&self) -> &str {
        STATS_SYSTEM
    }

    fn fixed_update(&mut self, _game: &mut Game, _delta: Delta) -> Result<()> {
        self.fixed_ticks += 1;
        Ok(())
    }

    fn update(&mut self, game: &mut Game, _delta: Delta) -> Result<()> {
        self.updates += 1;
        self.peak_live_bullets = self.peak_live_bullets.max(game.get_by_tag(BULLET_TAG).len());
        Ok(())
    }

    fn on_pause(&mut self) -> Result<()> {
        self.pauses += 1;
        Ok(())
    }

    fn on_entity_spawn(&mut self, entity: &EntityInfo) {
        if entity.kind.as_deref() == Some(BULLET) {
            self.bullets_spawned += 1;
        }
    }

    fn on_entity_remove(&mut self, entity: &EntityInfo) {
        if entity.kind.as_deref() == Some(BULLET) {
            self.bullets_removed += 1;
        }
    }
}

/// Register the demo types and systems and spawn the turret
pub fn populate(game: &mut Game) -> Result<()> {
    game.register_type(BULLET, true, || Box::new(Bullet::default()));
    game.register_type(TURRET, false, || Box::new(Turret::default()));
    game.register_system(Controls);
    game.register_system(Stats::default());

    let turret = game.spawn(
        TURRET,
        SpawnSettings::at(-300.0, 0.0)
            .with_name(TURRET)
            .with_tag(TURRET)
            .with_property("fire_ms", 250.0),
    )?;

    let mut camera = Camera::new(Vec2::new(320.0, 180.0))
        .with_smoothing(8.0)
        .with_offset(Vec2::new(120.0, 0.0))
        .with_bounds(Rect::new(-ARENA_HALF_WIDTH, -120.0, ARENA_HALF_WIDTH * 2.0, 240.0));
    camera.follow(turret);
    game.register_system(camera);

    log::debug!("demo populated with turret {turret}");
    Ok(())
}

//! Game - the runtime that owns the frame clock, the entity registry and the
//! system list, and dispatches fixed-rate and variable-rate ticks.
//!
//! Per frame: zero or more fixed ticks (bounded by the clock's catch-up clamp
//! and spiral guard), then exactly one variable tick. Each tick visits live
//! entities in spawn order, then systems in registration order, then emits a
//! [`GameEvent`] to passive listeners.

use crate::clock::{Delta, FrameClock, FrameReport};
use crate::config::{is_valid_rate, GameConfig};
use crate::entity::{Entity, EntityInfo, SpawnSettings};
use crate::event::GameEvent;
use crate::event_bus::EventBus;
use crate::input::InputState;
use crate::registry::TypeRegistry;
use crate::system::System;
use crate::timer::{self, TimerManager};
use ember_core::{EmberError, EntityId, Result};
use serde::Serialize;
use std::collections::HashMap;

/// Lifecycle of a game (see [`Game::awake`] / [`Game::freeze`])
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    /// Constructed, systems may be registered, not ticking yet
    Registered,
    /// Active; `run_frame` dispatches ticks
    Awake,
    /// Deactivated; `run_frame` is ignored until the next `awake`
    Frozen,
}

/// Running totals, mostly for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GameStats {
    pub frames: u64,
    pub fixed_ticks: u64,
    pub variable_ticks: u64,
    pub spawned: u64,
    pub removed: u64,
}

#[derive(Debug, Clone, Copy)]
enum Channel {
    Variable,
    Fixed,
}

impl Channel {
    fn hook_name(self) -> &'static str {
        match self {
            Channel::Variable => "update",
            Channel::Fixed => "fixed_update",
        }
    }
}

struct SystemSlot {
    name: String,
    /// `None` while the system's own hook is running
    system: Option<Box<dyn System>>,
}

/// Deliver a notification to every system not currently running a hook
fn notify(systems: &mut [SystemSlot], mut f: impl FnMut(&mut dyn System)) {
    for slot in systems.iter_mut() {
        if let Some(system) = slot.system.as_mut() {
            f(system.as_mut());
        }
    }
}

/// The runtime: scheduler, entity registry and system dispatcher
pub struct Game {
    config: GameConfig,
    clock: FrameClock,
    state: RuntimeState,
    paused: bool,
    types: TypeRegistry,
    systems: Vec<SystemSlot>,
    /// Entity objects; an entity is absent while one of its own hooks runs
    entities: HashMap<EntityId, Box<dyn Entity>>,
    /// Registry metadata for every entity not yet excised
    infos: HashMap<EntityId, EntityInfo>,
    /// Dispatch order (spawn order), including removed-but-not-excised entries
    order: Vec<EntityId>,
    names: HashMap<String, EntityId>,
    tags: HashMap<String, Vec<EntityId>>,
    /// Entities marked removed that are still in `order`
    pending_excision: usize,
    timers: TimerManager<Game>,
    events: EventBus,
    input: InputState,
    stats: GameStats,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Create a game with the default configuration
    pub fn new() -> Self {
        Self::build(GameConfig::default())
    }

    /// Create a game from a validated configuration
    pub fn with_config(config: GameConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: GameConfig) -> Self {
        Self {
            clock: FrameClock::from_config(&config),
            timers: TimerManager::with_default_tag(config.default_timer_tag.clone()),
            config,
            state: RuntimeState::Registered,
            paused: false,
            types: TypeRegistry::new(),
            systems: Vec::new(),
            entities: HashMap::new(),
            infos: HashMap::new(),
            order: Vec::new(),
            names: HashMap::new(),
            tags: HashMap::new(),
            pending_excision: 0,
            events: EventBus::new(),
            input: InputState::new(),
            stats: GameStats::default(),
        }
    }

    // --- Configuration ---

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Change the fixed rate; applies from the next `run_frame`
    pub fn set_desired_fps(&mut self, fps: f64) -> bool {
        if !is_valid_rate(fps) {
            log::warn!("ignoring invalid desired_fps {fps}");
            return false;
        }
        self.config.desired_fps = fps;
        self.clock.set_desired_fps(fps);
        true
    }

    /// Change the fixed-tick speed multiplier; applies from the next `run_frame`
    pub fn set_speed(&mut self, speed: f64) -> bool {
        if !is_valid_rate(speed) {
            log::warn!("ignoring invalid speed {speed}");
            return false;
        }
        self.config.speed = speed;
        self.clock.set_speed(speed);
        true
    }

    // --- Registration ---

    /// Register an entity type for spawning by name
    pub fn register_type(
        &mut self,
        name: impl Into<String>,
        poolable: bool,
        factory: impl Fn() -> Box<dyn Entity> + 'static,
    ) -> bool {
        self.types.register(name, poolable, factory)
    }

    /// Append a system to the dispatch order. Returns false (and keeps the
    /// original) for an empty or duplicate name. A system registered while
    /// the game is awake gets its `awake` hook immediately.
    pub fn register_system(&mut self, system: impl System + 'static) -> bool {
        let name = system.name().to_string();
        if name.is_empty() {
            log::warn!("refusing to register a system with an empty name");
            return false;
        }
        if self.systems.iter().any(|slot| slot.name == name) {
            let err = EmberError::DuplicateRegistration {
                kind: "system",
                name,
            };
            log::warn!("{err}; keeping the original");
            return false;
        }

        let index = self.systems.len();
        self.systems.push(SystemSlot {
            name,
            system: Some(Box::new(system)),
        });

        if self.state == RuntimeState::Awake {
            self.run_system_hook(index, "awake", |s, game| s.awake(game));
        }
        true
    }

    /// Typed access to a registered system by name
    pub fn system<T: System>(&self, name: &str) -> Option<&T> {
        self.systems
            .iter()
            .find(|slot| slot.name == name)
            .and_then(|slot| slot.system.as_deref())
            .and_then(|s| s.as_any().downcast_ref::<T>())
    }

    pub fn system_mut<T: System>(&mut self, name: &str) -> Option<&mut T> {
        self.systems
            .iter_mut()
            .find(|slot| slot.name == name)
            .and_then(|slot| slot.system.as_deref_mut())
            .and_then(|s| s.as_any_mut().downcast_mut::<T>())
    }

    pub fn has_system(&self, name: &str) -> bool {
        self.systems.iter().any(|slot| slot.name == name)
    }

    /// System names in dispatch order
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|slot| slot.name.as_str()).collect()
    }

    // --- Lifecycle ---

    pub fn state(&self) -> RuntimeState {
        self.state
    }

    pub fn is_awake(&self) -> bool {
        self.state == RuntimeState::Awake
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Activate the game: systems' `awake` in order, then the `awake` event.
    /// The next frame after awaking is a baseline frame.
    pub fn awake(&mut self) {
        if self.state == RuntimeState::Awake {
            log::warn!("{}", EmberError::StateMisuse("awake on a game that is already awake".into()));
            return;
        }
        self.state = RuntimeState::Awake;
        self.clock.reset_baseline();
        self.dispatch_systems("awake", |s, game| s.awake(game));
        self.events.emit(&GameEvent::Awake);
    }

    /// Deactivate the game: systems' `freeze` in order, then the `freeze` event
    pub fn freeze(&mut self) {
        if self.state != RuntimeState::Awake {
            let err = EmberError::StateMisuse(format!("freeze while {:?}", self.state));
            log::warn!("{err}");
            return;
        }
        self.state = RuntimeState::Frozen;
        self.dispatch_systems("freeze", |s, game| s.freeze(game));
        self.events.emit(&GameEvent::Freeze);
    }

    /// Advisory pause; ticks keep being delivered
    pub fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.paused = true;
        self.dispatch_systems("on_pause", |s, _| s.on_pause());
        self.events.emit(&GameEvent::Pause);
    }

    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        self.dispatch_systems("on_resume", |s, _| s.on_resume());
        self.events.emit(&GameEvent::Resume);
    }

    // --- Frame loop ---

    /// Advance the simulation to `timestamp_ms` (host frame callback).
    ///
    /// Runs the owed fixed ticks, then one variable tick with the raw elapsed
    /// time. Ignored with a warning unless the game is awake.
    pub fn run_frame(&mut self, timestamp_ms: f64) -> FrameReport {
        if self.state != RuntimeState::Awake {
            let err = EmberError::StateMisuse(format!("run_frame while {:?}", self.state));
            log::warn!("{err}");
            return FrameReport::skipped();
        }

        self.clock.tick(timestamp_ms);
        self.stats.frames += 1;
        let spiral_reset = self.clock.spiral_tripped();

        let mut fixed_steps = 0;
        while self.clock.should_fixed_update() {
            let delta = self.clock.consume_fixed_step();
            self.fixed_tick(delta);
            fixed_steps += 1;
            if self.state != RuntimeState::Awake {
                break;
            }
        }
        self.clock.end_frame();

        let frame_delta = self.clock.frame_delta();
        if self.state == RuntimeState::Awake {
            self.variable_tick(frame_delta);
        }
        self.input.end_frame();

        FrameReport {
            fixed_steps,
            fixed_delta: self.clock.fixed_delta(),
            frame_delta,
            spiral_reset,
            skipped: false,
        }
    }

    fn fixed_tick(&mut self, delta: Delta) {
        self.dispatch_entities(Channel::Fixed, delta);
        self.dispatch_systems("fixed_update", |s, game| s.fixed_update(game, delta));
        self.events.emit(&GameEvent::FixedUpdate(delta));
        self.purge_removed();
        self.stats.fixed_ticks += 1;
    }

    fn variable_tick(&mut self, delta: Delta) {
        self.advance_timers(delta);
        self.dispatch_entities(Channel::Variable, delta);
        self.dispatch_systems("update", |s, game| s.update(game, delta));
        self.events.emit(&GameEvent::Update(delta));
        self.purge_removed();
        self.stats.variable_ticks += 1;
    }

    fn advance_timers(&mut self, delta: Delta) {
        for id in self.timers.advance(delta.ms) {
            if let Some(callback) = self.timers.begin_fire(id) {
                let callback = timer::invoke(id, callback, self);
                self.timers.finish_fire(id, callback);
            }
        }
    }

    /// Visit the entities that were live when the pass started.
    ///
    /// Entities spawned during the pass sit past `end` and wait for the next
    /// pass. Removed entities are excised in place and the cursor stays put,
    /// so the entry that shifts into the slot is not skipped.
    fn dispatch_entities(&mut self, channel: Channel, delta: Delta) {
        let mut cursor = 0;
        let mut end = self.order.len();

        while cursor < end {
            let id = self.order[cursor];
            if !self.is_alive(id) {
                self.excise(cursor);
                end -= 1;
                continue;
            }

            let Some(mut entity) = self.entities.remove(&id) else {
                cursor += 1;
                continue;
            };

            let enabled = match channel {
                Channel::Variable => entity.core().can_ever_tick,
                Channel::Fixed => entity.core().can_fixed_tick,
            };
            if enabled {
                let result = match channel {
                    Channel::Variable => entity.update(self, delta),
                    Channel::Fixed => entity.fixed_update(self, delta),
                };
                if let Err(e) = result {
                    log::error!("entity {} failed in {}: {}", id, channel.hook_name(), e);
                }
            }
            self.entities.insert(id, entity);

            if self.is_alive(id) {
                cursor += 1;
            } else {
                self.excise(cursor);
                end -= 1;
            }
        }
    }

    /// Drop the entry at `index` from every table; poolable entities go
    /// back to their type's free list
    fn excise(&mut self, index: usize) {
        let id = self.order.remove(index);
        self.pending_excision = self.pending_excision.saturating_sub(1);
        let kind = self.infos.remove(&id).and_then(|info| info.kind);
        if let Some(entity) = self.entities.remove(&id) {
            if let Some(kind) = kind {
                self.types.release(&kind, entity);
            }
        }
    }

    /// Excise entities removed outside the entity pass (by systems, timers
    /// or entities later in the order) so none outlives its tick
    fn purge_removed(&mut self) {
        if self.pending_excision == 0 {
            return;
        }
        let mut index = 0;
        while index < self.order.len() {
            if self.is_alive(self.order[index]) {
                index += 1;
            } else {
                self.excise(index);
            }
        }
    }

    fn dispatch_systems(
        &mut self,
        hook: &str,
        mut f: impl FnMut(&mut dyn System, &mut Game) -> Result<()>,
    ) {
        let count = self.systems.len();
        for index in 0..count {
            self.run_system_hook(index, hook, &mut f);
        }
    }

    fn run_system_hook(
        &mut self,
        index: usize,
        hook: &str,
        mut f: impl FnMut(&mut dyn System, &mut Game) -> Result<()>,
    ) {
        let Some(mut system) = self.systems[index].system.take() else {
            return;
        };
        if let Err(e) = f(system.as_mut(), self) {
            log::error!("system '{}' failed in {}: {}", self.systems[index].name, hook, e);
        }
        self.systems[index].system = Some(system);
    }

    // --- Entity registry ---

    /// Spawn an instance of a registered type, recycling a pooled instance
    /// when the type is poolable.
    ///
    /// An unknown type name logs a warning and returns
    /// [`EmberError::UnknownType`] without side effects.
    pub fn spawn(&mut self, kind: &str, settings: SpawnSettings) -> Result<EntityId> {
        let entity = match self.types.acquire(kind) {
            Ok(entity) => entity,
            Err(e) => {
                log::warn!("cannot spawn: {e}");
                return Err(e);
            }
        };
        self.register_entity(entity, Some(kind.to_string()), settings)
    }

    /// Spawn an already constructed entity that belongs to no registered type
    pub fn spawn_instance(
        &mut self,
        entity: impl Entity + 'static,
        settings: SpawnSettings,
    ) -> Result<EntityId> {
        self.register_entity(Box::new(entity), None, settings)
    }

    fn register_entity(
        &mut self,
        mut entity: Box<dyn Entity>,
        kind: Option<String>,
        settings: SpawnSettings,
    ) -> Result<EntityId> {
        let id = entity.id();
        if self.infos.contains_key(&id) {
            let err = EmberError::StateMisuse(format!("entity {id} is already registered"));
            log::warn!("cannot spawn: {err}");
            if let Some(kind) = &kind {
                self.types.release(kind, entity);
            }
            return Err(err);
        }
        {
            let core = entity.core_mut();
            core.position = settings.position;
            if let Some(enabled) = settings.can_ever_tick {
                core.can_ever_tick = enabled;
            }
            if let Some(enabled) = settings.can_fixed_tick {
                core.can_fixed_tick = enabled;
            }
        }
        if let Err(e) = entity.init(&settings) {
            log::warn!("entity {id} failed to initialize: {e}");
            if let Some(kind) = &kind {
                self.types.release(kind, entity);
            }
            return Err(e);
        }

        let info = EntityInfo {
            id,
            name: settings.name,
            tag: settings.tag,
            kind,
            layer: settings.layer,
            removed: false,
        };
        if let Some(name) = &info.name {
            if let Some(previous) = self.names.insert(name.clone(), id) {
                log::debug!("name '{name}' moved from entity {previous} to {id}");
            }
        }
        if let Some(tag) = &info.tag {
            self.tags.entry(tag.clone()).or_default().push(id);
        }
        self.order.push(id);
        self.stats.spawned += 1;
        notify(&mut self.systems, |s| s.on_entity_spawn(&info));
        self.infos.insert(id, info);

        if let Err(e) = entity.ready(self) {
            log::error!("entity {id} failed in ready: {e}");
        }
        self.entities.insert(id, entity);
        Ok(id)
    }

    /// Mark an entity removed and drop it from the name and tag tables.
    ///
    /// The entity leaves the dispatch order lazily, by the end of the current
    /// tick. Returns false if the entity is unknown or already removed.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(info) = self.infos.get_mut(&id) else {
            return false;
        };
        if info.removed {
            return false;
        }
        info.removed = true;

        if let Some(name) = &info.name {
            if self.names.get(name) == Some(&id) {
                self.names.remove(name);
            }
        }
        if let Some(tag) = &info.tag {
            if let Some(bucket) = self.tags.get_mut(tag) {
                bucket.retain(|e| *e != id);
                if bucket.is_empty() {
                    self.tags.remove(tag);
                }
            }
        }

        self.pending_excision += 1;
        self.stats.removed += 1;
        notify(&mut self.systems, |s| s.on_entity_remove(info));
        true
    }

    /// Move an entity to another tag bucket.
    ///
    /// Systems are notified before the stored tag changes, so they see the
    /// old tag on the entity and the new one as an argument.
    pub fn change_tag(&mut self, id: EntityId, new_tag: &str) -> bool {
        let Some(info) = self.infos.get_mut(&id) else {
            return false;
        };
        if info.removed {
            log::warn!("change_tag on removed entity {id}");
            return false;
        }
        if info.tag.as_deref() == Some(new_tag) {
            return true;
        }

        if let Some(old) = &info.tag {
            if let Some(bucket) = self.tags.get_mut(old) {
                bucket.retain(|e| *e != id);
                if bucket.is_empty() {
                    self.tags.remove(old);
                }
            }
        }
        self.tags.entry(new_tag.to_string()).or_default().push(id);
        notify(&mut self.systems, |s| s.on_entity_tag_change(info, new_tag));
        info.tag = Some(new_tag.to_string());
        true
    }

    /// Entity currently registered under `name`
    pub fn get_by_name(&self, name: &str) -> Option<EntityId> {
        self.names.get(name).copied()
    }

    /// Live entities holding `tag`, in the order they joined the bucket.
    /// Unknown tags yield an empty slice.
    pub fn get_by_tag(&self, tag: &str) -> &[EntityId] {
        self.tags.get(tag).map(|bucket| bucket.as_slice()).unwrap_or(&[])
    }

    pub fn entity(&self, id: EntityId) -> Option<&dyn Entity> {
        self.entities.get(&id).map(|e| &**e)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut (dyn Entity + 'static)> {
        self.entities.get_mut(&id).map(|e| &mut **e)
    }

    /// Typed access to an entity
    pub fn entity_as<T: Entity>(&self, id: EntityId) -> Option<&T> {
        self.entities.get(&id).and_then(|e| e.downcast_ref::<T>())
    }

    pub fn entity_as_mut<T: Entity>(&mut self, id: EntityId) -> Option<&mut T> {
        self.entities.get_mut(&id).and_then(|e| e.downcast_mut::<T>())
    }

    pub fn info(&self, id: EntityId) -> Option<&EntityInfo> {
        self.infos.get(&id)
    }

    /// Registered and not marked removed
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.infos.get(&id).map(|info| !info.removed).unwrap_or(false)
    }

    /// Dispatch order. May still contain entities removed during the current
    /// tick.
    pub fn entity_ids(&self) -> &[EntityId] {
        &self.order
    }

    /// Number of live (not removed) entities
    pub fn entity_count(&self) -> usize {
        self.infos.values().filter(|info| !info.removed).count()
    }

    /// Idle instances on a poolable type's free list
    pub fn pool_size(&self, kind: &str) -> usize {
        self.types.pool_size(kind)
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    // --- Collaborators ---

    pub fn timers(&self) -> &TimerManager<Game> {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut TimerManager<Game> {
        &mut self.timers
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn stats(&self) -> GameStats {
        self.stats
    }
}

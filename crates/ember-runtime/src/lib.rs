//! Ember Runtime - fixed-timestep scheduler and entity/system runtime
//!
//! Provides the game loop building blocks:
//! - `FrameClock` - fixed-step accumulator with catch-up clamp and spiral guard
//! - `Game` - entity registry, system list and per-frame tick dispatch
//! - `Entity` / `System` - the two kinds of tick participants
//! - `TypeRegistry` - spawn-by-name factories with per-type free lists
//! - `TimerManager` - tagged one-shot and repeating timers
//! - `GameEvent` / `EventBus` - passive listeners notified after each tick
//! - `Director` - pushdown stack of scenes
//! - `Camera` - follow camera and culling
//! - `InputState` - keyboard state with action bindings

mod camera;
mod clock;
mod config;
mod director;
mod entity;
mod event;
mod event_bus;
mod game;
mod input;
mod registry;
mod system;
mod timer;

pub use camera::{Camera, CAMERA_SYSTEM};
pub use clock::{Delta, FrameClock, FrameReport};
pub use config::{is_valid_rate, GameConfig, ENV_DESIRED_FPS, ENV_SPEED};
pub use director::Director;
pub use entity::{AsAny, Entity, EntityCore, EntityInfo, SpawnSettings};
pub use event::GameEvent;
pub use event_bus::{EventBus, Listener, ListenerId};
pub use game::{Game, GameStats, RuntimeState};
pub use input::InputState;
pub use registry::{EntityFactory, TypeRegistry};
pub use system::System;
pub use timer::{TimerCallback, TimerId, TimerManager};

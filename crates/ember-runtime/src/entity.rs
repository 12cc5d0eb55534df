//! Entities, their per-instance state and registry metadata

use crate::clock::Delta;
use crate::game::Game;
use ember_core::{EntityId, Rect, Result, Vec2};
use serde::{Deserialize, Serialize};
use std::any::Any;

/// Downcasting support for trait objects stored by the runtime
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// State every entity carries, owned by the entity itself.
///
/// Not `Clone`: the id must stay unique to one live instance.
#[derive(Debug, PartialEq)]
pub struct EntityCore {
    id: EntityId,
    /// World position
    pub position: Vec2,
    /// Receives variable-rate `update` calls
    pub can_ever_tick: bool,
    /// Receives fixed-rate `fixed_update` calls
    pub can_fixed_tick: bool,
}

impl Default for EntityCore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityCore {
    /// Fresh core with a new id and both tick channels enabled
    pub fn new() -> Self {
        Self {
            id: EntityId::new(),
            position: Vec2::ZERO,
            can_ever_tick: true,
            can_fixed_tick: true,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    #[cfg(test)]
    pub(crate) fn with_id(id: EntityId) -> Self {
        Self { id, ..Self::new() }
    }

    /// Re-issue the id and restore the tick channels a fresh instance of the
    /// type starts with
    pub(crate) fn reinit(&mut self, channels: TickChannels) {
        self.id = EntityId::new();
        self.position = Vec2::ZERO;
        self.can_ever_tick = channels.can_ever_tick;
        self.can_fixed_tick = channels.can_fixed_tick;
    }

    pub(crate) fn channels(&self) -> TickChannels {
        TickChannels {
            can_ever_tick: self.can_ever_tick,
            can_fixed_tick: self.can_fixed_tick,
        }
    }
}

/// Tick-channel flags as a type's factory sets them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TickChannels {
    pub can_ever_tick: bool,
    pub can_fixed_tick: bool,
}

impl Default for TickChannels {
    fn default() -> Self {
        Self {
            can_ever_tick: true,
            can_fixed_tick: true,
        }
    }
}

/// A simulation object driven by the [`Game`] each tick.
///
/// All hooks are optional. `update` and `fixed_update` receive the game so an
/// entity can spawn, remove or retag entities (including itself); while a hook
/// runs the entity is detached from the game, so `game.entity(self_id)` is
/// `None` for its own id.
pub trait Entity: AsAny {
    fn core(&self) -> &EntityCore;
    fn core_mut(&mut self) -> &mut EntityCore;

    /// Apply data-driven settings; called on every spawn before `ready`
    fn init(&mut self, _settings: &SpawnSettings) -> Result<()> {
        Ok(())
    }

    /// Called once after the entity is registered
    fn ready(&mut self, _game: &mut Game) -> Result<()> {
        Ok(())
    }

    /// Variable-rate tick
    fn update(&mut self, _game: &mut Game, _delta: Delta) -> Result<()> {
        Ok(())
    }

    /// Fixed-rate tick; `delta` is already scaled by the game speed
    fn fixed_update(&mut self, _game: &mut Game, _delta: Delta) -> Result<()> {
        Ok(())
    }

    /// Clear type-specific state before the instance goes back to its pool.
    /// Must reset every field `init` does not overwrite.
    fn reset(&mut self) {}

    /// Drawable bounds in world space, if the entity has any
    fn bounds(&self) -> Option<Rect> {
        None
    }
}

impl dyn Entity {
    pub fn id(&self) -> EntityId {
        self.core().id()
    }

    pub fn position(&self) -> Vec2 {
        self.core().position
    }

    pub fn downcast_ref<T: Entity>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Entity>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Per-spawn settings
#[derive(Debug, Clone, Default)]
pub struct SpawnSettings {
    pub position: Vec2,
    /// Render layer key, passed through untouched
    pub layer: Option<String>,
    pub name: Option<String>,
    pub tag: Option<String>,
    /// Overrides the entity's own `can_ever_tick` when set
    pub can_ever_tick: Option<bool>,
    /// Overrides the entity's own `can_fixed_tick` when set
    pub can_fixed_tick: Option<bool>,
    /// Free-form properties, typically from level data
    pub properties: toml::Table,
}

impl SpawnSettings {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    pub fn with_ticks(mut self, can_ever_tick: bool, can_fixed_tick: bool) -> Self {
        self.can_ever_tick = Some(can_ever_tick);
        self.can_fixed_tick = Some(can_fixed_tick);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Registry-side metadata the game keeps for each live entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityInfo {
    /// The entity's id
    pub id: EntityId,
    /// Lookup name (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Group tag (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Registered type the entity was spawned from (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Render layer key (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    /// Marked for excision; never ticked again
    pub removed: bool,
}

impl EntityInfo {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            name: None,
            tag: None,
            kind: None,
            layer: None,
            removed: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Crate {
        core: EntityCore,
        hits: u32,
    }

    impl Entity for Crate {
        fn core(&self) -> &EntityCore {
            &self.core
        }
        fn core_mut(&mut self) -> &mut EntityCore {
            &mut self.core
        }
    }

    #[test]
    fn core_defaults() {
        let core = EntityCore::new();
        assert!(core.can_ever_tick);
        assert!(core.can_fixed_tick);
        assert_eq!(core.position, Vec2::ZERO);
    }

    #[test]
    fn reinit_assigns_fresh_id_and_given_channels() {
        let mut core = EntityCore::new();
        let old = core.id();
        core.position = Vec2::new(3.0, 4.0);
        core.can_fixed_tick = false;
        core.reinit(TickChannels {
            can_ever_tick: false,
            can_fixed_tick: true,
        });
        assert!(core.id() > old);
        assert_eq!(core.position, Vec2::ZERO);
        assert!(!core.can_ever_tick);
        assert!(core.can_fixed_tick);
    }

    #[test]
    fn downcast_through_trait_object() {
        let mut boxed: Box<dyn Entity> = Box::new(Crate {
            core: EntityCore::new(),
            hits: 2,
        });
        assert_eq!(boxed.downcast_ref::<Crate>().map(|c| c.hits), Some(2));
        if let Some(c) = boxed.downcast_mut::<Crate>() {
            c.hits += 1;
        }
        assert_eq!(boxed.downcast_ref::<Crate>().map(|c| c.hits), Some(3));
    }

    #[test]
    fn spawn_settings_builder() {
        let settings = SpawnSettings::at(1.0, 2.0)
            .with_name("hero")
            .with_tag("player")
            .with_layer("actors")
            .with_ticks(true, false)
            .with_property("hp", 10i64);
        assert_eq!(settings.position, Vec2::new(1.0, 2.0));
        assert_eq!(settings.name.as_deref(), Some("hero"));
        assert_eq!(settings.tag.as_deref(), Some("player"));
        assert_eq!(settings.can_fixed_tick, Some(false));
        assert_eq!(settings.properties.get("hp"), Some(&toml::Value::Integer(10)));
    }

    #[test]
    fn info_serializes_without_empty_fields() {
        let info = EntityInfo::new(EntityId::from_raw(7)).with_name("door");
        let text = toml::to_string(&info).unwrap();
        assert!(text.contains("name = \"door\""));
        assert!(!text.contains("tag"));
    }
}

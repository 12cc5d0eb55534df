//! Entity type registry with per-type free lists
//!
//! Types are registered under a string key so level data can spawn them by
//! name. Poolable types keep removed instances on a free list and hand them
//! out again on the next spawn instead of constructing a new one.

use crate::entity::{Entity, TickChannels};
use ember_core::{EmberError, Result};
use std::collections::HashMap;

/// Constructs a fresh instance of a registered type
pub type EntityFactory = Box<dyn Fn() -> Box<dyn Entity>>;

struct EntityType {
    factory: EntityFactory,
    poolable: bool,
    pool: Vec<Box<dyn Entity>>,
    /// Channels of the last factory-built instance
    channels: TickChannels,
}

/// Name -> factory mapping plus free lists for poolable types
#[derive(Default)]
pub struct TypeRegistry {
    types: HashMap<String, EntityType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type. Returns false (keeping the original) on a duplicate
    /// or empty name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        poolable: bool,
        factory: impl Fn() -> Box<dyn Entity> + 'static,
    ) -> bool {
        let name = name.into();
        if name.is_empty() {
            log::warn!("refusing to register entity type with an empty name");
            return false;
        }
        if self.types.contains_key(&name) {
            let err = EmberError::DuplicateRegistration {
                kind: "entity type",
                name,
            };
            log::warn!("{err}; keeping the original");
            return false;
        }
        self.types.insert(
            name,
            EntityType {
                factory: Box::new(factory),
                poolable,
                pool: Vec::new(),
                channels: TickChannels::default(),
            },
        );
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn is_poolable(&self, name: &str) -> bool {
        self.types.get(name).map(|t| t.poolable).unwrap_or(false)
    }

    /// Take an instance of `name`, recycled from its free list when possible.
    /// Recycled instances come back with a fresh id and the core state a
    /// factory-built instance starts with.
    pub fn acquire(&mut self, name: &str) -> Result<Box<dyn Entity>> {
        let entry = self
            .types
            .get_mut(name)
            .ok_or_else(|| EmberError::UnknownType(name.to_string()))?;

        if let Some(mut entity) = entry.pool.pop() {
            entity.core_mut().reinit(entry.channels);
            return Ok(entity);
        }
        let entity = (entry.factory)();
        entry.channels = entity.core().channels();
        Ok(entity)
    }

    /// Hand an excised instance back. Poolable types reset it and keep it;
    /// anything else is dropped.
    pub fn release(&mut self, name: &str, mut entity: Box<dyn Entity>) {
        if let Some(entry) = self.types.get_mut(name) {
            if entry.poolable {
                entity.reset();
                entry.pool.push(entity);
            }
        }
    }

    /// Number of idle instances on a type's free list
    pub fn pool_size(&self, name: &str) -> usize {
        self.types.get(name).map(|t| t.pool.len()).unwrap_or(0)
    }

    /// Registered type names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityCore;
    use ember_core::Vec2;

    #[derive(Default)]
    struct Spark {
        core: EntityCore,
        heat: u32,
    }

    impl Entity for Spark {
        fn core(&self) -> &EntityCore {
            &self.core
        }
        fn core_mut(&mut self) -> &mut EntityCore {
            &mut self.core
        }
        fn reset(&mut self) {
            self.heat = 0;
        }
    }

    fn spark_registry(poolable: bool) -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        assert!(registry.register("spark", poolable, || Box::new(Spark::default())));
        registry
    }

    #[test]
    fn duplicate_registration_keeps_original() {
        let mut registry = spark_registry(true);
        assert!(!registry.register("spark", false, || Box::new(Spark::default())));
        assert!(registry.is_poolable("spark"));
        assert!(!registry.register("", false, || Box::new(Spark::default())));
        assert_eq!(registry.names(), vec!["spark"]);
    }

    #[test]
    fn unknown_type_is_an_error() {
        let mut registry = TypeRegistry::new();
        let err = registry.acquire("ghost").err().unwrap();
        assert!(matches!(err, EmberError::UnknownType(name) if name == "ghost"));
    }

    #[test]
    fn recycled_instance_has_no_stale_state() {
        let mut registry = spark_registry(true);
        let mut spark = registry.acquire("spark").unwrap();
        let first_id = spark.id();
        spark.core_mut().position = Vec2::new(5.0, 5.0);
        spark.core_mut().can_ever_tick = false;
        spark.downcast_mut::<Spark>().unwrap().heat = 99;

        registry.release("spark", spark);
        assert_eq!(registry.pool_size("spark"), 1);

        let again = registry.acquire("spark").unwrap();
        assert_eq!(registry.pool_size("spark"), 0);
        assert!(again.id() > first_id);
        assert_eq!(again.position(), Vec2::ZERO);
        assert!(again.core().can_ever_tick);
        assert_eq!(again.downcast_ref::<Spark>().unwrap().heat, 0);
    }

    #[test]
    fn recycled_instance_keeps_factory_tick_channels() {
        let mut registry = TypeRegistry::new();
        registry.register("ember", true, || {
            let mut spark = Spark::default();
            spark.core.can_ever_tick = false;
            Box::new(spark)
        });

        let mut fresh = registry.acquire("ember").unwrap();
        assert!(!fresh.core().can_ever_tick);
        fresh.core_mut().can_ever_tick = true;
        fresh.core_mut().can_fixed_tick = false;
        registry.release("ember", fresh);

        let recycled = registry.acquire("ember").unwrap();
        assert!(!recycled.core().can_ever_tick);
        assert!(recycled.core().can_fixed_tick);
    }

    #[test]
    fn non_poolable_instances_are_dropped() {
        let mut registry = spark_registry(false);
        let spark = registry.acquire("spark").unwrap();
        registry.release("spark", spark);
        assert_eq!(registry.pool_size("spark"), 0);
    }
}

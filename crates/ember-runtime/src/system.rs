//! Runtime system trait

use crate::clock::Delta;
use crate::entity::{AsAny, EntityInfo};
use crate::game::Game;
use ember_core::Result;

/// A named collaborator invoked by the game for lifecycle and per-tick hooks.
///
/// Systems are invoked in registration order for every hook. Fixed update
/// runs at a constant rate (simulation), update runs once per frame after
/// entities have been ticked. Every hook is optional.
///
/// While one of a system's own hooks runs it is detached from the game, so
/// it does not receive entity notifications caused by its own registry calls.
pub trait System: AsAny {
    /// Unique, non-empty name; also the key for [`Game::system`]
    fn name(&self) -> &str;

    /// Called when the game becomes active
    fn awake(&mut self, _game: &mut Game) -> Result<()> {
        Ok(())
    }

    /// Called once per frame for variable-rate logic
    fn update(&mut self, _game: &mut Game, _delta: Delta) -> Result<()> {
        Ok(())
    }

    /// Called at a fixed rate for deterministic simulation
    fn fixed_update(&mut self, _game: &mut Game, _delta: Delta) -> Result<()> {
        Ok(())
    }

    /// Called when the game is deactivated
    fn freeze(&mut self, _game: &mut Game) -> Result<()> {
        Ok(())
    }

    fn on_pause(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_resume(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_entity_spawn(&mut self, _entity: &EntityInfo) {}

    fn on_entity_remove(&mut self, _entity: &EntityInfo) {}

    /// `entity.tag` still holds the old tag while this runs
    fn on_entity_tag_change(&mut self, _entity: &EntityInfo, _new_tag: &str) {}
}

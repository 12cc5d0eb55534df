//! Lifecycle and tick notifications

use crate::clock::Delta;

/// Notification emitted by the game after the primary work of a phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    Awake,
    Freeze,
    Pause,
    Resume,
    /// After entities and systems finished a variable-rate tick
    Update(Delta),
    /// After entities and systems finished a fixed-rate tick
    FixedUpdate(Delta),
}

impl GameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::Awake => "awake",
            GameEvent::Freeze => "freeze",
            GameEvent::Pause => "pause",
            GameEvent::Resume => "resume",
            GameEvent::Update(_) => "update",
            GameEvent::FixedUpdate(_) => "fixedUpdate",
        }
    }

    /// Tick delta, for the tick events
    pub fn delta(&self) -> Option<Delta> {
        match self {
            GameEvent::Update(delta) | GameEvent::FixedUpdate(delta) => Some(*delta),
            _ => None,
        }
    }
}

//! Director - pushdown stack of named games (scenes).
//!
//! Only the top game is awake and receives frames. Pushing a scene freezes
//! the one below it; popping re-awakes it. Each game keeps its own entities,
//! systems and timers across the switch.

use crate::clock::FrameReport;
use crate::game::Game;
use ember_core::EmberError;
use std::collections::HashMap;

/// Owns registered scenes and switches between them
#[derive(Default)]
pub struct Director {
    scenes: HashMap<String, Game>,
    stack: Vec<String>,
}

impl Director {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scene under `name`. Returns false (keeping the original)
    /// on a duplicate name.
    pub fn register(&mut self, name: impl Into<String>, game: Game) -> bool {
        let name = name.into();
        if self.scenes.contains_key(&name) {
            let err = EmberError::DuplicateRegistration { kind: "scene", name };
            log::warn!("{err}; keeping the original");
            return false;
        }
        self.scenes.insert(name, game);
        true
    }

    /// Freeze the current scene and awake `name` on top of it.
    /// Returns false if the scene is unknown or already on the stack.
    pub fn push(&mut self, name: &str) -> bool {
        if !self.can_enter(name) {
            return false;
        }
        self.freeze_top();
        self.stack.push(name.to_string());
        self.awake_top();
        true
    }

    /// Freeze and pop the top scene, re-awaking the one below.
    /// Returns None if only one scene remains.
    pub fn pop(&mut self) -> Option<String> {
        if self.stack.len() <= 1 {
            return None;
        }
        self.freeze_top();
        let popped = self.stack.pop();
        self.awake_top();
        popped
    }

    /// Swap the top scene for `name`
    pub fn replace(&mut self, name: &str) -> bool {
        if self.current() == Some(name) {
            return true;
        }
        if !self.can_enter(name) {
            return false;
        }
        self.freeze_top();
        self.stack.pop();
        self.stack.push(name.to_string());
        self.awake_top();
        true
    }

    /// Forward a host frame to the top scene
    pub fn run_frame(&mut self, timestamp_ms: f64) -> FrameReport {
        match self.current_game_mut() {
            Some(game) => game.run_frame(timestamp_ms),
            None => FrameReport::skipped(),
        }
    }

    /// Name of the top scene
    pub fn current(&self) -> Option<&str> {
        self.stack.last().map(|s| s.as_str())
    }

    pub fn current_game(&self) -> Option<&Game> {
        self.stack.last().and_then(|name| self.scenes.get(name))
    }

    pub fn current_game_mut(&mut self) -> Option<&mut Game> {
        let name = self.stack.last()?;
        self.scenes.get_mut(name)
    }

    pub fn game(&self, name: &str) -> Option<&Game> {
        self.scenes.get(name)
    }

    pub fn game_mut(&mut self, name: &str) -> Option<&mut Game> {
        self.scenes.get_mut(name)
    }

    /// Scene names on the stack, bottom to top
    pub fn stack_names(&self) -> Vec<&str> {
        self.stack.iter().map(|s| s.as_str()).collect()
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    fn can_enter(&self, name: &str) -> bool {
        if !self.scenes.contains_key(name) {
            log::warn!("unknown scene '{name}'");
            return false;
        }
        if self.stack.iter().any(|s| s == name) {
            log::warn!("scene '{name}' is already on the stack");
            return false;
        }
        true
    }

    fn freeze_top(&mut self) {
        if let Some(game) = self.current_game_mut() {
            if game.is_awake() {
                game.freeze();
            }
        }
    }

    fn awake_top(&mut self) {
        if let Some(game) = self.current_game_mut() {
            if !game.is_awake() {
                game.awake();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Delta;
    use crate::game::RuntimeState;
    use crate::system::System;
    use ember_core::Result;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Scene {
        label: &'static str,
        log: Log,
    }

    impl System for Scene {
        fn name(&self) -> &str {
            "scene"
        }
        fn awake(&mut self, _game: &mut Game) -> Result<()> {
            self.log.borrow_mut().push(format!("{}:awake", self.label));
            Ok(())
        }
        fn freeze(&mut self, _game: &mut Game) -> Result<()> {
            self.log.borrow_mut().push(format!("{}:freeze", self.label));
            Ok(())
        }
        fn update(&mut self, _game: &mut Game, _delta: Delta) -> Result<()> {
            self.log.borrow_mut().push(format!("{}:update", self.label));
            Ok(())
        }
    }

    fn director(log: &Log) -> Director {
        let mut director = Director::new();
        for label in ["title", "level", "pause"] {
            let mut game = Game::new();
            game.register_system(Scene {
                label,
                log: Rc::clone(log),
            });
            assert!(director.register(label, game));
        }
        director
    }

    #[test]
    fn push_freezes_the_scene_below() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut director = director(&log);
        assert!(director.push("level"));
        assert!(director.push("pause"));

        assert_eq!(director.current(), Some("pause"));
        assert_eq!(director.stack_names(), vec!["level", "pause"]);
        assert_eq!(*log.borrow(), vec!["level:awake", "level:freeze", "pause:awake"]);
        assert_eq!(director.game("level").unwrap().state(), RuntimeState::Frozen);
    }

    #[test]
    fn pop_reawakes_and_refuses_the_last_scene() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut director = director(&log);
        director.push("level");
        director.push("pause");
        log.borrow_mut().clear();

        assert_eq!(director.pop().as_deref(), Some("pause"));
        assert_eq!(*log.borrow(), vec!["pause:freeze", "level:awake"]);
        assert!(director.pop().is_none());
        assert_eq!(director.stack_depth(), 1);
    }

    #[test]
    fn replace_swaps_the_top() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut director = director(&log);
        director.push("title");
        assert!(director.replace("level"));
        assert!(director.replace("level"));
        assert_eq!(director.stack_names(), vec!["level"]);
        assert_eq!(*log.borrow(), vec!["title:awake", "title:freeze", "level:awake"]);
    }

    #[test]
    fn unknown_duplicate_and_stacked_scenes_are_rejected() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut director = director(&log);
        assert!(!director.register("level", Game::new()));
        assert!(!director.push("credits"));
        assert!(director.push("level"));
        assert!(!director.push("level"));
        assert!(!director.replace("credits"));
        assert_eq!(director.stack_names(), vec!["level"]);
    }

    #[test]
    fn frames_reach_only_the_top_scene() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut director = director(&log);
        assert!(director.run_frame(0.0).skipped);

        director.push("level");
        director.run_frame(0.0);
        director.push("pause");
        director.run_frame(16.0);

        let updates: Vec<String> = log
            .borrow()
            .iter()
            .filter(|e| e.ends_with(":update"))
            .cloned()
            .collect();
        assert_eq!(updates, vec!["level:update", "pause:update"]);
    }
}

//! Keyboard state and named actions, fed by the host between frames

use std::collections::{BTreeMap, HashSet};
use winit::keyboard::KeyCode;

/// Edge-triggered sets are cleared by `Game::run_frame` once the frame's
/// variable tick has seen them.
#[derive(Debug, Default)]
struct KeyEdges {
    pressed: HashSet<KeyCode>,
    released: HashSet<KeyCode>,
}

/// Keys held plus this frame's press/release edges, queried by action name.
#[derive(Debug)]
pub struct InputState {
    held: HashSet<KeyCode>,
    edges: KeyEdges,
    bindings: BTreeMap<String, Vec<KeyCode>>,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    /// Empty state with the stock bindings: movement on WASD and arrows,
    /// `fire` on space, `pause` on escape or P
    pub fn new() -> Self {
        let bindings = [
            ("up", vec![KeyCode::KeyW, KeyCode::ArrowUp]),
            ("down", vec![KeyCode::KeyS, KeyCode::ArrowDown]),
            ("left", vec![KeyCode::KeyA, KeyCode::ArrowLeft]),
            ("right", vec![KeyCode::KeyD, KeyCode::ArrowRight]),
            ("fire", vec![KeyCode::Space]),
            ("pause", vec![KeyCode::Escape, KeyCode::KeyP]),
        ]
        .into_iter()
        .map(|(action, keys)| (action.to_string(), keys))
        .collect();
        Self {
            held: HashSet::new(),
            edges: KeyEdges::default(),
            bindings,
        }
    }

    /// Replace the keys bound to `action`
    pub fn bind_action(&mut self, action: impl Into<String>, keys: Vec<KeyCode>) {
        self.bindings.insert(action.into(), keys);
    }

    pub fn unbind_action(&mut self, action: &str) -> bool {
        self.bindings.remove(action).is_some()
    }

    /// First key bound to `action`
    pub fn key_for(&self, action: &str) -> Option<KeyCode> {
        self.bindings.get(action).and_then(|keys| keys.first().copied())
    }

    pub fn process_key_down(&mut self, key: KeyCode) {
        // OS key repeat is not a new press
        if self.held.insert(key) {
            self.edges.pressed.insert(key);
        }
    }

    pub fn process_key_up(&mut self, key: KeyCode) {
        if self.held.remove(&key) {
            self.edges.released.insert(key);
        }
    }

    /// Drop this frame's edges; held keys stay held
    pub fn end_frame(&mut self) {
        self.edges.pressed.clear();
        self.edges.released.clear();
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    pub fn is_key_just_pressed(&self, key: KeyCode) -> bool {
        self.edges.pressed.contains(&key)
    }

    pub fn is_key_just_released(&self, key: KeyCode) -> bool {
        self.edges.released.contains(&key)
    }

    pub fn is_action_pressed(&self, action: &str) -> bool {
        self.any_bound(action, &self.held)
    }

    pub fn is_action_just_pressed(&self, action: &str) -> bool {
        self.any_bound(action, &self.edges.pressed)
    }

    pub fn is_action_just_released(&self, action: &str) -> bool {
        self.any_bound(action, &self.edges.released)
    }

    /// Actions with a key pressed this frame, in name order
    pub fn actions_just_pressed(&self) -> Vec<&str> {
        self.bindings
            .iter()
            .filter(|(_, keys)| keys.iter().any(|k| self.edges.pressed.contains(k)))
            .map(|(action, _)| action.as_str())
            .collect()
    }

    /// Bound action names, in name order
    pub fn action_names(&self) -> Vec<&str> {
        self.bindings.keys().map(|a| a.as_str()).collect()
    }

    fn any_bound(&self, action: &str, set: &HashSet<KeyCode>) -> bool {
        self.bindings
            .get(action)
            .is_some_and(|keys| keys.iter().any(|k| set.contains(k)))
    }
}

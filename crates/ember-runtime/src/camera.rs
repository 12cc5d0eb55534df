//! 2D follow camera, run as a system after entities each frame

use crate::clock::Delta;
use crate::entity::EntityInfo;
use crate::game::Game;
use crate::system::System;
use ember_core::{EntityId, Rect, Result, Vec2};

/// Name the camera registers under
pub const CAMERA_SYSTEM: &str = "camera";

/// A camera that follows an entity and culls against its viewport
pub struct Camera {
    /// Center of the view in world space
    pub position: Vec2,
    /// Visible area size in world units
    pub viewport: Vec2,
    /// Added to the target's position to get the desired center
    pub offset: Vec2,
    /// Exponential follow rate per second. Zero or less snaps to the target.
    pub smoothing: f32,
    /// World area the view is kept inside
    pub bounds: Option<Rect>,
    target: Option<EntityId>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            viewport: Vec2::new(320.0, 180.0),
            offset: Vec2::ZERO,
            smoothing: 0.0,
            bounds: None,
            target: None,
        }
    }
}

impl Camera {
    pub fn new(viewport: Vec2) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    pub fn with_smoothing(mut self, smoothing: f32) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn follow(&mut self, target: EntityId) {
        self.target = Some(target);
    }

    pub fn unfollow(&mut self) {
        self.target = None;
    }

    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// World-space rectangle currently in view
    pub fn visible_rect(&self) -> Rect {
        Rect::centered(self.position, self.viewport)
    }

    pub fn is_visible(&self, rect: &Rect) -> bool {
        self.visible_rect().intersects(rect)
    }

    /// Live entities inside the view, in dispatch order. Entities without
    /// bounds are tested by their position.
    pub fn visible_entities(&self, game: &Game) -> Vec<EntityId> {
        let view = self.visible_rect();
        game.entity_ids()
            .iter()
            .copied()
            .filter(|id| game.is_alive(*id))
            .filter(|id| match game.entity(*id) {
                Some(entity) => match entity.bounds() {
                    Some(bounds) => view.intersects(&bounds),
                    None => view.contains(entity.position()),
                },
                None => false,
            })
            .collect()
    }

    fn clamp_to_bounds(&mut self) {
        let Some(bounds) = self.bounds else {
            return;
        };
        let half = self.viewport * 0.5;
        self.position.x = clamp_axis(self.position.x, bounds.x + half.x, bounds.right() - half.x);
        self.position.y = clamp_axis(self.position.y, bounds.y + half.y, bounds.bottom() - half.y);
    }
}

/// Clamp, centering when the view is larger than the bounds on this axis
fn clamp_axis(value: f32, min: f32, max: f32) -> f32 {
    if min > max {
        (min + max) * 0.5
    } else {
        value.clamp(min, max)
    }
}

impl System for Camera {
    fn name(&self) -> &str {
        CAMERA_SYSTEM
    }

    fn update(&mut self, game: &mut Game, delta: Delta) -> Result<()> {
        if let Some(target) = self.target {
            if let Some(entity) = game.entity(target) {
                let desired = entity.position() + self.offset;
                self.position = if self.smoothing <= 0.0 {
                    desired
                } else {
                    let t = 1.0 - (-self.smoothing * delta.secs as f32).exp();
                    self.position.lerp(&desired, t)
                };
            }
        }
        self.clamp_to_bounds();
        Ok(())
    }

    fn on_entity_remove(&mut self, entity: &EntityInfo) {
        if self.target == Some(entity.id) {
            log::debug!("camera target {} removed", entity.id);
            self.target = None;
        }
    }
}

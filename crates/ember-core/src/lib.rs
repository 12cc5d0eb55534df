//! Ember Core - Foundational types for the Ember runtime
//!
//! This crate provides the core types that all other Ember crates depend on:
//! - `EntityId` - Process-unique entity identifiers
//! - `Vec2`, `Rect` - 2D spatial types
//! - Error types and Result alias

mod error;
mod id;
mod types;

pub use error::{EmberError, Result};
pub use id::EntityId;
pub use types::{Rect, Vec2};

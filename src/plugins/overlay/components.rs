//! Components and messages shared by the overlay systems.

use bevy::prelude::*;

use crate::actors::ActorId;
use crate::markers::{MarkerCategory, MarkerHandle};

// =============================================================================
// Map Components
// =============================================================================

/// Parent of every marker drawn on one map.
#[derive(Component, Debug)]
pub struct MapRoot {
    pub map_id: String,
}

/// Sprite entity backing one marker handle.
#[derive(Component, Debug, Clone, Copy)]
pub struct MapMarker {
    pub handle: MarkerHandle,
    pub owner: ActorId,
    pub category: MarkerCategory,
}

// =============================================================================
// Messages
// =============================================================================

/// Throttled request to re-evaluate which map layer a marker sits on.
#[derive(Message, Debug, Clone, Copy)]
pub struct MarkerLayerCheck {
    pub marker: Entity,
    pub height: f32,
}

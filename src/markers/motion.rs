//! Per-frame marker motion and the throttled layer lookup.

use bevy::prelude::*;
use std::time::Duration;

use crate::actors::{ActorId, WorldSnapshot};

use super::PositionProjector;

/// Rate limiter for the layer lookup of one marker. The accumulator starts at
/// the window, so the first frame after creation always fires.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct MotionThrottle {
    accumulated: Duration,
    window: Duration,
}

impl MotionThrottle {
    pub fn new(window: Duration) -> Self {
        Self {
            accumulated: window,
            window,
        }
    }

    pub fn accumulated(&self) -> Duration {
        self.accumulated
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn set_window(&mut self, window: Duration) {
        self.window = window;
    }

    /// Adds one frame. Returns `true` when the window is reached, then starts
    /// counting again from zero.
    pub fn advance(&mut self, delta: Duration) -> bool {
        self.accumulated += delta;
        if self.accumulated >= self.window {
            self.accumulated = Duration::ZERO;
            true
        } else {
            false
        }
    }
}

/// Where a dynamic marker should be drawn this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerPose {
    pub position: Vec2,
    pub rotation_degrees: f32,
    /// World height of the owner, for the layer lookup
    pub height: f32,
}

/// `None` when the owner is no longer in the world.
pub fn project_owner(
    owner: ActorId,
    snapshot: &WorldSnapshot,
    projector: &dyn PositionProjector,
) -> Option<MarkerPose> {
    let actor = snapshot.get(owner)?;
    Some(MarkerPose {
        position: projector.world_to_map(actor.pose.position),
        rotation_degrees: projector.map_rotation(actor.pose.yaw_degrees),
        height: actor.pose.position.y,
    })
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LayerStatus {
    OnTop,
    Underneath,
    Hidden,
}

impl LayerStatus {
    pub fn alpha(self) -> f32 {
        match self {
            LayerStatus::OnTop => 1.0,
            LayerStatus::Underneath | LayerStatus::Hidden => 0.25,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerBand {
    pub floor: f32,
    pub ceiling: f32,
}

impl LayerBand {
    pub fn contains(&self, height: f32) -> bool {
        height >= self.floor && height < self.ceiling
    }
}

/// Height bands of the current map, lowest first, and the band being viewed.
/// With no active band everything is drawn on top.
#[derive(Resource, Clone, Debug, Default, PartialEq)]
pub struct MapLayers {
    pub bands: Vec<LayerBand>,
    pub active: Option<usize>,
}

impl MapLayers {
    pub fn status_at(&self, height: f32) -> LayerStatus {
        let Some(active) = self.active else {
            return LayerStatus::OnTop;
        };

        match self.bands.iter().position(|band| band.contains(height)) {
            Some(band) if band == active => LayerStatus::OnTop,
            Some(band) if band > active => LayerStatus::Hidden,
            _ => LayerStatus::Underneath,
        }
    }

    /// Views the next band up, wrapping back to the base map.
    pub fn cycle(&mut self) {
        self.active = match self.active {
            None if !self.bands.is_empty() => Some(0),
            Some(index) if index + 1 < self.bands.len() => Some(index + 1),
            _ => None,
        };
    }
}

// =============================================================================
// Tests
// =============================================================================

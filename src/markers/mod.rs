//! Marker lifecycle engine: which markers exist, when they are created and
//! destroyed, and how their transforms follow the actors they track.

mod events;
mod filter;
mod lifecycle;
mod motion;
mod registry;
mod scheduler;
mod surface;

use bevy::prelude::*;

use crate::actors::{ActorId, WorldSnapshot};
use crate::settings::{KnowledgeLevel, VisibilitySettings};

pub use events::{ActorEvent, Subscription, WorldEventBus};
pub use filter::{classify, hot_zone_style, HOT_ZONE_SIZE, PLAYER_MARKER_SIZE};
pub use lifecycle::{PlayerMarkerProvider, ProviderState};
pub use motion::{project_owner, LayerBand, LayerStatus, MapLayers, MarkerPose, MotionThrottle};
pub use registry::{MarkerRegistry, TrackedMarker};
pub use scheduler::{HotZoneProvider, LoopStep, RefreshLoop, DEFAULT_REFRESH_INTERVAL};
pub use surface::{MapProjection, MapSurface, PositionProjector};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MarkerCategory {
    Friendly,
    Boss,
    Enemy,
    Scav,
    HotZone,
}

impl MarkerCategory {
    pub const ALL: [MarkerCategory; 5] = [
        MarkerCategory::Friendly,
        MarkerCategory::Boss,
        MarkerCategory::Enemy,
        MarkerCategory::Scav,
        MarkerCategory::HotZone,
    ];

    /// Categories handled by the player marker provider.
    pub const PLAYER: [MarkerCategory; 4] = [
        MarkerCategory::Friendly,
        MarkerCategory::Boss,
        MarkerCategory::Enemy,
        MarkerCategory::Scav,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MarkerCategory::Friendly => "Friendly Player",
            MarkerCategory::Boss => "Boss",
            MarkerCategory::Enemy => "Enemy Player",
            MarkerCategory::Scav => "Scav",
            MarkerCategory::HotZone => "Enemy Hot Zone",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MarkerIcon {
    Arrow,
    Star,
    Circle,
}

impl MarkerIcon {
    pub fn asset_path(self) -> &'static str {
        match self {
            MarkerIcon::Arrow => "markers/arrow.png",
            MarkerIcon::Star => "markers/star.png",
            MarkerIcon::Circle => "markers/plain-circle.png",
        }
    }
}

/// Display decision produced by the visibility filter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerStyle {
    pub category: MarkerCategory,
    pub color: Color,
    pub icon: MarkerIcon,
}

/// Opaque handle returned by a [`MapSurface`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct MarkerHandle(pub u64);

/// Everything a surface needs to create one marker.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerSpec {
    pub category: MarkerCategory,
    pub label: String,
    pub icon: MarkerIcon,
    pub color: Color,
    pub position: Vec2,
    pub size: Vec2,
    pub rotation_degrees: f32,
    pub scale: f32,
    /// Follows its owner every frame
    pub dynamic: bool,
    pub owner: ActorId,
}

/// Why a registry operation left everything untouched.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SkipReason {
    Inactive,
    Observer,
    AlreadyTracked,
    NotTracked,
    Disqualified,
    Stale,
}

/// Outcome of a registry mutation attempt. There are no error cases: anything
/// that cannot be applied is skipped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mutation {
    Applied,
    Skipped(SkipReason),
}

impl Mutation {
    pub fn is_applied(self) -> bool {
        self == Mutation::Applied
    }
}

/// Inputs every provider operation reads.
#[derive(Clone, Copy)]
pub struct SyncContext<'a> {
    pub snapshot: &'a WorldSnapshot,
    pub settings: &'a VisibilitySettings,
    pub knowledge: KnowledgeLevel,
    pub projector: &'a dyn PositionProjector,
}

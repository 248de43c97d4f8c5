//! Map overlay plugin: marker providers, the sprite surface and motion.

mod canvas;
mod components;
mod motion;
mod providers;

use bevy::ecs::schedule::IntoScheduleConfigs;
use bevy::prelude::*;

use crate::actors::WorldSnapshot;
use crate::markers::{HotZoneProvider, MapLayers, MapProjection, PlayerMarkerProvider, WorldEventBus};

pub use canvas::{MapCanvas, MarkerIcons, SpriteSurface, MAP_SIZE};
pub use components::{MapMarker, MapRoot, MarkerLayerCheck};

/// Ordering of the overlay frame: world capture, provider lifecycle, event
/// delivery and polling, then motion.
#[derive(SystemSet, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum OverlaySet {
    Capture,
    Lifecycle,
    Motion,
}

// =============================================================================
// Plugin
// =============================================================================

pub struct OverlayPlugin;

impl Plugin for OverlayPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<MarkerLayerCheck>()
            .init_resource::<WorldSnapshot>()
            .init_resource::<WorldEventBus>()
            .init_resource::<PlayerMarkerProvider>()
            .init_resource::<HotZoneProvider>()
            .init_resource::<MapCanvas>()
            .init_resource::<MapProjection>()
            .init_resource::<MapLayers>()
            .configure_sets(
                Update,
                (OverlaySet::Capture, OverlaySet::Lifecycle, OverlaySet::Motion).chain(),
            )
            .add_systems(
                Startup,
                (providers::load_overlay_settings, canvas::load_marker_icons),
            )
            .add_systems(
                Update,
                providers::capture_world_snapshot.in_set(OverlaySet::Capture),
            )
            .add_systems(
                Update,
                (
                    providers::sync_marker_providers,
                    providers::apply_visibility_changes,
                    providers::deliver_world_events,
                    providers::tick_hot_zones,
                )
                    .chain()
                    .in_set(OverlaySet::Lifecycle),
            )
            .add_systems(
                Update,
                (
                    canvas::sync_map_visibility,
                    motion::handle_layer_cycle,
                    (motion::update_marker_motion, motion::apply_marker_layers).chain(),
                )
                    .in_set(OverlaySet::Motion),
            );
    }
}

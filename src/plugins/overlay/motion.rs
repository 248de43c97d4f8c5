//! Per-frame marker motion and layer alpha.

use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;

use crate::actors::WorldSnapshot;
use crate::markers::{project_owner, MapLayers, MapProjection, MotionThrottle};
use crate::plugins::core::{InputBindings, MapView};
use crate::settings::VisibilitySettings;

use super::components::{MapMarker, MarkerLayerCheck};

/// Moves every dynamic marker to its owner's pose. Markers whose owner is gone
/// stay where they are; removal belongs to the providers.
pub fn update_marker_motion(
    time: Res<Time>,
    snapshot: Res<WorldSnapshot>,
    projection: Res<MapProjection>,
    settings: Res<VisibilitySettings>,
    mut markers: Query<(Entity, &MapMarker, &mut Transform, &mut MotionThrottle)>,
    mut checks: MessageWriter<MarkerLayerCheck>,
) {
    let window = settings.motion_throttle();

    for (entity, marker, mut transform, mut throttle) in markers.iter_mut() {
        let Some(pose) = project_owner(marker.owner, &snapshot, &*projection) else {
            continue;
        };

        transform.translation.x = pose.position.x;
        transform.translation.y = pose.position.y;
        transform.rotation = Quat::from_rotation_z(pose.rotation_degrees.to_radians());

        if throttle.window() != window {
            throttle.set_window(window);
        }
        if throttle.advance(time.delta()) {
            checks.write(MarkerLayerCheck {
                marker: entity,
                height: pose.height,
            });
        }
    }
}

pub fn apply_marker_layers(
    mut checks: MessageReader<MarkerLayerCheck>,
    layers: Res<MapLayers>,
    mut sprites: Query<&mut Sprite, With<MapMarker>>,
) {
    for check in checks.read() {
        let Ok(mut sprite) = sprites.get_mut(check.marker) else {
            continue;
        };
        let alpha = layers.status_at(check.height).alpha();
        if sprite.color.alpha() != alpha {
            sprite.color.set_alpha(alpha);
        }
    }
}

pub fn handle_layer_cycle(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    view: Res<MapView>,
    mut layers: ResMut<MapLayers>,
) {
    if !view.visible || !input.just_pressed(bindings.cycle_layer) {
        return;
    }

    layers.cycle();
    match layers.active {
        Some(index) => info!("Map layer: {} of {}", index + 1, layers.bands.len()),
        None => info!("Map layer: base"),
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Collaborator seams: where markers are drawn and how world positions land
//! on the map.

use bevy::prelude::*;

use super::{MarkerCategory, MarkerHandle, MarkerSpec};

/// A map view that owns marker primitives. A marker is drawn on the map that
/// was current when it was created and cannot be moved to another map; after a
/// map switch it has to be removed and created again. Handles stay unique for
/// the lifetime of the surface, so removal works across switches.
pub trait MapSurface {
    /// Map currently drawn; new markers land on it.
    fn map_id(&self) -> &str;

    fn create_marker(&mut self, spec: MarkerSpec) -> MarkerHandle;

    /// Removing an unknown handle is a no-op.
    fn remove_marker(&mut self, handle: MarkerHandle);

    fn markers_in_category(&self, category: MarkerCategory) -> Vec<MarkerHandle>;
}

/// Stateless world-to-map mapping.
pub trait PositionProjector {
    fn world_to_map(&self, world: Vec3) -> Vec2;

    /// Marker rotation in map degrees for an actor facing `yaw_degrees`.
    fn map_rotation(&self, yaw_degrees: f32) -> f32 {
        -yaw_degrees
    }
}

/// Linear projection of the horizontal world plane onto a map image.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct MapProjection {
    pub scale: Vec2,
    pub offset: Vec2,
    pub rotation_degrees: f32,
}

impl MapProjection {
    pub const IDENTITY: MapProjection = MapProjection {
        scale: Vec2::ONE,
        offset: Vec2::ZERO,
        rotation_degrees: 0.0,
    };
}

impl Default for MapProjection {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl PositionProjector for MapProjection {
    fn world_to_map(&self, world: Vec3) -> Vec2 {
        let planar = Vec2::new(world.x, world.z);
        let rotated = Vec2::from_angle(self.rotation_degrees.to_radians()).rotate(planar);
        rotated * self.scale + self.offset
    }

    fn map_rotation(&self, yaw_degrees: f32) -> f32 {
        self.rotation_degrees - yaw_degrees
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec2, b: Vec2) {
        assert!((a - b).length() < 1e-4, "expected {} close to {}", a, b);
    }

    #[test]
    fn identity_drops_height() {
        let map = MapProjection::IDENTITY.world_to_map(Vec3::new(3.0, 50.0, -4.0));
        assert_close(map, Vec2::new(3.0, -4.0));
    }

    #[test]
    fn scale_and_offset_apply_after_rotation() {
        let projection = MapProjection {
            scale: Vec2::splat(2.0),
            offset: Vec2::new(10.0, 0.0),
            rotation_degrees: 90.0,
        };
        let map = projection.world_to_map(Vec3::new(1.0, 0.0, 0.0));
        assert_close(map, Vec2::new(10.0, 2.0));
    }

    #[test]
    fn rotation_negates_yaw_and_adds_map_rotation() {
        assert_eq!(MapProjection::IDENTITY.map_rotation(30.0), -30.0);
        let rotated = MapProjection {
            rotation_degrees: 90.0,
            ..MapProjection::IDENTITY
        };
        assert_eq!(rotated.map_rotation(30.0), 60.0);
    }
}

//! Sprite-backed map surface.

use bevy::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::markers::{MapSurface, MarkerCategory, MarkerHandle, MarkerIcon, MarkerSpec, MotionThrottle};
use crate::plugins::core::MapView;

use super::components::{MapMarker, MapRoot};

pub const MAP_SIZE: f32 = 900.0;
const ASSET_DIR: &str = "assets";

// =============================================================================
// Resources
// =============================================================================

#[derive(Resource, Default)]
pub struct MarkerIcons {
    pub arrow: Handle<Image>,
    pub star: Handle<Image>,
    pub circle: Handle<Image>,
}

impl MarkerIcons {
    pub fn get(&self, icon: MarkerIcon) -> Handle<Image> {
        match icon {
            MarkerIcon::Arrow => self.arrow.clone(),
            MarkerIcon::Star => self.star.clone(),
            MarkerIcon::Circle => self.circle.clone(),
        }
    }
}

/// Handle bookkeeping for the sprite surface. Handles are never reused, so a
/// handle issued on an earlier map still resolves to its entity until removed.
#[derive(Resource, Default)]
pub struct MapCanvas {
    root: Option<Entity>,
    map_id: String,
    next_handle: u64,
    markers: HashMap<MarkerHandle, (Entity, MarkerCategory)>,
}

impl MapCanvas {
    pub fn map_id(&self) -> &str {
        &self.map_id
    }

    pub fn root(&self) -> Option<Entity> {
        self.root
    }

    pub fn marker_entity(&self, handle: MarkerHandle) -> Option<Entity> {
        self.markers.get(&handle).map(|(entity, _)| *entity)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Spawns the root for `map_id` and returns the previous one. The old root
    /// keeps any markers still parented to it until they are removed.
    pub fn switch_map(&mut self, commands: &mut Commands, map_id: &str) -> Option<Entity> {
        let root = commands
            .spawn((
                MapRoot {
                    map_id: map_id.to_string(),
                },
                Sprite {
                    color: Color::srgb(0.09, 0.11, 0.1),
                    custom_size: Some(Vec2::splat(MAP_SIZE)),
                    ..default()
                },
                Transform::default(),
                Visibility::Hidden,
                Name::new(format!("Map {}", map_id)),
            ))
            .id();

        self.map_id = map_id.to_string();
        self.root.replace(root)
    }
}

// =============================================================================
// Surface
// =============================================================================

/// [`MapSurface`] that spawns one sprite per marker under the current map root.
pub struct SpriteSurface<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
    canvas: &'a mut MapCanvas,
    icons: &'a MarkerIcons,
    throttle_window: Duration,
}

impl<'a, 'w, 's> SpriteSurface<'a, 'w, 's> {
    pub fn new(
        commands: &'a mut Commands<'w, 's>,
        canvas: &'a mut MapCanvas,
        icons: &'a MarkerIcons,
        throttle_window: Duration,
    ) -> Self {
        Self {
            commands,
            canvas,
            icons,
            throttle_window,
        }
    }
}

impl MapSurface for SpriteSurface<'_, '_, '_> {
    fn map_id(&self) -> &str {
        &self.canvas.map_id
    }

    fn create_marker(&mut self, spec: MarkerSpec) -> MarkerHandle {
        self.canvas.next_handle += 1;
        let handle = MarkerHandle(self.canvas.next_handle);

        // Zones sit under player arrows.
        let z = if spec.category == MarkerCategory::HotZone {
            1.0
        } else {
            2.0
        };
        let transform = Transform::from_translation(spec.position.extend(z))
            .with_rotation(Quat::from_rotation_z(spec.rotation_degrees.to_radians()))
            .with_scale(Vec3::splat(spec.scale));

        let mut entity = self.commands.spawn((
            MapMarker {
                handle,
                owner: spec.owner,
                category: spec.category,
            },
            Sprite {
                image: self.icons.get(spec.icon),
                color: spec.color,
                custom_size: Some(spec.size),
                ..default()
            },
            transform,
            Name::new(format!("{} {}", spec.category.label(), spec.label)),
        ));
        if let Some(root) = self.canvas.root {
            entity.insert(ChildOf(root));
        }
        if spec.dynamic {
            entity.insert(MotionThrottle::new(self.throttle_window));
        }

        let id = entity.id();
        self.canvas.markers.insert(handle, (id, spec.category));
        handle
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        if let Some((entity, _)) = self.canvas.markers.remove(&handle) {
            self.commands.entity(entity).try_despawn();
        }
    }

    fn markers_in_category(&self, category: MarkerCategory) -> Vec<MarkerHandle> {
        self.canvas
            .markers
            .iter()
            .filter(|(_, (_, marker_category))| *marker_category == category)
            .map(|(handle, _)| *handle)
            .collect()
    }
}

// =============================================================================
// Systems
// =============================================================================

/// Icons without a file under `assets/` fall back to a plain tinted quad.
pub fn load_marker_icons(mut commands: Commands, asset_server: Option<Res<AssetServer>>) {
    let Some(asset_server) = asset_server else {
        commands.init_resource::<MarkerIcons>();
        return;
    };

    let load = |icon: MarkerIcon| -> Handle<Image> {
        if Path::new(ASSET_DIR).join(icon.asset_path()).exists() {
            asset_server.load(icon.asset_path())
        } else {
            debug!("Marker icon {} missing, using plain sprite", icon.asset_path());
            Handle::default()
        }
    };

    commands.insert_resource(MarkerIcons {
        arrow: load(MarkerIcon::Arrow),
        star: load(MarkerIcon::Star),
        circle: load(MarkerIcon::Circle),
    });
}

pub fn sync_map_visibility(
    view: Res<MapView>,
    canvas: Res<MapCanvas>,
    mut roots: Query<(&MapRoot, &mut Visibility)>,
) {
    for (root, mut visibility) in roots.iter_mut() {
        let shown = view.visible && root.map_id == canvas.map_id();
        let target = if shown {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
        if *visibility != target {
            *visibility = target;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

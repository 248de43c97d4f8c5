//! Systems that drive both marker providers from session, map and settings
//! state.

use bevy::prelude::*;
use std::path::Path;

use crate::actors::{Actor, ActorPose, WorldSnapshot};
use crate::markers::{
    HotZoneProvider, MapLayers, MapProjection, PlayerMarkerProvider, SyncContext, WorldEventBus,
};
use crate::plugins::core::{MapCatalog, MapView, SessionPhase};
use crate::settings::{load_settings, KnowledgeLevel, VisibilitySettings, SETTINGS_PATH};

use super::canvas::{MapCanvas, MarkerIcons, SpriteSurface};

pub fn load_overlay_settings(mut commands: Commands) {
    match load_settings(Path::new(SETTINGS_PATH)) {
        Ok(Some(settings)) => {
            info!("Overlay settings: loaded {}", SETTINGS_PATH);
            commands.insert_resource(settings);
        }
        Ok(None) => info!("Overlay settings: {} not found, using defaults", SETTINGS_PATH),
        Err(err) => error!("Overlay settings: {}, using defaults", err),
    }
}

pub fn capture_world_snapshot(
    phase: Res<State<SessionPhase>>,
    actors: Query<(&Actor, &Transform)>,
    mut snapshot: ResMut<WorldSnapshot>,
) {
    let mut next = WorldSnapshot::from_actors(actors.iter().map(|(actor, transform)| {
        let mut actor = actor.clone();
        actor.pose = ActorPose::from_transform(transform);
        actor
    }));
    next.in_session = *phase.get() == SessionPhase::InSession;
    *snapshot = next;
}

/// Starts and stops providers as the session, the map screen and the hot
/// zone toggle change, and moves markers when the viewed map changes.
#[allow(clippy::too_many_arguments)]
pub fn sync_marker_providers(
    mut commands: Commands,
    mut canvas: ResMut<MapCanvas>,
    icons: Res<MarkerIcons>,
    view: Res<MapView>,
    catalog: Res<MapCatalog>,
    mut projection: ResMut<MapProjection>,
    mut layers: ResMut<MapLayers>,
    snapshot: Res<WorldSnapshot>,
    settings: Res<VisibilitySettings>,
    knowledge: Res<KnowledgeLevel>,
    mut bus: ResMut<WorldEventBus>,
    mut players: ResMut<PlayerMarkerProvider>,
    mut zones: ResMut<HotZoneProvider>,
) {
    let switched = canvas.map_id() != view.map_id;
    let mut old_root = None;
    if switched {
        let definition = catalog.get(&view.map_id);
        *projection = definition.map(|map| map.projection).unwrap_or_default();
        *layers = MapLayers {
            bands: definition.map(|map| map.layers.clone()).unwrap_or_default(),
            active: None,
        };
        old_root = canvas.switch_map(&mut commands, &view.map_id);
    }

    let projector: &MapProjection = &projection;
    let ctx = SyncContext {
        snapshot: &snapshot,
        settings: &settings,
        knowledge: *knowledge,
        projector,
    };
    let mut surface =
        SpriteSurface::new(&mut commands, &mut canvas, &icons, settings.motion_throttle());

    if switched {
        players.on_map_switch(&mut surface, ctx);
        zones.on_map_switch(&mut surface, ctx);
    }

    let shown = snapshot.in_session && view.visible;
    let observer_present = snapshot.alive().any(Actor::is_observer);
    match (shown && observer_present, players.is_active()) {
        (true, false) => players.activate(&mut surface, &mut bus, ctx),
        (false, true) => players.deactivate(&mut surface, &mut bus),
        _ => {}
    }

    let zones_shown = shown && settings.hot_zones.enabled;
    if zones_shown && !zones.is_running() {
        zones.on_show(&mut surface, ctx);
    } else if !zones_shown && zones.is_running() {
        if !snapshot.in_session {
            zones.on_session_end(&mut surface);
        } else if !view.visible {
            zones.on_hide(&mut surface);
        } else {
            zones.on_disable(&mut surface);
        }
    }

    if let Some(root) = old_root {
        commands.entity(root).try_despawn();
    }
}

/// Category toggles, thresholds, colors and knowledge gains all reach the
/// player provider through a refresh.
#[allow(clippy::too_many_arguments)]
pub fn apply_visibility_changes(
    mut commands: Commands,
    mut canvas: ResMut<MapCanvas>,
    icons: Res<MarkerIcons>,
    projection: Res<MapProjection>,
    snapshot: Res<WorldSnapshot>,
    settings: Res<VisibilitySettings>,
    knowledge: Res<KnowledgeLevel>,
    mut players: ResMut<PlayerMarkerProvider>,
) {
    if !players.is_active() || !(settings.is_changed() || knowledge.is_changed()) {
        return;
    }

    let ctx = SyncContext {
        snapshot: &snapshot,
        settings: &settings,
        knowledge: *knowledge,
        projector: &*projection,
    };
    let mut surface =
        SpriteSurface::new(&mut commands, &mut canvas, &icons, settings.motion_throttle());
    players.refresh(&mut surface, ctx);
    debug!(
        "Player markers: refreshed, {} tracked at knowledge {}",
        players.registry().len(),
        knowledge.0
    );
}

#[allow(clippy::too_many_arguments)]
pub fn deliver_world_events(
    mut commands: Commands,
    mut canvas: ResMut<MapCanvas>,
    icons: Res<MarkerIcons>,
    projection: Res<MapProjection>,
    snapshot: Res<WorldSnapshot>,
    settings: Res<VisibilitySettings>,
    knowledge: Res<KnowledgeLevel>,
    mut bus: ResMut<WorldEventBus>,
    mut players: ResMut<PlayerMarkerProvider>,
) {
    if !players.is_subscribed() {
        return;
    }

    let ctx = SyncContext {
        snapshot: &snapshot,
        settings: &settings,
        knowledge: *knowledge,
        projector: &*projection,
    };
    let mut surface =
        SpriteSurface::new(&mut commands, &mut canvas, &icons, settings.motion_throttle());
    let delivered = players.pump_events(&mut bus, &mut surface, ctx);
    if delivered > 0 {
        debug!("Player markers: handled {} world events", delivered);
    }
}

#[allow(clippy::too_many_arguments)]
pub fn tick_hot_zones(
    time: Res<Time>,
    mut commands: Commands,
    mut canvas: ResMut<MapCanvas>,
    icons: Res<MarkerIcons>,
    projection: Res<MapProjection>,
    snapshot: Res<WorldSnapshot>,
    settings: Res<VisibilitySettings>,
    knowledge: Res<KnowledgeLevel>,
    mut zones: ResMut<HotZoneProvider>,
) {
    if !zones.is_running() {
        return;
    }

    let ctx = SyncContext {
        snapshot: &snapshot,
        settings: &settings,
        knowledge: *knowledge,
        projector: &*projection,
    };
    let mut surface =
        SpriteSurface::new(&mut commands, &mut canvas, &icons, settings.motion_throttle());
    zones.tick(time.delta(), &mut surface, ctx);
}

// =============================================================================
// Tests
// =============================================================================

use bevy::prelude::*;

use crate::markers::{LayerBand, MapProjection, MarkerCategory};
use crate::settings::{KnowledgeLevel, VisibilitySettings};

pub struct CorePlugin;

/// Providers only run while a session is in progress.
#[derive(States, Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum SessionPhase {
    #[default]
    Lobby,
    InSession,
}

/// Whether the map screen is open and which map it shows.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct MapView {
    pub visible: bool,
    pub map_id: String,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            visible: false,
            map_id: "customs".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MapDefinition {
    pub id: String,
    pub projection: MapProjection,
    pub layers: Vec<LayerBand>,
}

#[derive(Resource, Debug, Clone)]
pub struct MapCatalog {
    maps: Vec<MapDefinition>,
}

impl Default for MapCatalog {
    fn default() -> Self {
        Self {
            maps: vec![
                MapDefinition {
                    id: "customs".to_string(),
                    projection: MapProjection {
                        scale: Vec2::splat(1.5),
                        offset: Vec2::ZERO,
                        rotation_degrees: 0.0,
                    },
                    layers: Vec::new(),
                },
                MapDefinition {
                    id: "interchange".to_string(),
                    projection: MapProjection {
                        scale: Vec2::splat(1.2),
                        offset: Vec2::new(0.0, -40.0),
                        rotation_degrees: 0.0,
                    },
                    layers: vec![
                        LayerBand {
                            floor: -20.0,
                            ceiling: 0.0,
                        },
                        LayerBand {
                            floor: 0.0,
                            ceiling: 8.0,
                        },
                        LayerBand {
                            floor: 8.0,
                            ceiling: 40.0,
                        },
                    ],
                },
                MapDefinition {
                    id: "woods".to_string(),
                    projection: MapProjection {
                        scale: Vec2::splat(1.0),
                        offset: Vec2::ZERO,
                        rotation_degrees: 90.0,
                    },
                    layers: Vec::new(),
                },
            ],
        }
    }
}

impl MapCatalog {
    pub fn get(&self, id: &str) -> Option<&MapDefinition> {
        self.maps.iter().find(|map| map.id == id)
    }

    /// Map after `id` in catalog order, wrapping around. Unknown ids start over
    /// at the first map.
    pub fn next_after(&self, id: &str) -> Option<&MapDefinition> {
        let next = self
            .maps
            .iter()
            .position(|map| map.id == id)
            .map_or(0, |index| (index + 1) % self.maps.len());
        self.maps.get(next)
    }
}

#[derive(Resource, Debug, Clone)]
pub struct InputBindings {
    pub toggle_map: KeyCode,
    pub switch_map: KeyCode,
    pub cycle_layer: KeyCode,
    pub toggle_friendly: KeyCode,
    pub toggle_boss: KeyCode,
    pub toggle_enemy: KeyCode,
    pub toggle_scav: KeyCode,
    pub toggle_hot_zones: KeyCode,
    pub raise_knowledge: KeyCode,
    pub spawn_actor: KeyCode,
    pub kill_actor: KeyCode,
    /// Held to drop a trail of dots at the observer's position
    pub drop_breadcrumb: KeyCode,
    pub start_session: KeyCode,
    pub end_session: KeyCode,
}

impl Default for InputBindings {
    fn default() -> Self {
        Self {
            toggle_map: KeyCode::KeyM,
            switch_map: KeyCode::Tab,
            cycle_layer: KeyCode::KeyL,
            toggle_friendly: KeyCode::Digit1,
            toggle_boss: KeyCode::Digit2,
            toggle_enemy: KeyCode::Digit3,
            toggle_scav: KeyCode::Digit4,
            toggle_hot_zones: KeyCode::Digit5,
            raise_knowledge: KeyCode::KeyI,
            spawn_actor: KeyCode::KeyN,
            kill_actor: KeyCode::KeyK,
            drop_breadcrumb: KeyCode::KeyB,
            start_session: KeyCode::Enter,
            end_session: KeyCode::Escape,
        }
    }
}

impl InputBindings {
    pub fn category_toggles(&self) -> [(KeyCode, MarkerCategory); 5] {
        [
            (self.toggle_friendly, MarkerCategory::Friendly),
            (self.toggle_boss, MarkerCategory::Boss),
            (self.toggle_enemy, MarkerCategory::Enemy),
            (self.toggle_scav, MarkerCategory::Scav),
            (self.toggle_hot_zones, MarkerCategory::HotZone),
        ]
    }
}

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<SessionPhase>()
            .insert_resource(InputBindings::default())
            .init_resource::<MapView>()
            .init_resource::<MapCatalog>()
            .init_resource::<KnowledgeLevel>()
            .init_resource::<VisibilitySettings>()
            .add_systems(OnEnter(SessionPhase::InSession), log_enter_session)
            .add_systems(OnExit(SessionPhase::InSession), log_exit_session)
            .add_systems(
                Update,
                (
                    handle_session_input,
                    handle_map_toggle,
                    handle_map_switch,
                    handle_category_toggles,
                    handle_knowledge_input.run_if(in_state(SessionPhase::InSession)),
                ),
            );
    }
}

fn log_enter_session(view: Res<MapView>) {
    info!("Session: started on {}", view.map_id);
}

fn log_exit_session() {
    info!("Session: ended");
}

fn handle_session_input(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    phase: Res<State<SessionPhase>>,
    mut next_phase: ResMut<NextState<SessionPhase>>,
) {
    match phase.get() {
        SessionPhase::Lobby if input.just_pressed(bindings.start_session) => {
            next_phase.set(SessionPhase::InSession);
        }
        SessionPhase::InSession if input.just_pressed(bindings.end_session) => {
            next_phase.set(SessionPhase::Lobby);
        }
        _ => {}
    }
}

fn handle_map_toggle(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    mut view: ResMut<MapView>,
) {
    if input.just_pressed(bindings.toggle_map) {
        view.visible = !view.visible;
        info!("Map: {}", if view.visible { "open" } else { "closed" });
    }
}

fn handle_map_switch(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    catalog: Res<MapCatalog>,
    mut view: ResMut<MapView>,
) {
    if !input.just_pressed(bindings.switch_map) {
        return;
    }

    if let Some(next) = catalog.next_after(&view.map_id) {
        view.map_id = next.id.clone();
        info!("Map: switched to {}", view.map_id);
    }
}

fn handle_category_toggles(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    mut settings: ResMut<VisibilitySettings>,
) {
    for (key, category) in bindings.category_toggles() {
        if input.just_pressed(key) {
            let enabled = !settings.is_enabled(category);
            settings.set_enabled(category, enabled);
            info!("{} markers: {}", category.label(), if enabled { "on" } else { "off" });
        }
    }
}

fn handle_knowledge_input(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    mut knowledge: ResMut<KnowledgeLevel>,
) {
    if input.just_pressed(bindings.raise_knowledge) {
        let next = knowledge.0 + 1;
        knowledge.raise_to(next);
        info!("Knowledge level: {}", knowledge.0);
    }
}

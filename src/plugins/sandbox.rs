//! Demo world: a handful of actors wandering around the map, driven from the
//! keyboard so every overlay path can be exercised by hand.

use bevy::prelude::*;
use std::f32::consts::TAU;

use crate::actors::{Actor, ActorPose, Faction, Side};
use crate::markers::{ActorEvent, MapProjection, PositionProjector, WorldEventBus};
use crate::plugins::core::{InputBindings, MapView, SessionPhase};
use crate::plugins::overlay::MapCanvas;

pub struct SandboxPlugin;

const OBSERVER_ID: u64 = 1;
const GOLDEN_ANGLE: f32 = 2.399_963;

const BREADCRUMB_INTERVAL_SECS: f32 = 0.25;
const BREADCRUMB_SIZE: f32 = 6.0;

/// Template for a sandbox actor.
#[derive(Debug, Clone, Copy)]
struct Contact {
    name: &'static str,
    faction: Faction,
    grouped: bool,
    tracked_target: bool,
}

impl Contact {
    const fn new(name: &'static str, faction: Faction) -> Self {
        Self {
            name,
            faction,
            grouped: false,
            tracked_target: false,
        }
    }

    const fn grouped(mut self) -> Self {
        self.grouped = true;
        self
    }

    const fn tracked(mut self) -> Self {
        self.tracked_target = true;
        self
    }

    fn to_actor(self, id: u64, name: impl Into<String>) -> Actor {
        let mut actor = Actor::new(id, name, self.faction);
        actor.grouped = self.grouped;
        actor.tracked_target = self.tracked_target;
        actor
    }
}

const OPENING_CAST: [Contact; 9] = [
    Contact::new("Buddy", Faction::HostilePlayer(Side::West)).grouped(),
    Contact::new("Rook", Faction::HostilePlayer(Side::East)),
    Contact::new("Vance", Faction::HostilePlayer(Side::West)),
    Contact::new("Scav 1", Faction::Scavenger),
    Contact::new("Scav 2", Faction::Scavenger),
    Contact::new("Scav 3", Faction::Scavenger),
    Contact::new("Warlord", Faction::Scavenger).tracked(),
    Contact::new("Gunner", Faction::NonCombatShooter),
    Contact::new("Host", Faction::HeadlessHost),
];

const SPAWN_ROTATION: [Contact; 4] = [
    Contact::new("Scav", Faction::Scavenger),
    Contact::new("Bear", Faction::HostilePlayer(Side::East)),
    Contact::new("Usec", Faction::HostilePlayer(Side::West)),
    Contact::new("Boss", Faction::Scavenger).tracked(),
];

/// Circular patrol in the horizontal plane.
#[derive(Component, Debug, Clone, Copy)]
pub struct Wander {
    pub center: Vec2,
    pub radius: f32,
    /// Radians per second; negative runs clockwise
    pub angular_speed: f32,
    pub angle: f32,
    pub height: f32,
}

impl Wander {
    fn for_index(index: u64) -> Self {
        let spread = index as f32 * GOLDEN_ANGLE;
        let distance = 40.0 + (index % 5) as f32 * 30.0;
        let direction = if index % 2 == 0 { 1.0 } else { -1.0 };
        Self {
            center: Vec2::from_angle(spread) * distance,
            radius: 15.0 + (index % 3) as f32 * 10.0,
            angular_speed: direction * (0.3 + (index % 4) as f32 * 0.1),
            angle: spread % TAU,
            height: (index % 3) as f32 * 6.0 - 4.0,
        }
    }

    fn transform(&self) -> Transform {
        let offset = Vec2::from_angle(self.angle) * self.radius;
        let position = self.center + offset;
        // Facing along the direction of travel.
        let heading = self.angle + self.angular_speed.signum() * TAU / 4.0;
        Transform::from_xyz(position.x, self.height, position.y)
            .with_rotation(Quat::from_rotation_y(heading))
    }
}

#[derive(Resource, Debug)]
pub struct SandboxRoster {
    next_id: u64,
}

impl Default for SandboxRoster {
    fn default() -> Self {
        Self {
            next_id: OBSERVER_ID + 1,
        }
    }
}

impl SandboxRoster {
    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Paces dots dropped while the breadcrumb key is held.
#[derive(Resource, Debug)]
pub struct BreadcrumbTrail {
    timer: Timer,
}

impl Default for BreadcrumbTrail {
    fn default() -> Self {
        Self {
            timer: Timer::from_seconds(BREADCRUMB_INTERVAL_SECS, TimerMode::Repeating),
        }
    }
}

/// Dot marking where the observer has been. Lives under the map root it was
/// dropped on and goes away with it.
#[derive(Component, Debug)]
pub struct Breadcrumb;

impl Plugin for SandboxPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SandboxRoster>()
            .init_resource::<BreadcrumbTrail>()
            .add_systems(Startup, setup_camera)
            .add_systems(OnEnter(SessionPhase::InSession), spawn_session_actors)
            .add_systems(OnExit(SessionPhase::InSession), despawn_session_actors)
            .add_systems(
                Update,
                (
                    wander_actors,
                    handle_spawn_input,
                    handle_kill_input,
                    drop_breadcrumbs,
                )
                    .run_if(in_state(SessionPhase::InSession)),
            );
    }
}

fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

fn spawn_actor(commands: &mut Commands, bus: &mut WorldEventBus, mut actor: Actor, wander: Wander) {
    let transform = wander.transform();
    actor.pose = ActorPose::from_transform(&transform);
    bus.publish(ActorEvent::Appeared(actor.clone()));
    let name = Name::new(actor.name.clone());
    commands.spawn((actor, transform, wander, name));
}

fn spawn_session_actors(
    mut commands: Commands,
    mut roster: ResMut<SandboxRoster>,
    mut bus: ResMut<WorldEventBus>,
) {
    *roster = SandboxRoster::default();

    let stroll = Wander::for_index(OBSERVER_ID);
    commands.spawn((
        Actor::new(OBSERVER_ID, "You", Faction::LocalPlayer),
        stroll.transform(),
        stroll,
        Name::new("You"),
    ));

    for contact in OPENING_CAST {
        let id = roster.allocate();
        let actor = contact.to_actor(id, contact.name);
        spawn_actor(&mut commands, &mut bus, actor, Wander::for_index(id));
    }
    info!("Sandbox: spawned {} actors", OPENING_CAST.len() + 1);
}

fn despawn_session_actors(
    mut commands: Commands,
    mut bus: ResMut<WorldEventBus>,
    actors: Query<(Entity, &Actor)>,
) {
    let mut observer = None;
    for (entity, actor) in actors.iter() {
        if actor.is_observer() {
            observer = Some(actor.id);
        } else {
            bus.publish(ActorEvent::Removed(actor.id));
        }
        commands.entity(entity).despawn();
    }
    // The observer leaves last.
    if let Some(id) = observer {
        bus.publish(ActorEvent::Removed(id));
    }
}

fn wander_actors(time: Res<Time>, mut actors: Query<(&Actor, &mut Wander, &mut Transform)>) {
    let delta = time.delta_secs();
    for (actor, mut wander, mut transform) in actors.iter_mut() {
        if !actor.is_active() {
            continue;
        }
        wander.angle = (wander.angle + wander.angular_speed * delta).rem_euclid(TAU);
        *transform = wander.transform();
    }
}

fn handle_spawn_input(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    mut roster: ResMut<SandboxRoster>,
    mut commands: Commands,
    mut bus: ResMut<WorldEventBus>,
) {
    if !input.just_pressed(bindings.spawn_actor) {
        return;
    }

    let id = roster.allocate();
    let contact = SPAWN_ROTATION[id as usize % SPAWN_ROTATION.len()];
    let actor = contact.to_actor(id, format!("{} {}", contact.name, id));
    info!("Sandbox: {} appeared as {:?}", actor.name, contact.faction);
    spawn_actor(&mut commands, &mut bus, actor, Wander::for_index(id));
}

/// Kills the oldest living actor other than the observer.
fn handle_kill_input(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    mut bus: ResMut<WorldEventBus>,
    mut actors: Query<&mut Actor>,
) {
    if !input.just_pressed(bindings.kill_actor) {
        return;
    }

    let victim = actors
        .iter_mut()
        .filter(|actor| actor.is_active() && !actor.is_observer())
        .min_by_key(|actor| actor.id);
    if let Some(mut actor) = victim {
        actor.alive = false;
        actor.has_corpse = true;
        bus.publish(ActorEvent::Died(actor.id));
        info!("Sandbox: {} died", actor.name);
    }
}

/// While the breadcrumb key is held and the map is open, drops a dot at the
/// observer's projected position on press and every interval after.
#[allow(clippy::too_many_arguments)]
fn drop_breadcrumbs(
    time: Res<Time>,
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    view: Res<MapView>,
    canvas: Res<MapCanvas>,
    projection: Res<MapProjection>,
    mut trail: ResMut<BreadcrumbTrail>,
    mut commands: Commands,
    actors: Query<(&Actor, &Transform)>,
) {
    if !view.visible || !input.pressed(bindings.drop_breadcrumb) {
        trail.timer.reset();
        return;
    }
    let Some(root) = canvas.root() else {
        return;
    };

    trail.timer.tick(time.delta());
    if !input.just_pressed(bindings.drop_breadcrumb) && !trail.timer.just_finished() {
        return;
    }
    let Some((_, transform)) = actors.iter().find(|(actor, _)| actor.is_observer()) else {
        return;
    };

    let position = projection.world_to_map(transform.translation);
    commands.spawn((
        Breadcrumb,
        Sprite {
            color: Color::srgb(1.0, 0.85, 0.3),
            custom_size: Some(Vec2::splat(BREADCRUMB_SIZE)),
            ..default()
        },
        Transform::from_translation(position.extend(0.5)),
        ChildOf(root),
        Name::new("Breadcrumb"),
    ));
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::ActorId;
    use bevy::ecs::system::SystemState;
    use std::time::Duration;

    fn sandbox_world() -> (World, crate::markers::Subscription) {
        let mut world = World::default();
        world.insert_resource(ButtonInput::<KeyCode>::default());
        world.insert_resource(InputBindings::default());
        world.init_resource::<SandboxRoster>();
        let mut bus = WorldEventBus::default();
        let subscription = bus.subscribe();
        world.insert_resource(bus);
        (world, subscription)
    }

    fn drain(world: &mut World, subscription: &crate::markers::Subscription) -> Vec<ActorEvent> {
        let mut bus = world.resource_mut::<WorldEventBus>();
        std::iter::from_fn(|| bus.next_event(subscription)).collect()
    }

    #[test]
    fn session_start_spawns_cast_and_announces_it() {
        let (mut world, subscription) = sandbox_world();

        let mut system_state: SystemState<(
            Commands,
            ResMut<SandboxRoster>,
            ResMut<WorldEventBus>,
        )> = SystemState::new(&mut world);
        let (commands, roster, bus) = system_state.get_mut(&mut world);
        spawn_session_actors(commands, roster, bus);
        system_state.apply(&mut world);

        let mut query = world.query::<&Actor>();
        assert_eq!(query.iter(&world).count(), OPENING_CAST.len() + 1);
        let events = drain(&mut world, &subscription);
        assert_eq!(events.len(), OPENING_CAST.len());
        assert!(events
            .iter()
            .all(|event| matches!(event, ActorEvent::Appeared(actor) if !actor.is_observer())));

        // Announced poses match where the actors were spawned.
        let mut spawned = world.query::<(&Actor, &Transform)>();
        for event in &events {
            let ActorEvent::Appeared(announced) = event else {
                continue;
            };
            let placed = spawned
                .iter(&world)
                .find(|(actor, _)| actor.id == announced.id)
                .map(|(_, transform)| transform.translation);
            assert_eq!(placed, Some(announced.pose.position));
            assert_ne!(announced.pose.position, Vec3::ZERO);
        }
    }

    #[test]
    fn opening_cast_carries_overlapping_traits() {
        let buddy = OPENING_CAST[0].to_actor(2, "Buddy");
        let warlord = OPENING_CAST[6].to_actor(8, "Warlord");

        assert!(buddy.grouped);
        assert_eq!(buddy.faction, Faction::HostilePlayer(Side::West));
        assert!(warlord.tracked_target);
        assert_eq!(warlord.faction, Faction::Scavenger);
    }

    fn breadcrumb_world() -> World {
        let (mut world, _subscription) = sandbox_world();
        world.insert_resource(Time::<()>::default());
        world.insert_resource(MapView {
            visible: true,
            ..Default::default()
        });
        world.init_resource::<MapCanvas>();
        world.init_resource::<MapProjection>();
        world.init_resource::<BreadcrumbTrail>();
        world.spawn((
            Actor::new(OBSERVER_ID, "You", Faction::LocalPlayer),
            Transform::from_xyz(10.0, 0.0, 5.0),
        ));

        let mut setup: SystemState<(Commands, ResMut<MapCanvas>)> = SystemState::new(&mut world);
        let (mut commands, mut canvas) = setup.get_mut(&mut world);
        canvas.switch_map(&mut commands, "customs");
        setup.apply(&mut world);
        world
    }

    fn run_breadcrumbs(world: &mut World) {
        let mut system_state: SystemState<(
            Res<Time>,
            Res<ButtonInput<KeyCode>>,
            Res<InputBindings>,
            Res<MapView>,
            Res<MapCanvas>,
            Res<MapProjection>,
            ResMut<BreadcrumbTrail>,
            Commands,
            Query<(&Actor, &Transform)>,
        )> = SystemState::new(world);
        let (time, input, bindings, view, canvas, projection, trail, commands, actors) =
            system_state.get_mut(world);
        drop_breadcrumbs(time, input, bindings, view, canvas, projection, trail, commands, actors);
        system_state.apply(world);
    }

    fn breadcrumbs(world: &mut World) -> Vec<(Vec3, Entity)> {
        let mut query = world.query_filtered::<(&Transform, &ChildOf), With<Breadcrumb>>();
        query
            .iter(world)
            .map(|(transform, parent)| (transform.translation, parent.parent()))
            .collect()
    }

    #[test]
    fn held_breadcrumb_key_drops_dots_at_interval() {
        let mut world = breadcrumb_world();
        world
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::KeyB);

        run_breadcrumbs(&mut world);
        let root = world.resource::<MapCanvas>().root().expect("map root");
        assert_eq!(breadcrumbs(&mut world), vec![(Vec3::new(10.0, 5.0, 0.5), root)]);

        world.resource_mut::<ButtonInput<KeyCode>>().clear();
        world
            .resource_mut::<Time>()
            .advance_by(Duration::from_millis(100));
        run_breadcrumbs(&mut world);
        assert_eq!(breadcrumbs(&mut world).len(), 1);

        world
            .resource_mut::<Time>()
            .advance_by(Duration::from_millis(200));
        run_breadcrumbs(&mut world);
        assert_eq!(breadcrumbs(&mut world).len(), 2);
    }

    #[test]
    fn breadcrumbs_need_an_open_map() {
        let mut world = breadcrumb_world();
        world.resource_mut::<MapView>().visible = false;
        world
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::KeyB);

        run_breadcrumbs(&mut world);

        assert!(breadcrumbs(&mut world).is_empty());
    }

    #[test]
    fn session_end_removes_observer_last() {
        let (mut world, subscription) = sandbox_world();
        world.spawn((Actor::new(OBSERVER_ID, "You", Faction::LocalPlayer), Transform::default()));
        world.spawn((Actor::new(5, "scav", Faction::Scavenger), Transform::default()));

        let mut system_state: SystemState<(
            Commands,
            ResMut<WorldEventBus>,
            Query<(Entity, &Actor)>,
        )> = SystemState::new(&mut world);
        let (commands, bus, actors) = system_state.get_mut(&mut world);
        despawn_session_actors(commands, bus, actors);
        system_state.apply(&mut world);

        let events = drain(&mut world, &subscription);
        assert_eq!(
            events,
            vec![
                ActorEvent::Removed(ActorId(5)),
                ActorEvent::Removed(ActorId(OBSERVER_ID)),
            ]
        );
        let mut query = world.query::<&Actor>();
        assert_eq!(query.iter(&world).count(), 0);
    }

    #[test]
    fn kill_input_marks_oldest_contact_dead() {
        let (mut world, subscription) = sandbox_world();
        world.spawn(Actor::new(OBSERVER_ID, "You", Faction::LocalPlayer));
        world.spawn(Actor::new(4, "scav", Faction::Scavenger));
        world.spawn(Actor::new(3, "east", Faction::HostilePlayer(Side::East)));
        world
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::KeyK);

        let mut system_state: SystemState<(
            Res<ButtonInput<KeyCode>>,
            Res<InputBindings>,
            ResMut<WorldEventBus>,
            Query<&mut Actor>,
        )> = SystemState::new(&mut world);
        let (input, bindings, bus, actors) = system_state.get_mut(&mut world);
        handle_kill_input(input, bindings, bus, actors);
        system_state.apply(&mut world);

        assert_eq!(drain(&mut world, &subscription), vec![ActorEvent::Died(ActorId(3))]);
        let mut query = world.query::<&Actor>();
        let dead = query
            .iter(&world)
            .filter(|actor| !actor.is_active())
            .map(|actor| actor.id)
            .collect::<Vec<_>>();
        assert_eq!(dead, vec![ActorId(3)]);
    }

    #[test]
    fn wandering_moves_only_living_actors() {
        let (mut world, _subscription) = sandbox_world();
        let mut time = Time::<()>::default();
        time.advance_by(Duration::from_secs(1));
        world.insert_resource(time);

        let wander = Wander::for_index(2);
        let start = wander.transform();
        let walker = world
            .spawn((Actor::new(2, "walker", Faction::Scavenger), wander, start))
            .id();
        let mut corpse = Actor::new(3, "corpse", Faction::Scavenger);
        corpse.alive = false;
        let still = world.spawn((corpse, wander, start)).id();

        let mut system_state: SystemState<(
            Res<Time>,
            Query<(&Actor, &mut Wander, &mut Transform)>,
        )> = SystemState::new(&mut world);
        let (time, actors) = system_state.get_mut(&mut world);
        wander_actors(time, actors);
        system_state.apply(&mut world);

        let moved = world.get::<Transform>(walker).map(|t| t.translation);
        let unmoved = world.get::<Transform>(still).map(|t| t.translation);
        assert_ne!(moved, Some(start.translation));
        assert_eq!(unmoved, Some(start.translation));
        assert_eq!(moved.map(|p| p.y), Some(start.translation.y));
    }
}

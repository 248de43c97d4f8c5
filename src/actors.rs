//! World actors as seen by the overlay: identity, faction, liveness and pose.

use bevy::prelude::*;
use std::collections::HashMap;

/// Stable identity of an actor, owned by the world model.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ActorId(pub u64);

/// Sub-faction of a hostile player.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Default)]
pub enum Side {
    #[default]
    East,
    West,
}

/// Who an actor fights for. Group membership and high-value tracking are
/// separate traits on [`Actor`] and can combine with any faction.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Faction {
    /// The observer the map belongs to
    LocalPlayer,
    /// Player of the given sub-faction
    HostilePlayer(Side),
    /// AI-controlled scavenger
    Scavenger,
    /// Mounted turret gunner, never shown
    NonCombatShooter,
    /// Body of a dedicated-server host, never shown
    HeadlessHost,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ActorPose {
    pub position: Vec3,
    /// Facing around the vertical axis, in degrees
    pub yaw_degrees: f32,
}

impl ActorPose {
    pub fn from_transform(transform: &Transform) -> Self {
        let (yaw, _, _) = transform.rotation.to_euler(EulerRot::YXZ);
        Self {
            position: transform.translation,
            yaw_degrees: yaw.to_degrees(),
        }
    }
}

#[derive(Component, Clone, Debug, PartialEq)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub faction: Faction,
    /// In the observer's group
    pub grouped: bool,
    /// Boss or other tracked high-value target
    pub tracked_target: bool,
    pub alive: bool,
    pub has_corpse: bool,
    pub pose: ActorPose,
}

impl Actor {
    pub fn new(id: u64, name: impl Into<String>, faction: Faction) -> Self {
        Self {
            id: ActorId(id),
            name: name.into(),
            faction,
            grouped: false,
            tracked_target: false,
            alive: true,
            has_corpse: false,
            pose: ActorPose::default(),
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.pose.position = position;
        self
    }

    pub fn in_group(mut self) -> Self {
        self.grouped = true;
        self
    }

    pub fn as_tracked_target(mut self) -> Self {
        self.tracked_target = true;
        self
    }

    pub fn is_observer(&self) -> bool {
        self.faction == Faction::LocalPlayer
    }

    /// Alive and not yet a corpse.
    pub fn is_active(&self) -> bool {
        self.alive && !self.has_corpse
    }
}

/// Read-only view of the world model for one frame.
#[derive(Resource, Clone, Debug, Default)]
pub struct WorldSnapshot {
    actors: HashMap<ActorId, Actor>,
    pub in_session: bool,
}

impl WorldSnapshot {
    pub fn from_actors(actors: impl IntoIterator<Item = Actor>) -> Self {
        Self {
            actors: actors.into_iter().map(|actor| (actor.id, actor)).collect(),
            in_session: true,
        }
    }

    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    pub fn insert(&mut self, actor: Actor) {
        self.actors.insert(actor.id, actor);
    }

    pub fn remove(&mut self, id: ActorId) -> Option<Actor> {
        self.actors.remove(&id)
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    pub fn is_alive(&self, id: ActorId) -> bool {
        self.actors.get(&id).is_some_and(Actor::is_active)
    }

    /// Every actor currently in the alive set, observer included.
    pub fn alive(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values().filter(|actor| actor.is_active())
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

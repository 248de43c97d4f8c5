//! Event-driven marker provider for other participants in the session.

use bevy::prelude::*;

use crate::actors::{Actor, ActorId};
use crate::settings::VisibilitySettings;

use super::events::{ActorEvent, Subscription, WorldEventBus};
use super::filter::{classify, PLAYER_MARKER_SIZE};
use super::registry::{MarkerRegistry, TrackedMarker};
use super::{
    MapSurface, MarkerCategory, MarkerSpec, MarkerStyle, Mutation, PositionProjector, SkipReason,
    SyncContext,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum ProviderState {
    #[default]
    Inactive,
    Active,
}

type CategoryFlags = [bool; 4];

fn enabled_flags(settings: &VisibilitySettings) -> CategoryFlags {
    MarkerCategory::PLAYER.map(|category| settings.is_enabled(category))
}

fn player_marker_spec(
    actor: &Actor,
    style: MarkerStyle,
    projector: &dyn PositionProjector,
) -> MarkerSpec {
    MarkerSpec {
        category: style.category,
        label: actor.name.clone(),
        icon: style.icon,
        color: style.color,
        position: projector.world_to_map(actor.pose.position),
        size: PLAYER_MARKER_SIZE,
        rotation_degrees: projector.map_rotation(actor.pose.yaw_degrees),
        scale: 1.0,
        dynamic: true,
        owner: actor.id,
    }
}

/// Keeps one marker per visible participant, driven by appear/remove/death
/// events while active.
#[derive(Resource, Default)]
pub struct PlayerMarkerProvider {
    state: ProviderState,
    registry: MarkerRegistry,
    subscription: Option<Subscription>,
    observer: Option<ActorId>,
    applied_flags: Option<CategoryFlags>,
}

impl PlayerMarkerProvider {
    pub fn state(&self) -> ProviderState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ProviderState::Active
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    pub fn activate(
        &mut self,
        surface: &mut impl MapSurface,
        bus: &mut WorldEventBus,
        ctx: SyncContext,
    ) {
        if !self.is_active() {
            self.state = ProviderState::Active;
            info!("Player markers: active on {}", surface.map_id());
        }

        self.observer = ctx
            .snapshot
            .alive()
            .find(|actor| actor.is_observer())
            .map(|actor| actor.id);
        self.applied_flags = Some(enabled_flags(ctx.settings));

        let added = self.reconcile(surface, ctx);
        let pruned = self.prune_inactive(surface, ctx);
        debug!("Player markers: +{} -{} on activation", added, pruned);

        if self.subscription.is_none() {
            self.subscription = Some(bus.subscribe());
        }
    }

    /// Unsubscribes first, then releases every marker. Safe to call from
    /// inside event delivery and on an inactive provider.
    pub fn deactivate(&mut self, surface: &mut impl MapSurface, bus: &mut WorldEventBus) {
        if let Some(subscription) = self.subscription.take() {
            bus.unsubscribe(subscription);
        }

        let was_active = self.is_active();
        self.state = ProviderState::Inactive;
        self.observer = None;
        self.applied_flags = None;
        let removed = self.registry.clear(surface);

        if was_active {
            info!("Player markers: inactive, released {} markers", removed);
        }
    }

    pub fn on_actor_appeared(
        &mut self,
        actor: &Actor,
        surface: &mut impl MapSurface,
        ctx: SyncContext,
    ) -> Mutation {
        if !self.is_active() {
            return Mutation::Skipped(SkipReason::Inactive);
        }
        if actor.is_observer() {
            return Mutation::Skipped(SkipReason::Observer);
        }
        if self.registry.contains(actor.id) {
            return Mutation::Skipped(SkipReason::AlreadyTracked);
        }
        if !actor.is_active() {
            return Mutation::Skipped(SkipReason::Stale);
        }

        match classify(actor, ctx.settings, ctx.knowledge) {
            Some(style) => self
                .registry
                .track(surface, player_marker_spec(actor, style, ctx.projector)),
            None => Mutation::Skipped(SkipReason::Disqualified),
        }
    }

    pub fn on_actor_died(&mut self, id: ActorId, surface: &mut impl MapSurface) -> Mutation {
        self.registry.untrack(surface, id)
    }

    /// The observer leaving the world ends this provider's session view, so
    /// its removal tears the provider down from inside delivery.
    pub fn on_actor_removed(
        &mut self,
        id: ActorId,
        surface: &mut impl MapSurface,
        bus: &mut WorldEventBus,
    ) -> Mutation {
        if self.observer == Some(id) {
            self.deactivate(surface, bus);
            return Mutation::Applied;
        }
        self.registry.untrack(surface, id)
    }

    /// Delivers queued events one at a time. The subscription is checked
    /// before every delivery, so a handler that deactivates the provider stops
    /// the loop. Returns how many events were handled.
    pub fn pump_events(
        &mut self,
        bus: &mut WorldEventBus,
        surface: &mut impl MapSurface,
        ctx: SyncContext,
    ) -> usize {
        let mut delivered = 0;

        loop {
            let Some(subscription) = self.subscription.as_ref() else {
                break;
            };
            let Some(event) = bus.next_event(subscription) else {
                break;
            };
            delivered += 1;

            match event {
                ActorEvent::Appeared(actor) => {
                    self.on_actor_appeared(&actor, surface, ctx);
                }
                ActorEvent::Removed(id) => {
                    self.on_actor_removed(id, surface, bus);
                }
                ActorEvent::Died(id) => {
                    self.on_actor_died(id, surface);
                }
            }
        }

        delivered
    }

    /// Recreates every tracked marker on the surface's current map. Actors
    /// that vanished from the world are dropped instead.
    pub fn on_map_switch(&mut self, surface: &mut impl MapSurface, ctx: SyncContext) {
        if !self.is_active() {
            return;
        }

        let tracked = self.registry.iter().copied().collect::<Vec<TrackedMarker>>();
        let mut dropped = 0;

        for marker in tracked {
            self.registry.untrack(surface, marker.owner);
            match ctx.snapshot.get(marker.owner).filter(|actor| actor.is_active()) {
                Some(actor) => {
                    self.registry.track(
                        surface,
                        player_marker_spec(actor, marker.style, ctx.projector),
                    );
                }
                None => dropped += 1,
            }
        }

        info!(
            "Player markers: moved {} markers to {} ({} stale)",
            self.registry.len(),
            surface.map_id(),
            dropped
        );
    }

    /// Applies category toggles: a disabled category loses all its markers at
    /// once. Any toggle then reconciles against the whole alive set, since an
    /// actor pruned from one category may still qualify for a later one.
    pub fn apply_settings(&mut self, surface: &mut impl MapSurface, ctx: SyncContext) {
        if !self.is_active() {
            return;
        }

        let flags = enabled_flags(ctx.settings);
        let previous = self.applied_flags.replace(flags).unwrap_or(flags);
        let mut any_changed = false;

        for (index, category) in MarkerCategory::PLAYER.iter().enumerate() {
            if previous[index] && !flags[index] {
                let removed = self
                    .registry
                    .retain(surface, |marker| marker.style.category != *category);
                debug!("Player markers: {} hidden, -{}", category.label(), removed);
            }
            any_changed |= previous[index] != flags[index];
        }

        if any_changed {
            let added = self.reconcile(surface, ctx);
            debug!("Player markers: categories changed, +{}", added);
        }
    }

    /// Re-evaluates every tracked actor after a settings or knowledge change,
    /// then picks up actors that now qualify.
    pub fn refresh(&mut self, surface: &mut impl MapSurface, ctx: SyncContext) {
        if !self.is_active() {
            return;
        }

        self.apply_settings(surface, ctx);

        let tracked = self.registry.iter().copied().collect::<Vec<TrackedMarker>>();
        for marker in tracked {
            let actor = ctx.snapshot.get(marker.owner).filter(|actor| actor.is_active());
            let style = actor.and_then(|actor| classify(actor, ctx.settings, ctx.knowledge));

            match (actor, style) {
                (Some(actor), Some(style)) if style != marker.style => {
                    self.registry.untrack(surface, marker.owner);
                    self.registry
                        .track(surface, player_marker_spec(actor, style, ctx.projector));
                }
                (Some(_), Some(_)) => {}
                _ => {
                    self.registry.untrack(surface, marker.owner);
                }
            }
        }

        self.reconcile(surface, ctx);
    }

    fn reconcile(&mut self, surface: &mut impl MapSurface, ctx: SyncContext) -> usize {
        let mut added = 0;
        for actor in ctx.snapshot.alive() {
            if self.on_actor_appeared(actor, surface, ctx).is_applied() {
                added += 1;
            }
        }
        added
    }

    fn prune_inactive(&mut self, surface: &mut impl MapSurface, ctx: SyncContext) -> usize {
        self.registry
            .retain(surface, |marker| ctx.snapshot.is_alive(marker.owner))
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Polling marker provider for hot zones.

use bevy::prelude::*;
use std::time::Duration;

use super::filter::{hot_zone_style, HOT_ZONE_SIZE};
use super::registry::MarkerRegistry;
use super::{MapSurface, MarkerCategory, MarkerSpec, SyncContext};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// What one poll of the refresh loop asked for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoopStep {
    /// Loop not running.
    Idle,
    /// Between ticks: drop markers whose actor is gone.
    Prune,
    /// Interval elapsed: rebuild every marker.
    Reconcile,
}

/// Single repeating refresh loop. Polled once per frame; however many
/// intervals a frame spans, one poll yields at most one reconcile.
#[derive(Debug)]
pub struct RefreshLoop {
    timer: Timer,
    running: bool,
}

impl RefreshLoop {
    pub fn new(interval: Duration) -> Self {
        Self {
            timer: Timer::new(interval, TimerMode::Repeating),
            running: false,
        }
    }

    /// Starts from a clean timer. Returns `false` if a loop already runs.
    pub fn start(&mut self, interval: Duration) -> bool {
        if self.running {
            return false;
        }
        self.timer = Timer::new(interval, TimerMode::Repeating);
        self.running = true;
        true
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn interval(&self) -> Duration {
        self.timer.duration()
    }

    pub fn poll(&mut self, delta: Duration, interval: Duration) -> LoopStep {
        if !self.running {
            return LoopStep::Idle;
        }

        if self.timer.duration() != interval {
            self.timer.set_duration(interval);
            self.timer.reset();
        }

        self.timer.tick(delta);
        if self.timer.just_finished() {
            LoopStep::Reconcile
        } else {
            LoopStep::Prune
        }
    }
}

impl Default for RefreshLoop {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL)
    }
}

/// Shows a static circle around every potentially hostile actor, rebuilt
/// from the world snapshot on each refresh tick.
#[derive(Resource, Default)]
pub struct HotZoneProvider {
    registry: MarkerRegistry,
    refresh: RefreshLoop,
    reconciliations: u64,
}

impl HotZoneProvider {
    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    pub fn is_running(&self) -> bool {
        self.refresh.is_running()
    }

    pub fn reconciliations(&self) -> u64 {
        self.reconciliations
    }

    /// Starts the loop with an immediate reconciliation. A second call while
    /// running is ignored and returns `false`.
    pub fn on_show(&mut self, surface: &mut impl MapSurface, ctx: SyncContext) -> bool {
        if !self.refresh.start(ctx.settings.refresh_interval()) {
            return false;
        }

        self.reconcile(surface, ctx);
        info!(
            "Hot zones: showing {} zones, refresh every {:.1}s",
            self.registry.len(),
            self.refresh.interval().as_secs_f32()
        );
        true
    }

    pub fn on_hide(&mut self, surface: &mut impl MapSurface) -> usize {
        self.shutdown(surface, "hidden")
    }

    pub fn on_session_end(&mut self, surface: &mut impl MapSurface) -> usize {
        self.shutdown(surface, "session ended")
    }

    pub fn on_disable(&mut self, surface: &mut impl MapSurface) -> usize {
        self.shutdown(surface, "disabled")
    }

    pub fn on_map_switch(&mut self, surface: &mut impl MapSurface, ctx: SyncContext) {
        if !self.refresh.is_running() {
            return;
        }
        self.reconcile(surface, ctx);
        debug!("Hot zones: rebuilt {} zones on {}", self.registry.len(), surface.map_id());
    }

    /// Advances the loop by one frame.
    pub fn tick(
        &mut self,
        delta: Duration,
        surface: &mut impl MapSurface,
        ctx: SyncContext,
    ) -> LoopStep {
        let step = self.refresh.poll(delta, ctx.settings.refresh_interval());
        match step {
            LoopStep::Idle => {}
            LoopStep::Prune => {
                self.prune(surface, ctx);
            }
            LoopStep::Reconcile => self.reconcile(surface, ctx),
        }
        step
    }

    fn shutdown(&mut self, surface: &mut impl MapSurface, reason: &str) -> usize {
        let was_running = self.refresh.is_running();
        self.refresh.stop();
        let removed = self.registry.clear(surface);
        if was_running {
            info!("Hot zones: {}, released {} zones", reason, removed);
        }
        removed
    }

    fn reconcile(&mut self, surface: &mut impl MapSurface, ctx: SyncContext) {
        self.registry.clear(surface);

        let scale = ctx.settings.hot_zones.marker_scale;
        for actor in ctx.snapshot.alive() {
            let Some(style) = hot_zone_style(actor, ctx.settings) else {
                continue;
            };
            self.registry.track(
                surface,
                MarkerSpec {
                    category: MarkerCategory::HotZone,
                    label: MarkerCategory::HotZone.label().to_string(),
                    icon: style.icon,
                    color: style.color,
                    position: ctx.projector.world_to_map(actor.pose.position),
                    size: HOT_ZONE_SIZE,
                    rotation_degrees: 0.0,
                    scale,
                    dynamic: false,
                    owner: actor.id,
                },
            );
        }
        self.reconciliations += 1;
    }

    fn prune(&mut self, surface: &mut impl MapSurface, ctx: SyncContext) -> usize {
        self.registry
            .retain(surface, |marker| ctx.snapshot.is_alive(marker.owner))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::{Actor, ActorId, Faction, Side, WorldSnapshot};
    use crate::markers::testing::{context, RecordingSurface};
    use crate::settings::VisibilitySettings;

    fn zones_enabled() -> VisibilitySettings {
        let mut settings = VisibilitySettings::default();
        settings.hot_zones.enabled = true;
        settings
    }

    fn three_scavs() -> WorldSnapshot {
        WorldSnapshot::from_actors([
            Actor::new(1, "me", Faction::LocalPlayer),
            Actor::new(2, "buddy", Faction::HostilePlayer(Side::West)).in_group(),
            Actor::new(10, "scav a", Faction::Scavenger),
            Actor::new(11, "scav b", Faction::Scavenger),
            Actor::new(12, "scav c", Faction::Scavenger),
        ])
    }

    fn secs(value: f32) -> Duration {
        Duration::from_secs_f32(value)
    }

    #[test]
    fn loop_is_idle_until_started() {
        let mut refresh = RefreshLoop::default();
        assert_eq!(refresh.poll(secs(10.0), DEFAULT_REFRESH_INTERVAL), LoopStep::Idle);
        assert!(refresh.start(DEFAULT_REFRESH_INTERVAL));
        assert!(!refresh.start(DEFAULT_REFRESH_INTERVAL));
        assert_eq!(refresh.poll(secs(1.0), DEFAULT_REFRESH_INTERVAL), LoopStep::Prune);
    }

    #[test]
    fn long_frame_yields_one_reconcile() {
        let mut refresh = RefreshLoop::default();
        refresh.start(DEFAULT_REFRESH_INTERVAL);

        assert_eq!(
            refresh.poll(secs(12.0), DEFAULT_REFRESH_INTERVAL),
            LoopStep::Reconcile
        );
        assert_eq!(refresh.poll(secs(0.5), DEFAULT_REFRESH_INTERVAL), LoopStep::Prune);
    }

    #[test]
    fn interval_change_rearms_timer() {
        let mut refresh = RefreshLoop::default();
        refresh.start(DEFAULT_REFRESH_INTERVAL);
        assert_eq!(refresh.poll(secs(4.0), DEFAULT_REFRESH_INTERVAL), LoopStep::Prune);

        let shorter = secs(2.0);
        assert_eq!(refresh.poll(secs(1.5), shorter), LoopStep::Prune);
        assert_eq!(refresh.interval(), shorter);
        assert_eq!(refresh.poll(secs(0.5), shorter), LoopStep::Reconcile);
    }

    #[test]
    fn dead_scav_disappears_before_next_tick() {
        let mut snapshot = three_scavs();
        let settings = zones_enabled();
        let mut surface = RecordingSurface::named("customs");
        let mut zones = HotZoneProvider::default();

        assert!(zones.on_show(&mut surface, context(&snapshot, &settings, 0)));
        assert_eq!(surface.markers_in_category(MarkerCategory::HotZone).len(), 3);

        zones.tick(secs(2.0), &mut surface, context(&snapshot, &settings, 0));
        if let Some(scav) = snapshot.get_mut(ActorId(11)) {
            scav.alive = false;
        }
        let step = zones.tick(secs(0.1), &mut surface, context(&snapshot, &settings, 0));
        assert_eq!(step, LoopStep::Prune);
        assert_eq!(surface.live.len(), 2);

        let step = zones.tick(secs(2.9), &mut surface, context(&snapshot, &settings, 0));
        assert_eq!(step, LoopStep::Reconcile);
        assert_eq!(surface.live.len(), 2);
        assert!(!zones.registry().contains(ActorId(11)));
        assert_eq!(zones.reconciliations(), 2);
    }

    #[test]
    fn zones_are_static_circles_at_projected_position() {
        let snapshot = WorldSnapshot::from_actors([Actor::new(
            5,
            "west",
            Faction::HostilePlayer(Side::West),
        )
        .with_position(Vec3::new(40.0, 2.0, -8.0))]);
        let mut settings = zones_enabled();
        settings.hot_zones.marker_scale = 1.5;
        let mut surface = RecordingSurface::named("customs");
        let mut zones = HotZoneProvider::default();

        zones.on_show(&mut surface, context(&snapshot, &settings, 0));

        let spec = surface.live.values().next().cloned().expect("one zone");
        assert!(!spec.dynamic);
        assert_eq!(spec.size, HOT_ZONE_SIZE);
        assert_eq!(spec.scale, 1.5);
        assert_eq!(spec.position, Vec2::new(40.0, -8.0));
        assert_eq!(spec.color, settings.hot_zones.enemy_color.to_color());
    }

    #[test]
    fn show_while_running_keeps_single_loop() {
        let snapshot = three_scavs();
        let settings = zones_enabled();
        let mut surface = RecordingSurface::named("customs");
        let mut zones = HotZoneProvider::default();

        assert!(zones.on_show(&mut surface, context(&snapshot, &settings, 0)));
        assert!(!zones.on_show(&mut surface, context(&snapshot, &settings, 0)));

        assert_eq!(zones.reconciliations(), 1);
        assert_eq!(surface.created, 3);
    }

    #[test]
    fn hide_stops_loop_and_show_restarts_clean() {
        let snapshot = three_scavs();
        let settings = zones_enabled();
        let mut surface = RecordingSurface::named("customs");
        let mut zones = HotZoneProvider::default();
        zones.on_show(&mut surface, context(&snapshot, &settings, 0));
        zones.tick(secs(3.0), &mut surface, context(&snapshot, &settings, 0));

        assert_eq!(zones.on_hide(&mut surface), 3);
        assert!(surface.live.is_empty());
        assert_eq!(
            zones.tick(secs(10.0), &mut surface, context(&snapshot, &settings, 0)),
            LoopStep::Idle
        );
        assert!(surface.live.is_empty());

        zones.on_show(&mut surface, context(&snapshot, &settings, 0));
        assert_eq!(surface.live.len(), 3);
        assert_eq!(
            zones.tick(secs(4.9), &mut surface, context(&snapshot, &settings, 0)),
            LoopStep::Prune
        );
        assert_eq!(
            zones.tick(secs(0.1), &mut surface, context(&snapshot, &settings, 0)),
            LoopStep::Reconcile
        );
    }

    #[test]
    fn session_end_and_disable_clear_everything() {
        let snapshot = three_scavs();
        let settings = zones_enabled();
        let mut surface = RecordingSurface::named("customs");
        let mut zones = HotZoneProvider::default();

        zones.on_show(&mut surface, context(&snapshot, &settings, 0));
        assert_eq!(zones.on_session_end(&mut surface), 3);
        assert!(!zones.is_running());

        zones.on_show(&mut surface, context(&snapshot, &settings, 0));
        assert_eq!(zones.on_disable(&mut surface), 3);
        assert!(zones.registry().is_empty());
        assert!(surface.live.is_empty());
    }

    #[test]
    fn map_switch_rebuilds_on_new_map() {
        let snapshot = three_scavs();
        let settings = zones_enabled();
        let mut surface = RecordingSurface::named("customs");
        let mut zones = HotZoneProvider::default();
        zones.on_show(&mut surface, context(&snapshot, &settings, 0));

        surface.map = "interchange".to_string();
        zones.on_map_switch(&mut surface, context(&snapshot, &settings, 0));

        assert_eq!(surface.live.len(), 3);
        assert!(surface.created_on.values().all(|map| map == "interchange"));
    }

    #[test]
    fn unified_colors_paint_every_zone_alike() {
        let snapshot = WorldSnapshot::from_actors([
            Actor::new(1, "scav", Faction::Scavenger),
            Actor::new(2, "east", Faction::HostilePlayer(Side::East)),
            Actor::new(3, "boss", Faction::Scavenger).as_tracked_target(),
        ]);
        let mut settings = zones_enabled();
        settings.hot_zones.unify_colors = true;
        let mut surface = RecordingSurface::named("customs");
        let mut zones = HotZoneProvider::default();

        zones.on_show(&mut surface, context(&snapshot, &settings, 0));

        let boss = settings.hot_zones.boss_color.to_color();
        assert_eq!(surface.live.len(), 3);
        assert!(surface.live.values().all(|spec| spec.color == boss));
    }
}

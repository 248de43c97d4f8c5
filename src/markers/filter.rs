//! Category visibility rules.

use bevy::prelude::*;

use crate::actors::{Actor, Faction, Side};
use crate::settings::{KnowledgeLevel, VisibilitySettings};

use super::{MarkerCategory, MarkerIcon, MarkerStyle};

pub const PLAYER_MARKER_SIZE: Vec2 = Vec2::new(24.0, 24.0);
pub const HOT_ZONE_SIZE: Vec2 = Vec2::new(30.0, 30.0);

/// Decide whether and how a player marker is shown. First match wins, in
/// order: observer, grouped ally, tracked target, hostile player, scav. An
/// actor whose earlier category is disabled or below its knowledge threshold
/// falls through to the next trait it carries.
pub fn classify(
    actor: &Actor,
    settings: &VisibilitySettings,
    knowledge: KnowledgeLevel,
) -> Option<MarkerStyle> {
    let colors = &settings.colors;

    if actor.is_observer() {
        return None;
    }
    if actor.grouped && settings.friendly.allows(knowledge) {
        return Some(MarkerStyle {
            category: MarkerCategory::Friendly,
            color: colors.friendly.to_color(),
            icon: MarkerIcon::Arrow,
        });
    }
    if actor.tracked_target && settings.boss.allows(knowledge) {
        return Some(MarkerStyle {
            category: MarkerCategory::Boss,
            color: colors.boss.to_color(),
            icon: MarkerIcon::Star,
        });
    }

    match actor.faction {
        Faction::HostilePlayer(side) if settings.enemy.allows(knowledge) => {
            let color = match side {
                Side::East => colors.enemy_east,
                Side::West => colors.enemy_west,
            };
            Some(MarkerStyle {
                category: MarkerCategory::Enemy,
                color: color.to_color(),
                icon: MarkerIcon::Arrow,
            })
        }
        Faction::Scavenger if settings.scav.allows(knowledge) => Some(MarkerStyle {
            category: MarkerCategory::Scav,
            color: colors.scav.to_color(),
            icon: MarkerIcon::Arrow,
        }),
        _ => None,
    }
}

/// Hot zones cover every potentially hostile actor, independent of the
/// knowledge level.
pub fn hot_zone_style(actor: &Actor, settings: &VisibilitySettings) -> Option<MarkerStyle> {
    let zones = &settings.hot_zones;
    if !zones.enabled || actor.grouped {
        return None;
    }

    let color = match actor.faction {
        Faction::LocalPlayer | Faction::NonCombatShooter | Faction::HeadlessHost => return None,
        _ if zones.unify_colors || actor.tracked_target => zones.boss_color,
        Faction::HostilePlayer(_) => zones.enemy_color,
        Faction::Scavenger => zones.scav_color,
    };

    Some(MarkerStyle {
        category: MarkerCategory::HotZone,
        color: color.to_color(),
        icon: MarkerIcon::Circle,
    })
}

// =============================================================================
// Tests
// =============================================================================

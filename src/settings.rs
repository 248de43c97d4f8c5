//! Overlay visibility settings and the observer's knowledge level.
//!
//! Settings are owned by whoever edits them (the demo input handlers, a config
//! file); the marker engine only ever reads a snapshot passed in explicitly.

use bevy::prelude::*;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::markers::MarkerCategory;

pub const SETTINGS_PATH: &str = "config/overlay.ron";

const MIN_INTERVAL_SECS: f32 = 0.1;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("read error: {0}")]
    Read(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub fn to_color(self) -> Color {
        Color::srgb(self.0, self.1, self.2)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CategorySettings {
    pub enabled: bool,
    #[serde(default)]
    pub min_knowledge: u32,
}

impl CategorySettings {
    pub fn allows(&self, knowledge: KnowledgeLevel) -> bool {
        self.enabled && knowledge.0 >= self.min_knowledge
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CategoryColors {
    pub friendly: Rgb,
    pub boss: Rgb,
    pub enemy_east: Rgb,
    pub enemy_west: Rgb,
    pub scav: Rgb,
}

impl Default for CategoryColors {
    fn default() -> Self {
        Self {
            friendly: Rgb(0.5, 0.5, 1.0),
            boss: Rgb(0.85, 0.2, 0.85),
            enemy_east: Rgb(0.9, 0.3, 0.25),
            enemy_west: Rgb(0.25, 0.45, 0.9),
            scav: Rgb(0.95, 0.8, 0.3),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HotZoneSettings {
    pub enabled: bool,
    pub refresh_interval_secs: f32,
    pub marker_scale: f32,
    /// Paint every zone with the boss color
    pub unify_colors: bool,
    pub enemy_color: Rgb,
    pub scav_color: Rgb,
    pub boss_color: Rgb,
}

impl Default for HotZoneSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            refresh_interval_secs: 5.0,
            marker_scale: 1.0,
            unify_colors: false,
            enemy_color: Rgb(1.0, 0.0, 0.0),
            scav_color: Rgb(1.0, 0.5, 0.0),
            boss_color: Rgb(1.0, 0.7, 0.0),
        }
    }
}

#[derive(Resource, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VisibilitySettings {
    pub friendly: CategorySettings,
    pub boss: CategorySettings,
    pub enemy: CategorySettings,
    pub scav: CategorySettings,
    pub colors: CategoryColors,
    pub hot_zones: HotZoneSettings,
    /// Minimum seconds between layer lookups per marker
    pub motion_throttle_secs: f32,
}

impl Default for VisibilitySettings {
    fn default() -> Self {
        let hidden = CategorySettings {
            enabled: false,
            min_knowledge: 0,
        };
        Self {
            friendly: CategorySettings {
                enabled: true,
                min_knowledge: 0,
            },
            boss: hidden,
            enemy: hidden,
            scav: hidden,
            colors: CategoryColors::default(),
            hot_zones: HotZoneSettings::default(),
            motion_throttle_secs: 0.5,
        }
    }
}

impl VisibilitySettings {
    pub fn is_enabled(&self, category: MarkerCategory) -> bool {
        match category {
            MarkerCategory::Friendly => self.friendly.enabled,
            MarkerCategory::Boss => self.boss.enabled,
            MarkerCategory::Enemy => self.enemy.enabled,
            MarkerCategory::Scav => self.scav.enabled,
            MarkerCategory::HotZone => self.hot_zones.enabled,
        }
    }

    pub fn set_enabled(&mut self, category: MarkerCategory, enabled: bool) {
        match category {
            MarkerCategory::Friendly => self.friendly.enabled = enabled,
            MarkerCategory::Boss => self.boss.enabled = enabled,
            MarkerCategory::Enemy => self.enemy.enabled = enabled,
            MarkerCategory::Scav => self.scav.enabled = enabled,
            MarkerCategory::HotZone => self.hot_zones.enabled = enabled,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs_f32(self.hot_zones.refresh_interval_secs.max(MIN_INTERVAL_SECS))
    }

    pub fn motion_throttle(&self) -> Duration {
        Duration::from_secs_f32(self.motion_throttle_secs.max(0.0))
    }
}

/// How much the observer currently knows; gates category visibility.
#[derive(Resource, Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct KnowledgeLevel(pub u32);

impl KnowledgeLevel {
    /// Raise to `level`; lower values are ignored. Returns whether it changed.
    pub fn raise_to(&mut self, level: u32) -> bool {
        if level > self.0 {
            self.0 = level;
            true
        } else {
            false
        }
    }
}

pub fn parse_settings(contents: &str) -> Result<VisibilitySettings, SettingsError> {
    Ok(ron::de::from_str::<VisibilitySettings>(contents)?)
}

pub fn load_settings(path: &Path) -> Result<Option<VisibilitySettings>, SettingsError> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)?;
    parse_settings(&contents).map(Some)
}

// =============================================================================
// Tests
// =============================================================================

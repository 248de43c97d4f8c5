//! Tracked actor → marker mapping owned by one provider.

use std::collections::HashMap;

use crate::actors::ActorId;

use super::{MapSurface, MarkerCategory, MarkerHandle, MarkerSpec, MarkerStyle, Mutation, SkipReason};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackedMarker {
    pub handle: MarkerHandle,
    pub owner: ActorId,
    pub style: MarkerStyle,
}

/// At most one marker per actor. Entries are dropped from the map before the
/// marker is destroyed, so nothing can observe an entry whose marker is gone.
#[derive(Debug, Default)]
pub struct MarkerRegistry {
    entries: HashMap<ActorId, TrackedMarker>,
}

impl MarkerRegistry {
    pub fn contains(&self, id: ActorId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn get(&self, id: ActorId) -> Option<&TrackedMarker> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedMarker> {
        self.entries.values()
    }

    /// Tracked ids in ascending order.
    pub fn ids(&self) -> Vec<ActorId> {
        let mut ids = self.entries.keys().copied().collect::<Vec<_>>();
        ids.sort();
        ids
    }

    pub fn count_in(&self, category: MarkerCategory) -> usize {
        self.entries
            .values()
            .filter(|marker| marker.style.category == category)
            .count()
    }

    pub fn track(&mut self, surface: &mut impl MapSurface, spec: MarkerSpec) -> Mutation {
        if self.entries.contains_key(&spec.owner) {
            return Mutation::Skipped(SkipReason::AlreadyTracked);
        }

        let owner = spec.owner;
        let style = MarkerStyle {
            category: spec.category,
            color: spec.color,
            icon: spec.icon,
        };
        let handle = surface.create_marker(spec);
        self.entries.insert(
            owner,
            TrackedMarker {
                handle,
                owner,
                style,
            },
        );
        Mutation::Applied
    }

    pub fn untrack(&mut self, surface: &mut impl MapSurface, id: ActorId) -> Mutation {
        match self.entries.remove(&id) {
            Some(marker) => {
                surface.remove_marker(marker.handle);
                Mutation::Applied
            }
            None => Mutation::Skipped(SkipReason::NotTracked),
        }
    }

    /// Drops every entry `keep` rejects. Returns how many were removed.
    pub fn retain(
        &mut self,
        surface: &mut impl MapSurface,
        mut keep: impl FnMut(&TrackedMarker) -> bool,
    ) -> usize {
        let doomed = self
            .entries
            .values()
            .filter(|marker| !keep(marker))
            .map(|marker| marker.owner)
            .collect::<Vec<_>>();

        for id in &doomed {
            self.untrack(surface, *id);
        }
        doomed.len()
    }

    /// Releases every marker. Returns how many were removed.
    pub fn clear(&mut self, surface: &mut impl MapSurface) -> usize {
        let removed = self.entries.len();
        for (_, marker) in self.entries.drain() {
            surface.remove_marker(marker.handle);
        }
        removed
    }
}

// =============================================================================
// Tests
// =============================================================================

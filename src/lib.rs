//! Marker lifecycle and sync engine for a live map overlay.
//!
//! [`markers`] holds the engine: a push-driven provider for participant
//! markers and a polling provider for hostile hot zones, both drawing through
//! the [`markers::MapSurface`] seam. [`plugins`] wires the engine into Bevy.

pub mod actors;
pub mod markers;
pub mod plugins;
pub mod settings;

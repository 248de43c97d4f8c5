pub mod core;
pub mod overlay;
pub mod sandbox;

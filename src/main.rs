use bevy::prelude::*;

use radar_overlay::plugins;

fn main() {
    App::new()
        .insert_resource(ClearColor(Color::srgb(0.05, 0.07, 0.06)))
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Radar Overlay".to_string(),
                resolution: (1280u32, 720u32).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins((
            plugins::core::CorePlugin,
            plugins::overlay::OverlayPlugin,
            plugins::sandbox::SandboxPlugin,
        ))
        .run();
}

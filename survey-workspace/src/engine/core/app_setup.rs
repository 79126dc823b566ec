use crate::engine::assets::imagery_document::ImageryDocument;
use crate::engine::assets::tileset_document::TilesetDocument;
use crate::engine::assets::vector_document::VectorDocument;
use crate::engine::core::config::WorkspaceConfig;
use crate::engine::core::window_config::create_window_config;
use crate::error::WorkspaceError;
use crate::rpc::web_rpc::WebRpcPlugin;
use crate::workspace::orchestrator::Workspace;
use crate::workspace::plugin::{WorkspacePlugin, WorkspaceState};
use bevy::asset::AssetMetaCheck;
use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;

pub fn create_app(config: WorkspaceConfig) -> Result<App, WorkspaceError> {
    let workspace = Workspace::new(config.clone())?;
    let mut app = App::new();

    app.add_plugins(create_default_plugins(&config))
        // Layer documents are all JSON; loaders are picked by the requested asset type.
        .add_plugins(JsonAssetPlugin::<VectorDocument>::new(&["geojson"]))
        .add_plugins(JsonAssetPlugin::<TilesetDocument>::new(&["tileset.json", "json"]))
        .add_plugins(JsonAssetPlugin::<ImageryDocument>::new(&["tilejson.json", "json"]))
        .add_plugins(WebRpcPlugin)
        .insert_resource(config)
        .insert_resource(WorkspaceState(workspace))
        .add_plugins(WorkspacePlugin)
        .add_systems(Startup, setup);

    Ok(app)
}

fn setup(mut commands: Commands) {
    spawn_lighting(&mut commands);
    spawn_camera(&mut commands);
}

fn spawn_lighting(commands: &mut Commands) {
    commands.spawn((
        DirectionalLight {
            shadows_enabled: false,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::ZYX,
            0.0,
            1.0,
            -std::f32::consts::FRAC_PI_4,
        )),
    ));
}

fn spawn_camera(commands: &mut Commands) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 60.0, 60.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn create_default_plugins(config: &WorkspaceConfig) -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config(&config.canvas)),
        ..default()
    };

    let mut asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };
    if !config.api_base_url.is_empty() {
        asset_config.file_path = config.api_base_url.clone();
    }

    DefaultPlugins.set(window_config).set(asset_config)
}

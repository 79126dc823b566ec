use crate::engine::assets::imagery_document::ImageryDocument;
use crate::engine::assets::tileset_document::TilesetDocument;
use crate::engine::assets::vector_document::VectorDocument;
use crate::engine::core::config::WorkspaceConfig;
use crate::engine::loading::resource_source::{
    LayerKind, LayerResource, LoadStatus, RequestId, ResourceRequest, ResourceSource,
};
use bevy::asset::LoadState;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use std::collections::HashMap;

enum RequestedAsset {
    Vector(Handle<VectorDocument>),
    Raster(Handle<ImageryDocument>),
    Mesh(Handle<TilesetDocument>),
}

/// Strong handles for every layer document still being waited on.
#[derive(Resource, Default)]
pub struct AssetRequests {
    next_id: u64,
    handles: HashMap<RequestId, RequestedAsset>,
}

/// Loads layer documents through the asset server. Each document type is registered as
/// a JSON asset, so parsing happens on the asset task pool.
///
/// The asset root is the configured API base URL, so request paths are loaded relative
/// to it.
#[derive(SystemParam)]
pub struct AssetResourceSource<'w> {
    asset_server: Res<'w, AssetServer>,
    config: Res<'w, WorkspaceConfig>,
    requests: ResMut<'w, AssetRequests>,
    vectors: Res<'w, Assets<VectorDocument>>,
    imagery: Res<'w, Assets<ImageryDocument>>,
    tilesets: Res<'w, Assets<TilesetDocument>>,
}

fn asset_path(api_base_url: &str, path: &str) -> String {
    let base = api_base_url.trim_end_matches('/');
    path.strip_prefix(base)
        .unwrap_or(path)
        .trim_start_matches('/')
        .to_string()
}

impl ResourceSource for AssetResourceSource<'_> {
    fn request(&mut self, request: &ResourceRequest) -> RequestId {
        let path = asset_path(&self.config.api_base_url, &request.path);
        let asset = match request.kind {
            LayerKind::Vector => RequestedAsset::Vector(self.asset_server.load(path)),
            LayerKind::Raster => RequestedAsset::Raster(self.asset_server.load(path)),
            LayerKind::Mesh => RequestedAsset::Mesh(self.asset_server.load(path)),
        };

        self.requests.next_id += 1;
        let id = RequestId(self.requests.next_id);
        self.requests.handles.insert(id, asset);
        id
    }

    fn poll(&mut self, id: RequestId) -> LoadStatus {
        let Some(requested) = self.requests.handles.get(&id) else {
            return LoadStatus::Failed(format!("request {} is not in flight", id.0));
        };

        let state = match requested {
            RequestedAsset::Vector(handle) => self.asset_server.get_load_state(handle),
            RequestedAsset::Raster(handle) => self.asset_server.get_load_state(handle),
            RequestedAsset::Mesh(handle) => self.asset_server.get_load_state(handle),
        };

        let status = match state {
            Some(LoadState::Loaded) => {
                let resource = match requested {
                    RequestedAsset::Vector(handle) => {
                        self.vectors.get(handle).cloned().map(LayerResource::Vector)
                    }
                    RequestedAsset::Raster(handle) => {
                        self.imagery.get(handle).cloned().map(LayerResource::Raster)
                    }
                    RequestedAsset::Mesh(handle) => {
                        self.tilesets.get(handle).cloned().map(LayerResource::Mesh)
                    }
                };
                match resource {
                    Some(resource) => LoadStatus::Loaded(resource),
                    // Loaded but not yet inserted into its Assets collection.
                    None => return LoadStatus::Pending,
                }
            }
            Some(LoadState::Failed(error)) => LoadStatus::Failed(error.to_string()),
            _ => return LoadStatus::Pending,
        };

        self.requests.handles.remove(&id);
        status
    }

    fn release(&mut self, id: RequestId) {
        self.requests.handles.remove(&id);
    }
}

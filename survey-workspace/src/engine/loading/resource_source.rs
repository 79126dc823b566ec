use crate::engine::assets::imagery_document::ImageryDocument;
use crate::engine::assets::tileset_document::TilesetDocument;
use crate::engine::assets::vector_document::VectorDocument;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three layer kinds an iteration can provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Vector,
    Raster,
    Mesh,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vector => "vector",
            Self::Raster => "raster",
            Self::Mesh => "mesh",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

/// A document to fetch for one layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub kind: LayerKind,
    pub path: String,
}

/// A fetched and parsed layer document.
#[derive(Debug, Clone)]
pub enum LayerResource {
    Vector(VectorDocument),
    Raster(ImageryDocument),
    Mesh(TilesetDocument),
}

impl LayerResource {
    pub fn kind(&self) -> LayerKind {
        match self {
            Self::Vector(_) => LayerKind::Vector,
            Self::Raster(_) => LayerKind::Raster,
            Self::Mesh(_) => LayerKind::Mesh,
        }
    }
}

#[derive(Debug, Clone)]
pub enum LoadStatus {
    Pending,
    Loaded(LayerResource),
    Failed(String),
}

/// Asynchronous document loading, polled once per frame.
pub trait ResourceSource {
    fn request(&mut self, request: &ResourceRequest) -> RequestId;

    fn poll(&mut self, id: RequestId) -> LoadStatus;

    /// Drop interest in a request. Later polls of the id report failure.
    fn release(&mut self, id: RequestId);
}

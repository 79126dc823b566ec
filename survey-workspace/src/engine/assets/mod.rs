/// Axis-aligned survey extents and the bounding volumes layers publish.
pub mod bounds;
/// 2D raster imagery description (TileJSON).
pub mod imagery_document;
/// Iteration records listed by the project service.
pub mod iteration;
/// 3D mesh tileset description (3D Tiles).
pub mod tileset_document;
/// GeoJSON feature collections.
pub mod vector_document;

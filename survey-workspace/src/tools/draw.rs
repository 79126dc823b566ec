use crate::engine::scene::adapter::SceneAdapter;
use crate::engine::scene::entity::{
    EntityHandle, EntitySpec, Geometry, ScreenPoint, SurfaceMaterial,
};
use crate::geometry::{WorldPoint, is_valid_vertex_list, planar_area, polyline_length};
use constants::render_settings::{
    DRAW_LINE_COLOUR, DRAW_LINE_WIDTH, DRAW_POLYGON_FILL, MARKER_COLOUR, MARKER_PIXEL_SIZE,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Line,
    Polygon,
}

/// A line or polygon the user committed with the finalize action.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedShape {
    pub id: u64,
    pub kind: ShapeKind,
    pub vertices: Vec<WorldPoint>,
}

impl FinalizedShape {
    pub fn to_json(&self) -> serde_json::Value {
        let vertices: Vec<[f64; 3]> = self.vertices.iter().map(|v| v.to_array()).collect();
        let mut json = serde_json::json!({
            "id": self.id,
            "kind": self.kind,
            "vertices": vertices,
        });
        match self.kind {
            ShapeKind::Line => json["length"] = polyline_length(&self.vertices).into(),
            ShapeKind::Polygon => json["area"] = planar_area(&self.vertices).into(),
        }
        json
    }
}

/// Vertex list the preview shows: every committed vertex, then the floating one.
pub fn render_geometry(
    kind: ShapeKind,
    committed: &[WorldPoint],
    floating: Option<WorldPoint>,
) -> Geometry {
    let vertices: Vec<WorldPoint> = committed.iter().copied().chain(floating).collect();
    match kind {
        ShapeKind::Line => Geometry::Polyline(vertices),
        ShapeKind::Polygon => Geometry::Polygon(vertices),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawStep {
    VertexAdded(WorldPoint),
    PreviewMoved(WorldPoint),
    /// Committed vertices, for the caller to record.
    Finalized(Vec<WorldPoint>),
    /// Finalize with too few vertices; nothing persisted.
    Discarded,
    Ignored,
}

/// Click-by-click line or polygon capture with a rubber-band preview.
#[derive(Debug)]
pub struct DrawSession {
    kind: ShapeKind,
    committed_vertices: Vec<WorldPoint>,
    /// Follows the pointer; never part of a finalised shape.
    floating_vertex: Option<WorldPoint>,
    preview_entity: Option<EntityHandle>,
    vertex_markers: Vec<EntityHandle>,
    /// Persisted shape entities from this session.
    finalized: Vec<EntityHandle>,
}

impl DrawSession {
    pub fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            committed_vertices: Vec::new(),
            floating_vertex: None,
            preview_entity: None,
            vertex_markers: Vec::new(),
            finalized: Vec::new(),
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn committed_vertices(&self) -> &[WorldPoint] {
        &self.committed_vertices
    }

    pub fn floating_vertex(&self) -> Option<WorldPoint> {
        self.floating_vertex
    }

    pub fn has_preview(&self) -> bool {
        self.preview_entity.is_some()
    }

    pub fn geometry(&self) -> Geometry {
        render_geometry(self.kind, &self.committed_vertices, self.floating_vertex)
    }

    pub fn primary(&mut self, scene: &mut dyn SceneAdapter, point: ScreenPoint) -> DrawStep {
        let Some(position) = scene.project_to_world(point) else {
            return DrawStep::Ignored;
        };

        self.committed_vertices.push(position);
        self.floating_vertex = Some(position);
        self.vertex_markers.push(scene.add_entity(EntitySpec::Marker {
            position,
            colour: MARKER_COLOUR,
            pixel_size: MARKER_PIXEL_SIZE,
        }));
        self.refresh_preview(scene);

        DrawStep::VertexAdded(position)
    }

    pub fn pointer_move(&mut self, scene: &mut dyn SceneAdapter, point: ScreenPoint) -> DrawStep {
        if self.committed_vertices.is_empty() {
            return DrawStep::Ignored;
        }
        let Some(position) = scene.project_to_world(point) else {
            return DrawStep::Ignored;
        };

        self.floating_vertex = Some(position);
        self.refresh_preview(scene);
        DrawStep::PreviewMoved(position)
    }

    /// End the current shape. The floating vertex is dropped, and what was clicked is
    /// persisted when it forms a valid shape.
    pub fn finalize(&mut self, scene: &mut dyn SceneAdapter) -> DrawStep {
        if self.committed_vertices.is_empty() && self.preview_entity.is_none() {
            return DrawStep::Ignored;
        }

        self.floating_vertex = None;
        let vertices = std::mem::take(&mut self.committed_vertices);
        self.clear_live(scene);

        if !is_valid_vertex_list(&vertices) {
            return DrawStep::Discarded;
        }

        let spec = match self.kind {
            ShapeKind::Line => EntitySpec::Polyline {
                positions: vertices.clone(),
                colour: DRAW_LINE_COLOUR,
                width: DRAW_LINE_WIDTH,
            },
            ShapeKind::Polygon => EntitySpec::Polygon {
                hierarchy: vertices.clone(),
                material: SurfaceMaterial::solid(DRAW_POLYGON_FILL),
            },
        };
        self.finalized.push(scene.add_entity(spec));

        DrawStep::Finalized(vertices)
    }

    pub fn clear_finalized(&mut self, scene: &mut dyn SceneAdapter) {
        for handle in self.finalized.drain(..) {
            scene.remove_entity(handle);
        }
    }

    pub fn teardown(&mut self, scene: &mut dyn SceneAdapter) {
        self.committed_vertices.clear();
        self.floating_vertex = None;
        self.clear_live(scene);
        self.clear_finalized(scene);
    }

    fn refresh_preview(&mut self, scene: &mut dyn SceneAdapter) {
        let geometry = self.geometry();
        match self.preview_entity {
            Some(preview) => scene.set_geometry(preview, geometry),
            None => {
                let spec = match geometry {
                    Geometry::Polygon(hierarchy) => EntitySpec::Polygon {
                        hierarchy,
                        material: SurfaceMaterial::solid(DRAW_POLYGON_FILL),
                    },
                    other => EntitySpec::Polyline {
                        positions: other.vertices().to_vec(),
                        colour: DRAW_LINE_COLOUR,
                        width: DRAW_LINE_WIDTH,
                    },
                };
                self.preview_entity = Some(scene.add_entity(spec));
            }
        }
    }

    fn clear_live(&mut self, scene: &mut dyn SceneAdapter) {
        if let Some(preview) = self.preview_entity.take() {
            scene.remove_entity(preview);
        }
        for marker in self.vertex_markers.drain(..) {
            scene.remove_entity(marker);
        }
    }
}

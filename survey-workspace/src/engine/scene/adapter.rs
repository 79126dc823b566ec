use crate::engine::assets::bounds::BoundsData;
use crate::engine::scene::entity::{
    EntityHandle, EntitySpec, Geometry, PropertyBag, ScreenPoint, SurfaceMaterial,
};
use crate::geometry::WorldPoint;

/// DOM container (or window) a scene renders into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneContainer {
    pub id: String,
}

impl SceneContainer {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Where a camera flight should end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraTarget {
    /// Frame an extent from an oblique angle.
    Bounds(BoundsData),
    /// Look straight down (heading 0, pitch -90 degrees) at a bounding sphere.
    TopDown { center: WorldPoint, radius: f64 },
}

/// The narrow renderer surface the workspace is written against.
///
/// Handles returned by [`SceneAdapter::add_entity`] stay valid until removed or until the
/// scene is destroyed. Calls that name an unknown handle are ignored.
pub trait SceneAdapter {
    fn create(&mut self, container: &SceneContainer);

    /// Releases every entity and the camera state.
    fn destroy(&mut self);

    fn is_live(&self) -> bool;

    fn add_entity(&mut self, spec: EntitySpec) -> EntityHandle;

    fn remove_entity(&mut self, handle: EntityHandle);

    fn set_geometry(&mut self, handle: EntityHandle, geometry: Geometry);

    fn set_visible(&mut self, handle: EntityHandle, visible: bool);

    fn material(&self, handle: EntityHandle) -> Option<SurfaceMaterial>;

    fn set_material(&mut self, handle: EntityHandle, material: SurfaceMaterial);

    /// Attributes of a pickable feature.
    fn properties(&self, handle: EntityHandle) -> Option<PropertyBag>;

    /// Topmost pickable feature under the pointer.
    fn pick_at(&self, point: ScreenPoint) -> Option<EntityHandle>;

    /// World position under the pointer, `None` over empty sky.
    fn project_to_world(&self, point: ScreenPoint) -> Option<WorldPoint>;

    fn fly_to(&mut self, target: CameraTarget, duration_secs: f32);
}

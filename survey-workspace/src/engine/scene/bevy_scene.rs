//! Bevy realisation of [`SceneAdapter`].
//!
//! Survey coordinates are shifted by a per-scene origin (the first entity's position) and
//! rotated into Bevy's Y-up frame, so render-space `f32` precision stays local to the site.
//! Markers are spheres, lines are line strips, polygons are fan-triangulated fills and
//! labels are absolutely positioned UI text tracked by [`WorldLabel`].

use crate::engine::assets::bounds::BoundsData;
use crate::engine::camera::viewport_camera::{CameraPose, ViewportCamera};
use crate::engine::scene::adapter::{CameraTarget, SceneAdapter, SceneContainer};
use crate::engine::scene::entity::{
    EntityHandle, EntityKind, EntitySpec, Geometry, PropertyBag, ScreenPoint, SurfaceMaterial,
};
use crate::engine::scene::labels::WorldLabel;
use crate::engine::scene::ray::{
    distance_to_segment_xz, point_in_polygon_xz, ray_aabb_hit_t, ray_plane_y,
};
use crate::geometry::WorldPoint;
use bevy::asset::RenderAssetUsages;
use bevy::ecs::system::SystemParam;
use bevy::math::DVec3;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use constants::coordinate_system::{inverse_transform_coordinates, transform_coordinates};
use constants::render_settings::{
    IMAGERY_TINT, MARKER_WORLD_SCALE, PICK_SLAB_HALF_THICKNESS, TILESET_PROXY_COLOUR,
};
use std::collections::HashMap;

/// Tags every Bevy entity that belongs to the workspace scene.
#[derive(Component)]
pub struct SceneMember {
    pub handle: EntityHandle,
}

struct SceneRecord {
    entity: Entity,
    kind: EntityKind,
    geometry: Option<Geometry>,
    material: Option<SurfaceMaterial>,
    material_handle: Option<Handle<StandardMaterial>>,
    properties: Option<PropertyBag>,
    label_offset: Vec2,
    visible: bool,
}

/// Book-keeping shared by every [`BevyScene`] borrow.
#[derive(Resource, Default)]
pub struct SceneRegistry {
    container: Option<SceneContainer>,
    next_handle: u64,
    origin: Option<DVec3>,
    extent: Option<BoundsData>,
    records: HashMap<EntityHandle, SceneRecord>,
}

impl SceneRegistry {
    fn to_render(&self, p: WorldPoint) -> Vec3 {
        let local = p - self.origin.unwrap_or(DVec3::ZERO);
        let (x, y, z) = transform_coordinates(local.x, local.y, local.z);
        Vec3::new(x as f32, y as f32, z as f32)
    }

    fn to_world(&self, v: Vec3) -> WorldPoint {
        let (x, y, z) = inverse_transform_coordinates(v.x as f64, v.y as f64, v.z as f64);
        DVec3::new(x, y, z) + self.origin.unwrap_or(DVec3::ZERO)
    }

    fn grow_extent(&mut self, bounds: Option<BoundsData>) {
        if let Some(bounds) = bounds {
            self.extent = Some(match self.extent {
                Some(extent) => extent.union(&bounds),
                None => bounds,
            });
        }
    }
}

#[derive(SystemParam)]
pub struct BevyScene<'w, 's> {
    commands: Commands<'w, 's>,
    meshes: ResMut<'w, Assets<Mesh>>,
    materials: ResMut<'w, Assets<StandardMaterial>>,
    registry: ResMut<'w, SceneRegistry>,
    viewport_camera: ResMut<'w, ViewportCamera>,
    cameras: Query<'w, 's, (&'static Camera, &'static GlobalTransform), With<Camera3d>>,
}

impl BevyScene<'_, '_> {
    fn pointer_ray(&self, point: ScreenPoint) -> Option<Ray3d> {
        let (camera, camera_transform) = self.cameras.single().ok()?;
        camera.viewport_to_world(camera_transform, point).ok()
    }

    fn render_points(&self, points: &[WorldPoint]) -> Vec<Vec3> {
        points.iter().map(|p| self.registry.to_render(*p)).collect()
    }

    fn geometry_mesh(&self, geometry: &Geometry, marker_radius: f32) -> Mesh {
        match geometry {
            Geometry::Point(_) => Sphere::new(marker_radius).mesh().build(),
            Geometry::Polyline(points) => line_mesh(&self.render_points(points)),
            Geometry::Polygon(points) => fill_mesh(&self.render_points(points)),
        }
    }

    // Points are drawn as spheres positioned by their transform, everything else is
    // meshed directly in render space.
    fn geometry_transform(&self, geometry: &Geometry) -> Transform {
        match geometry {
            Geometry::Point(p) => Transform::from_translation(self.registry.to_render(*p)),
            _ => Transform::IDENTITY,
        }
    }

    fn spawn_mesh(
        &mut self,
        mesh: Mesh,
        material: SurfaceMaterial,
        transform: Transform,
        handle: EntityHandle,
    ) -> (Entity, Handle<StandardMaterial>) {
        let mesh = self.meshes.add(mesh);
        let material_handle = self.materials.add(standard_material(material));
        let entity = self
            .commands
            .spawn((
                Mesh3d(mesh),
                MeshMaterial3d(material_handle.clone()),
                transform,
                SceneMember { handle },
            ))
            .id();
        (entity, material_handle)
    }

    fn spawn_spec(
        &mut self,
        spec: &EntitySpec,
        handle: EntityHandle,
    ) -> (Entity, Option<Handle<StandardMaterial>>, Vec2) {
        match spec {
            EntitySpec::Marker {
                position,
                colour,
                pixel_size,
            } => {
                let mesh = Sphere::new(pixel_size * MARKER_WORLD_SCALE).mesh().build();
                let transform = Transform::from_translation(self.registry.to_render(*position));
                let (entity, material) =
                    self.spawn_mesh(mesh, SurfaceMaterial::solid(*colour), transform, handle);
                (entity, Some(material), Vec2::ZERO)
            }
            EntitySpec::Polyline {
                positions, colour, ..
            } => {
                let mesh = line_mesh(&self.render_points(positions));
                let (entity, material) = self.spawn_mesh(
                    mesh,
                    SurfaceMaterial::solid(*colour),
                    Transform::IDENTITY,
                    handle,
                );
                (entity, Some(material), Vec2::ZERO)
            }
            EntitySpec::Polygon {
                hierarchy,
                material,
            } => {
                let mesh = fill_mesh(&self.render_points(hierarchy));
                let (entity, material) =
                    self.spawn_mesh(mesh, *material, Transform::IDENTITY, handle);
                (entity, Some(material), Vec2::ZERO)
            }
            EntitySpec::Feature {
                geometry, material, ..
            } => {
                let mesh = self.geometry_mesh(geometry, MARKER_WORLD_SCALE * 5.0);
                let transform = self.geometry_transform(geometry);
                let (entity, material) = self.spawn_mesh(mesh, *material, transform, handle);
                (entity, Some(material), Vec2::ZERO)
            }
            EntitySpec::Label {
                position,
                text,
                colour,
                font_size,
                pixel_offset,
            } => {
                let anchor = self.registry.to_render(*position);
                let entity = self
                    .commands
                    .spawn((
                        Text::new(text.clone()),
                        TextFont {
                            font_size: *font_size,
                            ..default()
                        },
                        TextColor(*colour),
                        Node {
                            position_type: PositionType::Absolute,
                            display: Display::None,
                            ..default()
                        },
                        WorldLabel {
                            anchor,
                            pixel_offset: *pixel_offset,
                        },
                        SceneMember { handle },
                    ))
                    .id();
                (entity, None, *pixel_offset)
            }
            EntitySpec::Imagery { bounds, .. } => {
                let Some(raster) = bounds else {
                    // Nothing to place without an extent.
                    let entity = self
                        .commands
                        .spawn((Transform::IDENTITY, Visibility::Hidden, SceneMember { handle }))
                        .id();
                    return (entity, None, Vec2::ZERO);
                };
                let flat = raster.to_bounds(self.registry.extent.map_or(0.0, |e| e.ground_height()));
                let size = flat.size();
                let mesh = Plane3d::default()
                    .mesh()
                    .size(size.x as f32, size.y as f32)
                    .build();
                let transform = Transform::from_translation(self.registry.to_render(flat.center()));
                let (entity, material) = self.spawn_mesh(
                    mesh,
                    SurfaceMaterial::solid(IMAGERY_TINT),
                    transform,
                    handle,
                );
                (entity, Some(material), Vec2::ZERO)
            }
            EntitySpec::Tileset {
                bounding_volume, ..
            } => {
                let mesh = Sphere::new(bounding_volume.radius as f32).mesh().ico(3).unwrap_or_else(
                    |_| Sphere::new(bounding_volume.radius as f32).mesh().build(),
                );
                let transform =
                    Transform::from_translation(self.registry.to_render(bounding_volume.center));
                let (entity, material) = self.spawn_mesh(
                    mesh,
                    SurfaceMaterial::solid(TILESET_PROXY_COLOUR),
                    transform,
                    handle,
                );
                (entity, Some(material), Vec2::ZERO)
            }
        }
    }

    /// Distance along the pointer ray at which a feature is hit.
    fn feature_hit(&self, ray: Ray3d, geometry: &Geometry) -> Option<f32> {
        let points = self.render_points(geometry.vertices());
        let padding = Vec3::splat(PICK_SLAB_HALF_THICKNESS);
        let min = points.iter().fold(Vec3::INFINITY, |acc, p| acc.min(*p)) - padding;
        let max = points.iter().fold(Vec3::NEG_INFINITY, |acc, p| acc.max(*p)) + padding;
        let direction = *ray.direction;
        let t = ray_aabb_hit_t(ray.origin, direction, min, max)?;

        let mean_height = points.iter().map(|p| p.y).sum::<f32>() / points.len() as f32;
        let flat = |p: Vec3| Vec2::new(p.x, p.z);

        match geometry {
            Geometry::Point(_) => Some(t),
            Geometry::Polygon(_) => {
                let (t, hit) = ray_plane_y(ray.origin, direction, mean_height)?;
                let ring: Vec<Vec2> = points.iter().copied().map(flat).collect();
                point_in_polygon_xz(flat(hit), &ring).then_some(t)
            }
            Geometry::Polyline(_) => {
                let (t, hit) = ray_plane_y(ray.origin, direction, mean_height)?;
                let tolerance = (t * 0.005).max(PICK_SLAB_HALF_THICKNESS * 4.0);
                points
                    .windows(2)
                    .any(|pair| distance_to_segment_xz(flat(hit), flat(pair[0]), flat(pair[1])) <= tolerance)
                    .then_some(t)
            }
        }
    }
}

impl SceneAdapter for BevyScene<'_, '_> {
    fn create(&mut self, container: &SceneContainer) {
        self.registry.container = Some(container.clone());
        self.registry.origin = None;
        self.registry.extent = None;
        self.viewport_camera.reset();
    }

    fn destroy(&mut self) {
        for (_, record) in self.registry.records.drain() {
            self.commands.entity(record.entity).despawn();
        }
        self.registry.container = None;
        self.registry.origin = None;
        self.registry.extent = None;
        self.viewport_camera.flight = None;
    }

    fn is_live(&self) -> bool {
        self.registry.container.is_some()
    }

    fn add_entity(&mut self, spec: EntitySpec) -> EntityHandle {
        self.registry.next_handle += 1;
        let handle = EntityHandle(self.registry.next_handle);

        let extent = spec.extent();
        if self.registry.origin.is_none() {
            self.registry.origin = extent.map(|bounds| {
                let center = bounds.center();
                DVec3::new(center.x, center.y, bounds.ground_height())
            });
        }

        let (entity, material_handle, label_offset) = self.spawn_spec(&spec, handle);
        self.registry.grow_extent(extent);
        self.registry.records.insert(
            handle,
            SceneRecord {
                entity,
                kind: spec.kind(),
                geometry: spec.geometry(),
                material: spec.material(),
                material_handle,
                properties: spec.properties().cloned(),
                label_offset,
                visible: true,
            },
        );
        handle
    }

    fn remove_entity(&mut self, handle: EntityHandle) {
        if let Some(record) = self.registry.records.remove(&handle) {
            self.commands.entity(record.entity).despawn();
        }
    }

    fn set_geometry(&mut self, handle: EntityHandle, geometry: Geometry) {
        let Some((entity, kind, label_offset)) = self
            .registry
            .records
            .get(&handle)
            .map(|record| (record.entity, record.kind, record.label_offset))
        else {
            return;
        };

        match (kind, &geometry) {
            (EntityKind::Label, Geometry::Point(p)) => {
                let anchor = self.registry.to_render(*p);
                self.commands.entity(entity).insert(WorldLabel {
                    anchor,
                    pixel_offset: label_offset,
                });
            }
            (EntityKind::Marker, Geometry::Point(p)) => {
                let transform = Transform::from_translation(self.registry.to_render(*p));
                self.commands.entity(entity).insert(transform);
            }
            _ => {
                let mesh = self.geometry_mesh(&geometry, MARKER_WORLD_SCALE * 5.0);
                let transform = self.geometry_transform(&geometry);
                let mesh = self.meshes.add(mesh);
                self.commands.entity(entity).insert((Mesh3d(mesh), transform));
            }
        }

        self.registry.grow_extent(geometry.bounds());
        if let Some(record) = self.registry.records.get_mut(&handle) {
            record.geometry = Some(geometry);
        }
    }

    fn set_visible(&mut self, handle: EntityHandle, visible: bool) {
        let Some(record) = self.registry.records.get_mut(&handle) else {
            return;
        };
        record.visible = visible;
        let visibility = if visible {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
        self.commands.entity(record.entity).insert(visibility);
    }

    fn material(&self, handle: EntityHandle) -> Option<SurfaceMaterial> {
        self.registry
            .records
            .get(&handle)
            .and_then(|record| record.material)
    }

    fn set_material(&mut self, handle: EntityHandle, material: SurfaceMaterial) {
        let Some(record) = self.registry.records.get_mut(&handle) else {
            return;
        };
        record.material = Some(material);

        match &record.material_handle {
            Some(material_handle) => {
                if let Some(standard) = self.materials.get_mut(material_handle) {
                    standard.base_color = material.colour;
                    standard.alpha_mode = alpha_mode_for(material.colour);
                }
            }
            None if record.kind == EntityKind::Label => {
                self.commands
                    .entity(record.entity)
                    .insert(TextColor(material.colour));
            }
            None => {}
        }
    }

    fn properties(&self, handle: EntityHandle) -> Option<PropertyBag> {
        self.registry
            .records
            .get(&handle)
            .and_then(|record| record.properties.clone())
    }

    fn pick_at(&self, point: ScreenPoint) -> Option<EntityHandle> {
        let ray = self.pointer_ray(point)?;
        let mut best: Option<(f32, EntityHandle)> = None;

        for (handle, record) in &self.registry.records {
            if record.kind != EntityKind::Feature || !record.visible {
                continue;
            }
            let Some(geometry) = &record.geometry else {
                continue;
            };
            let Some(t) = self.feature_hit(ray, geometry) else {
                continue;
            };
            if best.is_none_or(|(best_t, _)| t < best_t) {
                best = Some((t, *handle));
            }
        }

        best.map(|(_, handle)| handle)
    }

    fn project_to_world(&self, point: ScreenPoint) -> Option<WorldPoint> {
        let extent = self.registry.extent?;
        let ray = self.pointer_ray(point)?;
        let ground = extent.center().with_z(extent.ground_height());
        let plane_y = self.registry.to_render(ground).y;
        let (_, hit) = ray_plane_y(ray.origin, *ray.direction, plane_y)?;
        let world = self.registry.to_world(hit);
        extent.contains_xy(world).then_some(world)
    }

    fn fly_to(&mut self, target: CameraTarget, duration_secs: f32) {
        let pose = match target {
            CameraTarget::Bounds(bounds) => {
                let size = bounds.size();
                CameraPose::framing(
                    self.registry.to_render(bounds.center()),
                    Vec3::new(size.x as f32, size.z as f32, size.y as f32),
                )
            }
            CameraTarget::TopDown { center, radius } => {
                CameraPose::top_down(self.registry.to_render(center), radius as f32)
            }
        };
        self.viewport_camera.fly_to(pose, duration_secs);
    }
}

fn alpha_mode_for(colour: Color) -> AlphaMode {
    if colour.alpha() < 1.0 {
        AlphaMode::Blend
    } else {
        AlphaMode::Opaque
    }
}

fn standard_material(material: SurfaceMaterial) -> StandardMaterial {
    StandardMaterial {
        base_color: material.colour,
        alpha_mode: alpha_mode_for(material.colour),
        unlit: true,
        double_sided: true,
        cull_mode: None,
        ..default()
    }
}

fn line_mesh(points: &[Vec3]) -> Mesh {
    let mut positions: Vec<[f32; 3]> = points.iter().map(|p| p.to_array()).collect();
    if positions.len() == 1 {
        positions.push(positions[0]);
    }
    Mesh::new(PrimitiveTopology::LineStrip, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
}

/// Fan triangulation from the first vertex; fine for the convex and mildly concave
/// outlines drawn by hand or digitised from imagery.
fn fill_mesh(points: &[Vec3]) -> Mesh {
    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    if points.len() < 3 {
        return mesh;
    }

    let vertices: Vec<[f32; 3]> = points.iter().map(|p| p.to_array()).collect();
    let indices: Vec<u32> = (1..points.len() as u32 - 1)
        .flat_map(|i| [0, i, i + 1])
        .collect();
    let normals: Vec<[f32; 3]> = vec![[0.0, 1.0, 0.0]; points.len()];

    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, vertices);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

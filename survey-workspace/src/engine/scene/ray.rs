use bevy::math::{Vec2, Vec3};

/// Slab-method ray/AABB intersection. Returns the entry distance, or the exit distance
/// when the origin is inside the box.
pub fn ray_aabb_hit_t(ray_origin: Vec3, ray_direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;

    for axis in 0..3 {
        let (o, d) = (ray_origin[axis], ray_direction[axis]);
        if d.abs() < f32::EPSILON {
            // Parallel to this slab: must already be between its planes.
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }

        let mut t0 = (min[axis] - o) / d;
        let mut t1 = (max[axis] - o) / d;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_near = t_near.max(t0);
        t_far = t_far.min(t1);
        if t_near > t_far {
            return None;
        }
    }

    if t_far < 0.0 {
        return None;
    }
    Some(if t_near >= 0.0 { t_near } else { t_far })
}

/// Where a ray meets the horizontal plane at `plane_y`, only in front of the origin.
pub fn ray_plane_y(ray_origin: Vec3, ray_direction: Vec3, plane_y: f32) -> Option<(f32, Vec3)> {
    if ray_direction.y.abs() < 0.001 {
        return None;
    }
    let t = (plane_y - ray_origin.y) / ray_direction.y;
    (t > 0.0).then(|| (t, ray_origin + ray_direction * t))
}

/// Even-odd test on the horizontal (x, z) plane.
pub fn point_in_polygon_xz(point: Vec2, ring: &[Vec2]) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Horizontal distance from `point` to the segment `a`..`b`.
pub fn distance_to_segment_xz(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let length_squared = ab.length_squared();
    if length_squared <= f32::EPSILON {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / length_squared).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_enters_box_from_above() {
        let t = ray_aabb_hit_t(
            Vec3::new(0.5, 10.0, 0.5),
            Vec3::NEG_Y,
            Vec3::ZERO,
            Vec3::ONE,
        );
        assert_eq!(t, Some(9.0));
    }

    #[test]
    fn parallel_ray_outside_slab_misses() {
        let t = ray_aabb_hit_t(Vec3::new(5.0, 0.5, 0.5), Vec3::NEG_Y, Vec3::ZERO, Vec3::ONE);
        assert_eq!(t, None);
    }

    #[test]
    fn box_behind_ray_misses() {
        let t = ray_aabb_hit_t(Vec3::new(0.5, 10.0, 0.5), Vec3::Y, Vec3::ZERO, Vec3::ONE);
        assert_eq!(t, None);
    }

    #[test]
    fn plane_hit_requires_forward_ray() {
        let hit = ray_plane_y(Vec3::new(1.0, 5.0, 2.0), Vec3::NEG_Y, 0.0);
        assert_eq!(hit, Some((5.0, Vec3::new(1.0, 0.0, 2.0))));
        assert_eq!(ray_plane_y(Vec3::new(1.0, 5.0, 2.0), Vec3::Y, 0.0), None);
    }

    #[test]
    fn concave_polygon_containment() {
        let ring = [
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(0.0, 4.0),
        ];
        assert!(point_in_polygon_xz(Vec2::new(1.0, 0.5), &ring));
        assert!(!point_in_polygon_xz(Vec2::new(2.0, 3.0), &ring));
    }

    #[test]
    fn segment_distance_clamps_to_ends() {
        let d = distance_to_segment_xz(Vec2::new(-3.0, 4.0), Vec2::ZERO, Vec2::new(10.0, 0.0));
        assert_eq!(d, 5.0);
        let d = distance_to_segment_xz(Vec2::new(5.0, 2.0), Vec2::ZERO, Vec2::new(10.0, 0.0));
        assert_eq!(d, 2.0);
    }
}

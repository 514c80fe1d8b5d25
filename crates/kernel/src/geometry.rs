use crate::device::{DeviceState, ObjectKind, TypeFor};
use crate::object::{ObjectCore, Parameterized, SceneObject, Severity};
use glam::{UVec3, Vec3};
use parking_lot::RwLock;
use prism_common::{Aabb, Interval};
use std::sync::Arc;

/// Radius used for spheres without `radius` or `vertex.radius`.
pub const DEFAULT_SPHERE_RADIUS: f32 = 0.01;

/// Nearest primitive hit in the geometry's own space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryHit {
    pub t: f32,
    pub normal: Vec3,
    pub prim_id: u32,
}

#[derive(Debug, Default)]
enum Shape {
    #[default]
    Empty,
    Spheres {
        centers: Arc<[Vec3]>,
        radii: Vec<f32>,
    },
    Triangles {
        positions: Arc<[Vec3]>,
        indices: Vec<UVec3>,
    },
}

#[derive(Debug, Default)]
struct GeometryState {
    shape: Shape,
    bounds: Aabb,
}

/// Surface geometry: `sphere` or `triangle` subtypes.
#[derive(Debug)]
pub struct Geometry {
    core: ObjectCore,
    state: RwLock<GeometryState>,
}

impl TypeFor for Geometry {
    const KIND: ObjectKind = ObjectKind::Geometry;
}

impl Geometry {
    pub fn new(subtype: &str, device: &Arc<DeviceState>) -> Self {
        Self {
            core: ObjectCore::new(ObjectKind::Geometry, subtype, device),
            state: RwLock::new(GeometryState::default()),
        }
    }

    pub fn sphere(device: &Arc<DeviceState>) -> Self {
        Self::new("sphere", device)
    }

    pub fn triangle(device: &Arc<DeviceState>) -> Self {
        Self::new("triangle", device)
    }

    pub fn bounds(&self) -> Aabb {
        self.state.read().bounds
    }

    pub fn primitive_count(&self) -> usize {
        match &self.state.read().shape {
            Shape::Empty => 0,
            Shape::Spheres { centers, .. } => centers.len(),
            Shape::Triangles { indices, .. } => indices.len(),
        }
    }

    /// Nearest primitive hit with `t` inside the given interval.
    pub fn intersect(&self, org: Vec3, dir: Vec3, t: Interval) -> Option<GeometryHit> {
        let state = self.state.read();
        let t = state.bounds.intersect_ray(org, dir, t).map(|_| t)?;
        match &state.shape {
            Shape::Empty => None,
            Shape::Spheres { centers, radii } => {
                let mut best: Option<GeometryHit> = None;
                let mut upper = t.upper;
                for (i, (center, radius)) in centers.iter().zip(radii).enumerate() {
                    if let Some(hit) = intersect_sphere(org, dir, *center, *radius, t.lower, upper) {
                        upper = hit.0;
                        best = Some(GeometryHit {
                            t: hit.0,
                            normal: hit.1,
                            prim_id: i as u32,
                        });
                    }
                }
                best
            }
            Shape::Triangles { positions, indices } => {
                let mut best: Option<GeometryHit> = None;
                let mut upper = t.upper;
                for (i, tri) in indices.iter().enumerate() {
                    let v0 = positions[tri.x as usize];
                    let v1 = positions[tri.y as usize];
                    let v2 = positions[tri.z as usize];
                    if let Some(hit) = intersect_triangle(org, dir, v0, v1, v2, t.lower, upper) {
                        upper = hit.0;
                        best = Some(GeometryHit {
                            t: hit.0,
                            normal: hit.1,
                            prim_id: i as u32,
                        });
                    }
                }
                best
            }
        }
    }

    fn build_spheres(&self) -> Option<Shape> {
        let centers: Arc<[Vec3]> = self.required("vertex.position")?;
        let global = self.core.get_param_or("radius", DEFAULT_SPHERE_RADIUS);
        let radii = match self.core.get_param::<Arc<[f32]>>("vertex.radius") {
            Some(r) if r.len() == centers.len() => r.to_vec(),
            Some(r) => {
                self.core.report_message(
                    Severity::Warning,
                    format_args!(
                        "'vertex.radius' has {} entries for {} spheres, using 'radius'",
                        r.len(),
                        centers.len()
                    ),
                );
                vec![global; centers.len()]
            }
            None => vec![global; centers.len()],
        };
        Some(Shape::Spheres { centers, radii })
    }

    fn build_triangles(&self) -> Option<Shape> {
        let positions: Arc<[Vec3]> = self.required("vertex.position")?;
        let vertex_count = positions.len() as u32;
        let indices: Vec<UVec3> = match self.core.get_param::<Arc<[UVec3]>>("primitive.index") {
            Some(idx) => {
                let valid: Vec<UVec3> = idx
                    .iter()
                    .copied()
                    .filter(|t| t.max_element() < vertex_count)
                    .collect();
                if valid.len() != idx.len() {
                    self.core.report_message(
                        Severity::Warning,
                        format_args!(
                            "skipped {} triangles with out-of-range indices",
                            idx.len() - valid.len()
                        ),
                    );
                }
                valid
            }
            None => {
                if vertex_count % 3 != 0 {
                    self.core.report_message(
                        Severity::Warning,
                        "vertex count is not a multiple of 3, trailing vertices ignored",
                    );
                }
                (0..vertex_count / 3)
                    .map(|i| UVec3::new(3 * i, 3 * i + 1, 3 * i + 2))
                    .collect()
            }
        };
        Some(Shape::Triangles { positions, indices })
    }

    fn required<T: crate::object::FromParam>(&self, name: &str) -> Option<T> {
        let value = self.core.get_param(name);
        if value.is_none() {
            self.core.report_message(
                Severity::Warning,
                format_args!("missing required parameter '{name}'"),
            );
        }
        value
    }
}

fn shape_bounds(shape: &Shape) -> Aabb {
    let mut bounds = Aabb::empty();
    match shape {
        Shape::Empty => {}
        Shape::Spheres { centers, radii } => {
            for (c, r) in centers.iter().zip(radii) {
                bounds.extend(&Aabb::new(*c - Vec3::splat(*r), *c + Vec3::splat(*r)));
            }
        }
        Shape::Triangles { positions, indices } => {
            for tri in indices {
                for i in tri.to_array() {
                    bounds.extend_point(positions[i as usize]);
                }
            }
        }
    }
    bounds
}

/// Quadratic ray-sphere test; `dir` need not be unit length.
fn intersect_sphere(
    org: Vec3,
    dir: Vec3,
    center: Vec3,
    radius: f32,
    t_min: f32,
    t_max: f32,
) -> Option<(f32, Vec3)> {
    let oc = org - center;
    let a = dir.dot(dir);
    let b = 2.0 * oc.dot(dir);
    let c = oc.dot(oc) - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 || a == 0.0 {
        return None;
    }

    let sqrt_disc = discriminant.sqrt();
    let t1 = (-b - sqrt_disc) / (2.0 * a);
    let t2 = (-b + sqrt_disc) / (2.0 * a);
    let t = [t1, t2].into_iter().find(|t| *t >= t_min && *t <= t_max)?;
    let normal = (org + dir * t - center) / radius;
    Some((t, normal.normalize_or_zero()))
}

/// Möller-Trumbore ray-triangle test.
fn intersect_triangle(
    org: Vec3,
    dir: Vec3,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    t_min: f32,
    t_max: f32,
) -> Option<(f32, Vec3)> {
    let e1 = v1 - v0;
    let e2 = v2 - v0;
    let pvec = dir.cross(e2);
    let det = e1.dot(pvec);
    if det.abs() < 1e-12 {
        return None;
    }
    let inv_det = 1.0 / det;

    let tvec = org - v0;
    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let qvec = tvec.cross(e1);
    let v = dir.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(qvec) * inv_det;
    if t < t_min || t > t_max {
        return None;
    }
    Some((t, e1.cross(e2).normalize_or_zero()))
}

impl Parameterized for Geometry {
    fn core(&self) -> &ObjectCore {
        &self.core
    }
}

impl SceneObject for Geometry {
    fn commit(&self) {
        let shape = match self.core.subtype() {
            "sphere" => self.build_spheres(),
            "triangle" => self.build_triangles(),
            other => {
                self.core.report_message(
                    Severity::Warning,
                    format_args!("unknown geometry subtype '{other}'"),
                );
                None
            }
        }
        .unwrap_or_default();

        let bounds = shape_bounds(&shape);
        *self.state.write() = GeometryState { shape, bounds };
    }

    fn is_valid(&self) -> bool {
        !matches!(self.state.read().shape, Shape::Empty)
    }
}

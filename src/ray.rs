use nalgebra::{Point3, Vector3};

use crate::material::Material;

/// A ray with a normalized direction, stamped with the shutter time it was
/// emitted at.
#[derive(Clone, Debug)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
    pub inv_direction: Vector3<f32>,
    pub time: f32,
}

impl Ray {
    /// `direction` must be non-zero, it is normalized here.
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>, time: f32) -> Self {
        let direction = direction.normalize();
        let inv_direction = direction.map(|d| 1.0 / d);
        Self { origin, direction, inv_direction, time }
    }

    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }
}

/// Nearest intersection found by a query. The normal is the outward normal
/// `(point - center) / radius` and is never flipped towards the ray.
#[derive(Clone, Debug)]
pub struct Hit<'a> {
    pub t: f32,
    pub point: Point3<f32>,
    pub normal: Vector3<f32>,
    pub material: &'a Material,
}

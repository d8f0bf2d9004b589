use nalgebra::{Point3, Vector3};

use crate::aabb::Aabb;
use crate::material::Material;
use crate::ray::{Hit, Ray};

/// Solves the ray/sphere quadratic and fills the hit for the nearest root in
/// `(t_min, t_max)`.
fn hit_sphere<'a>(
    center: Point3<f32>,
    radius: f32,
    material: &'a Material,
    ray: &Ray,
    t_min: f32,
    t_max: f32,
) -> Option<Hit<'a>> {
    let oc = ray.origin - center;
    let a = ray.direction.magnitude_squared();
    let half_b = oc.dot(&ray.direction);
    let c = oc.magnitude_squared() - radius * radius;

    let discriminant = half_b * half_b - a * c;
    if discriminant <= 0.0 {
        return None;
    }
    let sqrtd = discriminant.sqrt();

    let in_range = |t: f32| t_min < t && t < t_max;
    let mut root = (-half_b - sqrtd) / a;
    if !in_range(root) {
        root = (-half_b + sqrtd) / a;
        if !in_range(root) {
            return None;
        }
    }

    let point = ray.at(root);
    // a negative radius turns the normal inwards
    let normal = (point - center) / radius;
    Some(Hit { t: root, point, normal, material })
}

fn sphere_box(center: Point3<f32>, radius: f32) -> Aabb {
    let extent = Vector3::repeat(radius.abs());
    Aabb::from_corners(center - extent, center + extent)
}

#[derive(Clone, Debug)]
pub struct Sphere {
    pub center: Point3<f32>,
    pub radius: f32,
    pub material: Material,
}

impl Sphere {
    pub fn new(center: Point3<f32>, radius: f32, material: Material) -> Self {
        Sphere { center, radius, material }
    }

    pub fn hit(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<Hit> {
        hit_sphere(self.center, self.radius, &self.material, ray, t_min, t_max)
    }

    pub fn bounding_box(&self) -> Aabb {
        sphere_box(self.center, self.radius)
    }
}

/// Sphere whose center moves linearly between two keyframes.
#[derive(Clone, Debug)]
pub struct MovingSphere {
    pub center_from: Point3<f32>,
    pub center_to: Point3<f32>,
    pub time_from: f32,
    pub time_to: f32,
    pub radius: f32,
    pub material: Material,
}

impl MovingSphere {
    pub fn new(
        (center_from, time_from): (Point3<f32>, f32),
        (center_to, time_to): (Point3<f32>, f32),
        radius: f32,
        material: Material,
    ) -> Self {
        MovingSphere { center_from, center_to, time_from, time_to, radius, material }
    }

    pub fn center(&self, time: f32) -> Point3<f32> {
        let s = (time - self.time_from) / (self.time_to - self.time_from);
        self.center_from + s * (self.center_to - self.center_from)
    }

    pub fn hit(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<Hit> {
        hit_sphere(self.center(ray.time), self.radius, &self.material, ray, t_min, t_max)
    }

    pub fn bounding_box(&self, time_from: f32, time_to: f32) -> Aabb {
        sphere_box(self.center(time_from), self.radius).union(&sphere_box(self.center(time_to), self.radius))
    }
}

#[derive(Clone, Debug)]
pub enum Object {
    Sphere(Sphere),
    MovingSphere(MovingSphere),
}

impl Object {
    pub fn hit(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<Hit> {
        match self {
            Object::Sphere(sphere) => sphere.hit(ray, t_min, t_max),
            Object::MovingSphere(sphere) => sphere.hit(ray, t_min, t_max),
        }
    }

    /// Box enclosing the object over the shutter interval `[time_from, time_to]`.
    pub fn bounding_box(&self, time_from: f32, time_to: f32) -> Aabb {
        match self {
            Object::Sphere(sphere) => sphere.bounding_box(),
            Object::MovingSphere(sphere) => sphere.bounding_box(time_from, time_to),
        }
    }
}

/// Nearest hit over all objects by linear scan.
#[cfg(test)]
pub fn nearest_hit<'a>(objects: &'a [Object], ray: &Ray, t_min: f32, t_max: f32) -> Option<Hit<'a>> {
    objects.iter()
        .filter_map(|obj| obj.hit(ray, t_min, t_max))
        .min_by_key(|hit| float_ord::FloatOrd(hit.t))
}

#[cfg(test)]
mod tests {
    use fastrand::Rng;
    use nalgebra::{point, vector};

    use super::*;
    use crate::picture::Color;
    use crate::render::random_in_unit_sphere;

    fn grey() -> Material {
        Material::lambertian(Color::new(0.5, 0.5, 0.5))
    }

    #[test]
    fn nearest_root_first() {
        let sphere = Sphere::new(point![0.0, 0.0, -1.0], 0.5, grey());
        let ray = Ray::new(Point3::origin(), vector![0.0, 0.0, -1.0], 0.0);
        let hit = sphere.hit(&ray, 0.001, f32::MAX).expect("hit");
        assert!((hit.t - 0.5).abs() < 1e-6);
        assert!((hit.normal - vector![0.0, 0.0, 1.0]).magnitude() < 1e-6);
        assert_eq!(hit.material, &sphere.material);
    }

    #[test]
    fn far_root_when_near_is_outside_window() {
        let sphere = Sphere::new(point![0.0, 0.0, -1.0], 0.5, grey());
        let ray = Ray::new(Point3::origin(), vector![0.0, 0.0, -1.0], 0.0);
        let hit = sphere.hit(&ray, 0.6, f32::MAX).expect("far side");
        assert!((hit.t - 1.5).abs() < 1e-6);
        assert!(sphere.hit(&ray, 0.6, 1.4).is_none());
        assert!(sphere.hit(&ray, 0.5, 1.5).is_none());
    }

    #[test]
    fn tangent_and_miss() {
        let sphere = Sphere::new(point![0.0, 0.0, -1.0], 0.5, grey());
        let tangent = Ray::new(point![0.5, 0.0, 0.0], vector![0.0, 0.0, -1.0], 0.0);
        assert!(sphere.hit(&tangent, 0.001, f32::MAX).is_none());
        let away = Ray::new(Point3::origin(), vector![0.0, 1.0, 0.0], 0.0);
        assert!(sphere.hit(&away, 0.001, f32::MAX).is_none());
    }

    #[test]
    fn hit_point_lies_on_sphere() {
        let sphere = Sphere::new(point![1.0, -2.0, 3.0], 1.5, grey());
        let mut rng = Rng::with_seed(4);
        let mut hits = 0;
        for _ in 0..1000 {
            let origin = point![1.0, -2.0, 3.0] + 4.0 * random_in_unit_sphere(&mut rng) + vector![0.0, 0.0, 5.0];
            let ray = Ray::new(origin, random_in_unit_sphere(&mut rng), 0.0);
            if let Some(hit) = sphere.hit(&ray, 0.001, f32::MAX) {
                hits += 1;
                assert_eq!(hit.point, ray.at(hit.t));
                assert!(((hit.point - sphere.center).magnitude() - 1.5).abs() < 1e-4);
                assert!((hit.normal.magnitude() - 1.0).abs() < 1e-4);
            }
        }
        assert!(hits > 0);
    }

    #[test]
    fn negative_radius_faces_inwards() {
        let hollow = Sphere::new(Point3::origin(), -0.45, grey());
        let ray = Ray::new(point![0.0, 0.0, -5.0], vector![0.0, 0.0, 1.0], 0.0);
        let hit = hollow.hit(&ray, 0.001, f32::MAX).expect("hit");
        assert!((hit.t - 4.55).abs() < 1e-5);
        assert!(hit.normal.z > 0.99);

        let aabb = hollow.bounding_box();
        assert_eq!(aabb.min, point![-0.45, -0.45, -0.45]);
        assert_eq!(aabb.max, point![0.45, 0.45, 0.45]);
    }

    #[test]
    fn moving_sphere_follows_ray_time() {
        let sphere = MovingSphere::new(
            (point![0.0, 0.0, 0.0], 0.0),
            (point![0.0, 2.0, 0.0], 1.0),
            0.5,
            grey(),
        );
        assert_eq!(sphere.center(0.5), point![0.0, 1.0, 0.0]);

        let early = Ray::new(point![0.0, 0.0, -5.0], vector![0.0, 0.0, 1.0], 0.0);
        let late = Ray::new(point![0.0, 0.0, -5.0], vector![0.0, 0.0, 1.0], 1.0);
        assert!(sphere.hit(&early, 0.001, f32::MAX).is_some());
        assert!(sphere.hit(&late, 0.001, f32::MAX).is_none());

        let aabb = sphere.bounding_box(0.0, 1.0);
        assert_eq!(aabb.min, point![-0.5, -0.5, -0.5]);
        assert_eq!(aabb.max, point![0.5, 2.5, 0.5]);
    }

    #[test]
    fn boxes_never_miss_a_hit() {
        let objects = vec![
            Object::Sphere(Sphere::new(point![0.3, -0.2, 1.0], 0.7, grey())),
            Object::Sphere(Sphere::new(point![-2.0, 1.0, 4.0], -1.2, grey())),
            Object::MovingSphere(MovingSphere::new(
                (point![1.0, 0.0, 2.0], 0.0),
                (point![1.0, 1.5, 2.5], 1.0),
                0.4,
                grey(),
            )),
        ];
        let mut rng = Rng::with_seed(21);
        for _ in 0..5000 {
            let origin = Point3::from(3.0 * random_in_unit_sphere(&mut rng));
            let ray = Ray::new(origin, random_in_unit_sphere(&mut rng), rng.f32());
            for obj in &objects {
                if let Some(hit) = obj.hit(&ray, 0.001, f32::MAX) {
                    assert!(obj.bounding_box(0.0, 1.0).hit(&ray, 0.001, hit.t + 1e-3));
                }
            }
        }
    }

    #[test]
    fn linear_scan_picks_nearest() {
        let objects = vec![
            Object::Sphere(Sphere::new(point![0.0, 0.0, 5.0], 1.0, Material::dielectric(1.5))),
            Object::Sphere(Sphere::new(point![0.0, 0.0, 2.0], 0.5, grey())),
        ];
        let ray = Ray::new(Point3::origin(), vector![0.0, 0.0, 1.0], 0.0);
        let hit = nearest_hit(&objects, &ray, 0.001, f32::MAX).expect("hit");
        assert!((hit.t - 1.5).abs() < 1e-6);
        assert_eq!(hit.material, &grey());
        assert!(nearest_hit(&[], &ray, 0.001, f32::MAX).is_none());
    }
}

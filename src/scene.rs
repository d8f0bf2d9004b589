use clap::ValueEnum;
use fastrand::Rng;
use nalgebra::{point, vector, Point3};

use crate::aabb::Aabb;
use crate::bvh::Bvh;
use crate::camera::Camera;
use crate::material::Material;
use crate::object::{MovingSphere, Object, Sphere};
use crate::picture::Color;
use crate::ray::{Hit, Ray};

/// Objects indexed by a BVH plus the camera they are seen through.
pub struct Scene {
    pub camera: Camera,
    world: Option<Bvh>,
}

impl Scene {
    pub fn new(objects: Vec<Object>, camera: Camera, rng: &mut Rng) -> Self {
        let world = Bvh::new(objects, camera.time_from, camera.time_to, rng);
        Scene { camera, world }
    }

    pub fn hit(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<Hit> {
        self.world.as_ref()?.hit(ray, t_min, t_max)
    }

    pub fn bounds(&self) -> Option<Aabb> {
        self.world.as_ref().map(Bvh::bounding_box)
    }

    pub fn object_count(&self) -> usize {
        self.world.as_ref().map_or(0, |bvh| bvh.objects().len())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SceneKind {
    /// Nothing but sky.
    Empty,
    /// A diffuse sphere resting on a large ground sphere.
    TwoSpheres,
    /// Random small spheres around three large ones, with motion blur and
    /// depth of field.
    #[default]
    Showcase,
}

impl SceneKind {
    pub fn build(self, rng: &mut Rng) -> Scene {
        match self {
            SceneKind::Empty => Scene::new(Vec::new(), self.camera(), rng),
            SceneKind::TwoSpheres => two_spheres(rng),
            SceneKind::Showcase => showcase(rng),
        }
    }

    /// Camera the preset is seen through. Does not depend on the seed.
    pub fn camera(self) -> Camera {
        match self {
            SceneKind::Empty | SceneKind::TwoSpheres => Camera::default(),
            SceneKind::Showcase => {
                let mut camera = Camera::looking_at(point![13.0, 2.0, 3.0], Point3::origin());
                camera.focus_distance = 10.0;
                camera.aperture = 0.1;
                camera
            }
        }
    }
}

fn two_spheres(rng: &mut Rng) -> Scene {
    let objects = vec![
        Object::Sphere(Sphere::new(point![0.0, 0.0, 1.0], 0.5, Material::lambertian(Color::new(0.8, 0.3, 0.3)))),
        Object::Sphere(Sphere::new(point![0.0, -100.5, 1.0], 100.0, Material::lambertian(Color::new(0.8, 0.8, 0.0)))),
    ];
    Scene::new(objects, SceneKind::TwoSpheres.camera(), rng)
}

fn random_color(rng: &mut Rng) -> Color {
    Color::new(rng.f32(), rng.f32(), rng.f32())
}

fn showcase(rng: &mut Rng) -> Scene {
    let mut objects = vec![Object::Sphere(Sphere::new(
        point![0.0, -1000.0, 0.0],
        1000.0,
        Material::lambertian(Color::new(0.5, 0.5, 0.5)),
    ))];

    for a in -11..11 {
        for b in -11..11 {
            let choice = rng.f32();
            let center = point![a as f32 + 0.9 * rng.f32(), 0.2, b as f32 + 0.9 * rng.f32()];
            if (center - point![4.0, 0.2, 0.0]).magnitude() <= 0.9 {
                continue;
            }

            let object = if choice < 0.8 {
                let albedo = random_color(rng) * random_color(rng);
                let to = center + vector![0.0, 0.5 * rng.f32(), 0.0];
                Object::MovingSphere(MovingSphere::new((center, 0.0), (to, 1.0), 0.2, Material::lambertian(albedo)))
            } else if choice < 0.95 {
                let albedo = Color::new(0.5 * (1.0 + rng.f32()), 0.5 * (1.0 + rng.f32()), 0.5 * (1.0 + rng.f32()));
                Object::Sphere(Sphere::new(center, 0.2, Material::metal(albedo, 1.0 - 0.5 * rng.f32())))
            } else {
                Object::Sphere(Sphere::new(center, 0.2, Material::dielectric(1.5)))
            };
            objects.push(object);
        }
    }

    objects.extend([
        Object::Sphere(Sphere::new(point![0.0, 1.0, 0.0], 1.0, Material::dielectric(1.5))),
        // hollow bubble inside the glass ball
        Object::Sphere(Sphere::new(point![0.0, 1.0, 0.0], -0.95, Material::dielectric(1.5))),
        Object::Sphere(Sphere::new(point![-4.0, 1.0, 0.0], 1.0, Material::lambertian(Color::new(0.4, 0.2, 0.1)))),
        Object::Sphere(Sphere::new(point![4.0, 1.0, 0.0], 1.0, Material::metal(Color::new(0.7, 0.6, 0.5), 1.0))),
    ]);

    Scene::new(objects, SceneKind::Showcase.camera(), rng)
}

#[cfg(test)]
mod tests {
    use nalgebra::Vector3;

    use super::*;
    use crate::render::{T_MAX, T_MIN};

    #[test]
    fn presets_build() {
        let mut rng = Rng::with_seed(0);
        assert_eq!(SceneKind::Empty.build(&mut rng).object_count(), 0);
        assert_eq!(SceneKind::TwoSpheres.build(&mut rng).object_count(), 2);
        let showcase = SceneKind::Showcase.build(&mut rng);
        assert!(showcase.object_count() > 400);
    }

    #[test]
    fn two_spheres_in_view() {
        let scene = SceneKind::TwoSpheres.build(&mut Rng::with_seed(0));
        let forward = Ray::new(Point3::origin(), Vector3::z(), 0.0);
        let hit = scene.hit(&forward, T_MIN, T_MAX).expect("small sphere");
        assert!((hit.t - 0.5).abs() < 1e-5);

        let down = Ray::new(Point3::origin(), -Vector3::y(), 0.0);
        let hit = scene.hit(&down, T_MIN, T_MAX).expect("ground");
        assert!((hit.t - 0.505).abs() < 1e-3);
    }

    #[test]
    fn showcase_camera_looks_at_origin() {
        let scene = SceneKind::Showcase.build(&mut Rng::with_seed(0));
        let look = scene.camera.look();
        let expected = (Point3::origin() - point![13.0, 2.0, 3.0]).normalize();
        assert!((look - expected).magnitude() < 1e-5);
        assert_eq!(scene.camera, SceneKind::Showcase.camera());
        assert_eq!(scene.camera.aperture, 0.1);
    }
}

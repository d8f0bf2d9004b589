use fastrand::Rng;
use nalgebra::Vector3;

use crate::picture::Color;
use crate::ray::{Hit, Ray};
use crate::render::random_in_unit_sphere;

#[derive(Clone, Debug, PartialEq)]
pub enum Material {
    Lambertian { albedo: Color },
    /// `metallic` is 1 for a perfect mirror, lower values fuzz the reflection.
    Metal { albedo: Color, metallic: f32 },
    Dielectric { refractive_index: f32 },
}

pub fn reflect(v: &Vector3<f32>, n: &Vector3<f32>) -> Vector3<f32> {
    v - 2.0 * v.dot(n) * n
}

/// Snell refraction of `v` through a surface with normal `n`, `None` on total
/// internal reflection.
pub fn refract(v: &Vector3<f32>, n: &Vector3<f32>, ni_over_nt: f32) -> Option<Vector3<f32>> {
    let uv = v.normalize();
    let dt = uv.dot(n);
    let discriminant = 1.0 - ni_over_nt * ni_over_nt * (1.0 - dt * dt);
    if discriminant > 0.0 {
        Some(ni_over_nt * (uv - n * dt) - n * discriminant.sqrt())
    } else {
        None
    }
}

/// Schlick's approximation of Fresnel reflectance.
pub fn schlick(cosine: f32, refractive_index: f32) -> f32 {
    let r0 = ((1.0 - refractive_index) / (1.0 + refractive_index)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}

impl Material {
    pub fn lambertian(albedo: Color) -> Material {
        Material::Lambertian { albedo }
    }

    pub fn metal(albedo: Color, metallic: f32) -> Material {
        Material::Metal { albedo, metallic: metallic.clamp(0.0, 1.0) }
    }

    pub fn dielectric(refractive_index: f32) -> Material {
        Material::Dielectric { refractive_index }
    }

    /// Scatters `ray` at `hit`. `None` means the ray was absorbed.
    pub fn scatter(&self, ray: &Ray, hit: &Hit, rng: &mut Rng) -> Option<(Color, Ray)> {
        match self {
            Material::Lambertian { albedo } => {
                let direction = hit.normal + random_in_unit_sphere(rng);
                Some((*albedo, Ray::new(hit.point, direction, ray.time)))
            }
            Material::Metal { albedo, metallic } => {
                let direction = reflect(&ray.direction.normalize(), &hit.normal)
                    + (1.0 - metallic) * random_in_unit_sphere(rng);
                if direction.dot(&hit.normal) > 0.0 {
                    Some((*albedo, Ray::new(hit.point, direction, ray.time)))
                } else {
                    None
                }
            }
            Material::Dielectric { refractive_index } => {
                let d_dot_n = ray.direction.dot(&hit.normal);
                let (normal, ni_over_nt, cosine) = if d_dot_n < 0.0 {
                    (hit.normal, 1.0 / refractive_index, -d_dot_n / refractive_index)
                } else {
                    (-hit.normal, *refractive_index, d_dot_n)
                };

                let refracted = refract(&ray.direction, &normal, ni_over_nt);
                let reflect_probability = match refracted {
                    Some(_) => schlick(cosine, *refractive_index),
                    None => 1.0,
                };

                let direction = match refracted {
                    Some(refracted) if rng.f32() >= reflect_probability => refracted,
                    _ => reflect(&ray.direction, &hit.normal),
                };
                Some((Color::WHITE, Ray::new(hit.point, direction, ray.time)))
            }
        }
    }
}

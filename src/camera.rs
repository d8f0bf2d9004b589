use std::f32::consts::FRAC_PI_2;

use fastrand::Rng;
use nalgebra::{vector, Point3, Vector3};

use crate::ray::Ray;
use crate::render::random_in_unit_disk;

/// Half of the field of view covered by the shorter image side.
const HALF_FOV: f32 = std::f32::consts::FRAC_PI_6;
/// Keeps the view direction away from world up, where `look × up` degenerates.
pub const MAX_PITCH: f32 = FRAC_PI_2 - 1e-3;

/// Camera pose and lens. Angles are in radians, yaw 0 and pitch 0 look
/// down +z.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: f32,
    pub pitch: f32,
    pub focus_distance: f32,
    pub aperture: f32,
    pub time_from: f32,
    pub time_to: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            position: Point3::origin(),
            yaw: 0.0,
            pitch: 0.0,
            focus_distance: 1.0,
            aperture: 0.0,
            time_from: 0.0,
            time_to: 1.0,
        }
    }
}

impl Camera {
    /// Camera at `position` aimed at `target` and focused on it.
    pub fn looking_at(position: Point3<f32>, target: Point3<f32>) -> Self {
        let offset = target - position;
        let look = offset.normalize();
        Camera {
            position,
            yaw: look.x.atan2(look.z),
            pitch: look.y.asin(),
            focus_distance: offset.magnitude(),
            ..Camera::default()
        }
    }

    pub fn look(&self) -> Vector3<f32> {
        let pitch = self.pitch.clamp(-MAX_PITCH, MAX_PITCH);
        vector![pitch.cos() * self.yaw.sin(), pitch.sin(), pitch.cos() * self.yaw.cos()]
    }

    pub fn viewport(&self, width: u32, height: u32) -> Viewport {
        let image_width = width as f32;
        let image_height = height as f32;
        let aspect_ratio = image_width / image_height;

        let look = self.look();
        let right = look.cross(&Vector3::y()).normalize();
        // runs down the image, so dv = 0 is the top row
        let down = look.cross(&right).normalize();

        let half_extent = HALF_FOV.tan() * self.focus_distance;
        let (half_width, half_height) = if aspect_ratio >= 1.0 {
            (half_extent * aspect_ratio, half_extent)
        } else {
            (half_extent, half_extent / aspect_ratio)
        };

        let center = self.position + self.focus_distance * look;
        let top_left = center - half_width * right - half_height * down;

        Viewport {
            origin: self.position,
            image_width,
            image_height,
            right,
            down,
            top_left,
            horizontal: 2.0 * half_width * right,
            vertical: 2.0 * half_height * down,
            lens_radius: self.aperture / 2.0,
            time_from: self.time_from,
            time_to: self.time_to,
        }
    }
}

/// Image plane of a camera for one output size.
pub struct Viewport {
    pub origin: Point3<f32>,
    pub image_width: f32,
    pub image_height: f32,
    pub right: Vector3<f32>,
    pub down: Vector3<f32>,
    pub top_left: Point3<f32>,
    pub horizontal: Vector3<f32>,
    pub vertical: Vector3<f32>,
    pub lens_radius: f32,
    pub time_from: f32,
    pub time_to: f32,
}

impl Viewport {
    /// Emits a ray through the image plane point `(du, dv)`, both in `[0, 1]`,
    /// from a random point on the lens at a random shutter time.
    pub fn get_ray(&self, du: f32, dv: f32, rng: &mut Rng) -> Ray {
        let disk = self.lens_radius * random_in_unit_disk(rng);
        let origin = self.origin + self.right * disk.x + self.down * disk.y;
        let target = self.top_left + du * self.horizontal + dv * self.vertical;
        let time = self.time_from + rng.f32() * (self.time_to - self.time_from);
        Ray::new(origin, target - origin, time)
    }
}

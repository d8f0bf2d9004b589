use std::iter::repeat_with;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use fastrand::Rng;
use log::trace;
use nalgebra::{vector, Vector3};

use crate::camera::{Camera, Viewport};
use crate::picture::{Bgra8, Color, Frame};
use crate::ray::Ray;
use crate::scene::Scene;

pub const MAX_DEPTH: u32 = 50;
pub const T_MIN: f32 = 0.001;
pub const T_MAX: f32 = f32::MAX;

const SKY_BLUE: Color = Color::new(0.5, 0.7, 1.0);

fn random_signed(rng: &mut Rng) -> f32 {
    rng.f32() * 2.0 - 1.0
}

/// Rejection-samples a point strictly inside the unit sphere.
pub fn random_in_unit_sphere(rng: &mut Rng) -> Vector3<f32> {
    repeat_with(|| vector![random_signed(rng), random_signed(rng), random_signed(rng)])
        .find(|vec| vec.magnitude_squared() < 1.0)
        .expect("infinite iterator")
}

/// Rejection-samples a point strictly inside the unit disk on the xy plane.
pub fn random_in_unit_disk(rng: &mut Rng) -> Vector3<f32> {
    repeat_with(|| vector![random_signed(rng), random_signed(rng), 0.0])
        .find(|vec| vec.magnitude_squared() < 1.0)
        .expect("infinite iterator")
}

/// Vertical white to light blue gradient seen by rays that escape the scene.
pub fn sky(ray: &Ray) -> Color {
    let t = 0.5 * (ray.direction.normalize().y + 1.0);
    (1.0 - t) * Color::WHITE + t * SKY_BLUE
}

/// Radiance carried back along `ray`, `depth` bounces after the camera.
pub fn trace(ray: &Ray, scene: &Scene, depth: u32, rng: &mut Rng) -> Color {
    let Some(hit) = scene.hit(ray, T_MIN, T_MAX) else {
        return sky(ray);
    };
    if depth >= MAX_DEPTH {
        return Color::BLACK;
    }
    match hit.material.scatter(ray, &hit, rng) {
        Some((attenuation, scattered)) => attenuation * trace(&scattered, scene, depth + 1, rng),
        None => Color::BLACK,
    }
}

/// Produces the color of a single pixel from `samples` jittered samples.
pub fn render_pixel(x: u32, y: u32, viewport: &Viewport, scene: &Scene, samples: u32, rng: &mut Rng) -> Color {
    let sum: Color = (0..samples)
        .map(|_| {
            let du = (x as f32 + rng.f32()) / viewport.image_width;
            let dv = (y as f32 + rng.f32()) / viewport.image_height;
            let ray = viewport.get_ray(du, dv, rng);
            trace(&ray, scene, 0, rng)
        })
        .sum();
    (sum / samples.max(1) as f32).gamma_corrected()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    Completed,
    Cancelled,
}

/// Renders the whole frame top to bottom, publishing each finished row.
///
/// `cancel` is polled before every row; a cancelled render leaves the rows
/// published so far in the frame and returns immediately.
pub fn render_frame(
    frame: &Mutex<Frame>,
    camera: &Camera,
    scene: &Scene,
    samples: u32,
    cancel: &AtomicBool,
    rng: &mut Rng,
) -> RenderOutcome {
    let (width, height) = {
        let frame = frame.lock().expect("frame lock");
        (frame.width(), frame.height())
    };
    let viewport = camera.viewport(width, height);

    let mut row = Vec::with_capacity(width as usize);
    for y in 0..height {
        if cancel.load(Ordering::Acquire) {
            return RenderOutcome::Cancelled;
        }

        row.clear();
        row.extend((0..width).map(|x| Bgra8::from(render_pixel(x, y, &viewport, scene, samples, rng))));
        trace!(target: "app", "Rendered row {}", y);

        let mut frame = frame.lock().expect("frame submission lock");
        frame.row_mut(y).copy_from_slice(&row);
    }
    RenderOutcome::Completed
}

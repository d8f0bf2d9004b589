//! Render session: owns the shared frame and the single background worker
//! that fills it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{spawn, JoinHandle};
use std::time::Instant;

use fastrand::Rng;
use log::{debug, error, info, warn};

use crate::camera::MAX_PITCH;
use crate::picture::Frame;
use crate::render::{render_frame, RenderOutcome};
use crate::scene::{Scene, SceneKind};

/// Frames smaller than this in either dimension are never rendered.
pub const MIN_FRAME_SIZE: u32 = 2;

#[derive(Clone, Debug, PartialEq)]
pub struct RenderSettings {
    pub samples: u32,
    pub seed: u64,
    pub scene: SceneKind,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings { samples: 16, seed: 0, scene: SceneKind::default() }
    }
}

/// Builds the scene for one render, on the worker thread.
type SceneSource = Arc<dyn Fn(&mut Rng) -> Arc<Scene> + Send + Sync>;

/// Yaw and pitch added to the scene camera, in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Orbit {
    yaw: f32,
    pitch: f32,
}

pub struct RenderSession {
    frame: Arc<Mutex<Frame>>,
    cancel: Arc<AtomicBool>,
    worker: Option<JoinHandle<RenderOutcome>>,
    settings: RenderSettings,
    scenes: SceneSource,
    orbit: Orbit,
}

impl RenderSession {
    pub fn new(settings: RenderSettings) -> Self {
        let kind = settings.scene;
        RenderSession::with_scenes(settings, Arc::new(move |rng: &mut Rng| Arc::new(kind.build(rng))))
    }

    fn with_scenes(settings: RenderSettings, scenes: SceneSource) -> Self {
        RenderSession {
            frame: Arc::new(Mutex::new(Frame::new(0, 0))),
            cancel: Arc::new(AtomicBool::new(false)),
            worker: None,
            settings,
            scenes,
            orbit: Orbit::default(),
        }
    }

    /// Frame the presentation layer reads from.
    pub fn frame(&self) -> Arc<Mutex<Frame>> {
        self.frame.clone()
    }

    fn frame_size(&self) -> (u32, u32) {
        let frame = self.frame.lock().expect("frame lock");
        (frame.width(), frame.height())
    }

    /// Cancels the running render, reallocates a cleared frame at the new size
    /// and starts over. Sizes below [`MIN_FRAME_SIZE`] and the size already
    /// being rendered leave the worker and the frame alone. Returns how the
    /// interrupted render ended, if one was replaced.
    pub fn resize(&mut self, width: u32, height: u32) -> Option<RenderOutcome> {
        if width < MIN_FRAME_SIZE || height < MIN_FRAME_SIZE {
            warn!(target: "app", "Refusing to render into a {}x{} frame", width, height);
            return None;
        }
        if self.frame_size() == (width, height) {
            debug!(target: "app", "Frame already {}x{}, keeping it", width, height);
            return None;
        }

        let previous = self.cancel_worker();
        *self.frame.lock().expect("frame lock") = Frame::new(width, height);

        self.spawn_worker();
        previous
    }

    /// Turns the camera and restarts the render into the cleared frame.
    pub fn orbit(&mut self, yaw: f32, pitch: f32) -> Option<RenderOutcome> {
        let previous = self.cancel_worker();
        let base_pitch = self.settings.scene.camera().pitch;
        self.orbit.yaw += yaw;
        self.orbit.pitch = (base_pitch + self.orbit.pitch + pitch).clamp(-MAX_PITCH, MAX_PITCH) - base_pitch;

        {
            let mut frame = self.frame.lock().expect("frame lock");
            if frame.width() < MIN_FRAME_SIZE || frame.height() < MIN_FRAME_SIZE {
                return previous;
            }
            frame.clear();
        }

        self.spawn_worker();
        previous
    }

    /// Blocks until the current render finishes on its own.
    #[cfg(test)]
    pub fn wait(&mut self) -> Option<RenderOutcome> {
        let worker = self.worker.take()?;
        join_worker(worker)
    }

    /// Cancels and joins the worker. Safe to call more than once.
    pub fn shutdown(&mut self) -> Option<RenderOutcome> {
        let outcome = self.cancel_worker();
        self.cancel.store(false, Ordering::Release);
        outcome
    }

    fn cancel_worker(&mut self) -> Option<RenderOutcome> {
        let worker = self.worker.take()?;
        self.cancel.store(true, Ordering::Release);
        join_worker(worker)
    }

    fn spawn_worker(&mut self) {
        self.cancel.store(false, Ordering::Release);

        let frame = self.frame.clone();
        let cancel = self.cancel.clone();
        let settings = self.settings.clone();
        let scenes = self.scenes.clone();
        let orbit = self.orbit;

        info!(target: "app", "Spawning worker thread");
        self.worker = Some(spawn(move || render_worker(&frame, &settings, &scenes, orbit, &cancel)));
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn join_worker(worker: JoinHandle<RenderOutcome>) -> Option<RenderOutcome> {
    match worker.join() {
        Ok(outcome) => Some(outcome),
        Err(_) => {
            error!(target: "app", "Render worker panicked");
            None
        }
    }
}

/// Builds the scene, renders it and drops it again on either outcome.
fn render_worker(
    frame: &Mutex<Frame>,
    settings: &RenderSettings,
    scenes: &SceneSource,
    orbit: Orbit,
    cancel: &AtomicBool,
) -> RenderOutcome {
    let mut rng = Rng::with_seed(settings.seed);
    let scene = scenes(&mut rng);
    debug!(target: "app", "Scene bounds: {:?}", scene.bounds());
    let mut camera = scene.camera.clone();
    camera.yaw += orbit.yaw;
    camera.pitch += orbit.pitch;

    info!(target: "app", "Starting frame render of {} objects, {} samples per pixel...", scene.object_count(), settings.samples);
    let start = Instant::now();
    let outcome = render_frame(frame, &camera, &scene, settings.samples, cancel, &mut rng);
    let elapsed = start.elapsed();
    match outcome {
        RenderOutcome::Completed => info!(target: "app", "Finished rendering. Took {:?}", elapsed),
        RenderOutcome::Cancelled => info!(target: "app", "Render cancelled after {:?}", elapsed),
    }
    outcome
}

use clap::{Parser, ValueEnum};
use log::LevelFilter;

use crate::scene::SceneKind;
use crate::session::RenderSettings;

#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Parser)]
#[command(name = "cpu-ray-tracing")]
#[command(about = "Progressive CPU path tracer")]
pub struct Args {
    /// Initial window width in pixels
    #[arg(long, default_value = "1080")]
    pub width: u32,

    /// Initial window height in pixels
    #[arg(long, default_value = "720")]
    pub height: u32,

    /// Number of samples per pixel
    #[arg(long, short = 's', default_value = "16")]
    pub samples: u32,

    /// Seed for scene generation and sampling, equal seeds render identical frames
    #[arg(long, default_value = "0")]
    pub seed: u64,

    #[arg(long, value_enum, default_value_t = SceneKind::Showcase)]
    pub scene: SceneKind,

    /// Logging level, RUST_LOG takes precedence
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

impl Args {
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            samples: self.samples.max(1),
            seed: self.seed,
            scene: self.scene,
        }
    }
}

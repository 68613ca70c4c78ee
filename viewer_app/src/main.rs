//! Headless scene viewer
//!
//! Loads the viewer configuration, runs every configured scene script to
//! completion, then renders a fixed number of frames of the first scene
//! through the recording backend.
//!
//! ```text
//! scene_viewer [config-file] [--frames N]
//! ```

use scene_engine::foundation::logging::{self, LevelFilter};
use scene_engine::foundation::math::Mat4Ext;
use scene_engine::prelude::*;
use thiserror::Error;

const DEFAULT_CONFIG: &str = "viewer.toml";

#[derive(Error, Debug)]
enum ArgsError {
    #[error("--frames needs a value")]
    MissingFrames,

    #[error("invalid frame count '{0}'")]
    InvalidFrames(String),

    #[error("unexpected argument '{0}'")]
    Unexpected(String),
}

#[derive(Debug)]
struct Args {
    config: String,
    frames: Option<u32>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut config = None;
        let mut frames = None;

        while let Some(arg) = args.next() {
            if arg == "--frames" {
                let value = args.next().ok_or(ArgsError::MissingFrames)?;
                frames = Some(value.parse().map_err(|_| ArgsError::InvalidFrames(value))?);
            } else if config.is_none() && !arg.starts_with("--") {
                config = Some(arg);
            } else {
                return Err(ArgsError::Unexpected(arg));
            }
        }

        Ok(Self {
            config: config.unwrap_or_else(|| DEFAULT_CONFIG.to_string()),
            frames,
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_filter(LevelFilter::Info);

    let args = Args::parse(std::env::args().skip(1))?;
    let mut config = ViewerConfig::load_or_default(&args.config)?;
    if let Some(frames) = args.frames {
        config.render.frames = frames;
    }
    let frames = config.render.frames;

    log::info!("Starting scene viewer with {}", args.config);
    let mut context = SceneContext::new(config);
    let loaded = context.load_configured_scenes()?;
    if loaded == 0 {
        log::warn!("No scenes configured in {}, nothing to render", args.config);
        return Ok(());
    }

    let mut backend = HeadlessBackend::new();
    for frame in 0..frames {
        context.update();
        match context.render_frame(&mut backend) {
            FrameOutcome::Waiting => log::info!("Frame {}: waiting for scene", frame),
            FrameOutcome::Rendered { drawn, skipped } => {
                let draw_calls: usize = backend.draws().iter().map(|d| d.draw_calls).sum();
                log::info!(
                    "Frame {}: {} node(s) drawn, {} skipped, {} draw call(s)",
                    frame,
                    drawn,
                    skipped,
                    draw_calls
                );
                for record in backend.take_draws() {
                    log::debug!(
                        "  {} [{}] origin {:?}",
                        record.node,
                        record.variant.core_name(),
                        record.model_matrix.origin()
                    );
                }
            }
        }
    }

    log::info!(
        "Rendered {} frame(s) of '{}'",
        context.renderer().frames_rendered(),
        context.registry().active_scene_name()
    );
    Ok(())
}

//! genview - follows a 3D generation job and shows the resulting model
//!
//! Runs the viewer controller headless at display cadence, logging each change
//! of the viewer page until the job is finished and its model has loaded.
//!
//! Usage: `genview [JOB_ID] [--cancel] [--write-config]`

use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use genview_assets::HttpFetcher;
use genview_jobs::JobClient;
use genview_render::HeadlessSurface;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use genview::{DisplayState, ModelStage, Settings, ViewerController};

/// 60 frames per second
const FRAME: Duration = Duration::from_micros(16_667);

/// Frames to render the placeholder when no job is given
const PLACEHOLDER_FRAMES: u64 = 60;

#[derive(Parser, Debug, Default, PartialEq)]
#[command(name = "genview")]
#[command(about = "Follow a 3D generation job and show its model", long_about = None)]
struct Args {
    /// Job to track; the placeholder model is shown when omitted
    job_id: Option<String>,
    /// Cancel the job as soon as it is seen running
    #[arg(long)]
    cancel: bool,
    /// Write the effective settings back to the config file
    #[arg(long)]
    write_config: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    let args = Args::parse();
    let settings = Settings::load();
    if args.write_config {
        settings.save().context("Failed to save settings")?;
    }

    info!("Starting genview against {}", settings.api.base_url);

    let client = JobClient::new(&settings.api).context("Failed to start job client")?;
    let fetcher = HttpFetcher::new(client.runtime_handle(), client.http_client());
    let surface = HeadlessSurface::new(
        settings.viewer.fallback_width,
        settings.viewer.fallback_height,
    );

    let mut controller = ViewerController::new(client, fetcher, &settings);
    controller.mount(Box::new(surface.clone()));
    if let Some(job_id) = &args.job_id {
        controller.start_tracking(job_id.clone());
    }

    let mut cancel_pending = args.cancel;
    let mut last_description = String::new();
    let mut last_advisory = None;
    let mut frames = 0u64;
    let mut last_frame = Instant::now();

    let outcome = loop {
        std::thread::sleep(FRAME);
        let now = Instant::now();
        controller.update(now.duration_since(last_frame));
        last_frame = now;
        frames += 1;

        let display = controller.display();
        if cancel_pending && matches!(display.state, DisplayState::Generating { .. }) {
            cancel_pending = false;
            if controller.request_cancel() && controller.confirm_cancel() {
                info!("Cancel requested");
            }
            continue;
        }

        let description = display.state.description();
        if description != last_description {
            info!("{}", description);
            last_description = description;
        }
        if display.advisory != last_advisory {
            if let Some(advisory) = &display.advisory {
                warn!("{}", advisory);
            }
            last_advisory = display.advisory.clone();
        }

        let done = match args.job_id {
            Some(_) => controller.is_settled(),
            None => frames >= PLACEHOLDER_FRAMES,
        };
        if done {
            break display.state;
        }
    };

    controller.unmount();
    let stats = surface.stats();
    info!(
        "Rendered {} frames with {} draw calls over {:.1}s",
        stats.frames,
        stats.draw_calls,
        controller.now().as_secs_f32()
    );

    match outcome {
        DisplayState::Failed { message } => bail!("generation failed: {}", message),
        DisplayState::Model {
            stage: ModelStage::Error { source, message },
            ..
        } => bail!("could not display model from {}: {}", source, message),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_job_and_flags() {
        let args = Args::try_parse_from(["genview", "job-42", "--cancel"]).unwrap();
        assert_eq!(args.job_id.as_deref(), Some("job-42"));
        assert!(args.cancel);
        assert!(!args.write_config);
    }

    #[test]
    fn test_no_arguments_means_placeholder() {
        assert_eq!(Args::try_parse_from(["genview"]).unwrap(), Args::default());
    }

    #[test]
    fn test_write_config_flag() {
        let args = Args::try_parse_from(["genview", "--write-config"]).unwrap();
        assert!(args.write_config);
        assert!(args.job_id.is_none());
    }

    #[test]
    fn test_rejects_unknown_flags_and_extra_ids() {
        assert!(Args::try_parse_from(["genview", "--fast"]).is_err());
        assert!(Args::try_parse_from(["genview", "a", "b"]).is_err());
    }
}

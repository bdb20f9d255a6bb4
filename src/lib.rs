//! Posemark - annotate videos with tracked person poses.
//!
//! This crate runs a YOLO pose model with multi-object tracking over every
//! frame of a video and writes a rendered video plus a per-frame JSON
//! document of boxes, keypoints and track ids.

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod inference;
pub mod output;
pub mod pipeline;
pub mod video;

use clap::Parser;
use cli::{AnnotateArgs, Cli, Command, ConfigAction};
use config::{Config, config_file_path, load_default_config, save_default_config, validate_config};
use pipeline::{ProcessOptions, process_video};
use std::path::{Path, PathBuf};
use tracing::warn;

pub use error::{Error, Result};

/// Main entry point for posemark CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.annotate.verbose, cli.annotate.quiet);

    // Frames already handed to the encoder stay; the document is never partial.
    if let Err(e) = ctrlc::set_handler(|| {
        warn!("Interrupted, annotation document not written");
        std::process::exit(130); // 128 + SIGINT(2)
    }) {
        warn!("Failed to install Ctrl+C handler: {e}");
    }

    // Handle subcommands
    if let Some(command) = cli.command {
        return handle_command(command);
    }

    let config = load_default_config()?;
    validate_config(&config)?;

    let options = resolve_options(
        cli.source.as_deref(),
        cli.out.as_deref(),
        cli.json.as_deref(),
        &cli.annotate,
        &config,
    )?;
    process_video(&options)?;

    println!("[OK] wrote video: {}", options.video_out.display());
    println!("[OK] wrote json : {}", options.json_out.display());
    Ok(())
}

/// Merge CLI arguments (which already include environment variables) over
/// the configuration file.
fn resolve_options(
    source: Option<&Path>,
    video_out: Option<&Path>,
    json_out: Option<&Path>,
    args: &AnnotateArgs,
    config: &Config,
) -> Result<ProcessOptions> {
    let required = |value: Option<&Path>, flag: &str| -> Result<PathBuf> {
        value
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::ConfigValidation {
                message: format!("{flag} is required"),
            })
    };

    Ok(ProcessOptions {
        source: required(source, "--source")?,
        video_out: required(video_out, "--out")?,
        json_out: required(json_out, "--json")?,
        model: args
            .model
            .clone()
            .unwrap_or_else(|| config.defaults.model.clone()),
        device: args.device.unwrap_or(config.inference.device),
        confidence: args.conf.unwrap_or(config.defaults.confidence),
        iou: args.iou.unwrap_or(config.defaults.iou),
        tracker: args
            .tracker
            .clone()
            .unwrap_or_else(|| config.defaults.tracker.clone()),
        imgsz: args.imgsz.or(config.defaults.imgsz),
        max_detections: config.defaults.max_detections,
        codec: args
            .codec
            .clone()
            .unwrap_or_else(|| config.output.codec.clone()),
        pretty_json: config.output.pretty_json,
        progress: config.output.progress && !args.no_progress && !args.quiet,
    })
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // ORT logging is suppressed by default because CUDA fallback is expected in auto mode.
    // Use -v to see ORT warnings, -vv for info, -vvv for full trace.
    let filter_str = if quiet {
        "warn,ort=off".to_string()
    } else {
        match verbose {
            0 => "info,ort=off".to_string(),
            1 => "debug,ort=warn".to_string(),
            2 => "trace,ort=info".to_string(),
            _ => "trace".to_string(), // -vvv: no ORT filter, full trace
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    // stdout is reserved for the result lines.
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_command(command: Command) -> Result<()> {
    match command {
        Command::Config { action } => handle_config_command(action),
    }
}

fn handle_config_command(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = config_file_path()?;
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                let saved_path = save_default_config(&Config::default())?;
                println!("Created configuration file: {}", saved_path.display());
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_default_config()?;
            println!("{config:#?}");
            Ok(())
        }
        ConfigAction::Path => {
            let path = config_file_path()?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::config::InferenceDevice;

    fn args() -> AnnotateArgs {
        AnnotateArgs {
            model: None,
            conf: None,
            iou: None,
            device: None,
            tracker: None,
            imgsz: None,
            codec: None,
            no_progress: false,
            quiet: false,
            verbose: 0,
        }
    }

    fn resolve(args: &AnnotateArgs, config: &Config) -> ProcessOptions {
        resolve_options(
            Some(Path::new("in.mp4")),
            Some(Path::new("out/in.mp4")),
            Some(Path::new("out/in.json")),
            args,
            config,
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_uses_config_defaults() {
        let options = resolve(&args(), &Config::default());

        assert_eq!(options.model, PathBuf::from("yolov8n-pose.onnx"));
        assert_eq!(options.confidence, 0.30);
        assert_eq!(options.iou, 0.5);
        assert_eq!(options.tracker, "bytetrack.yaml");
        assert_eq!(options.device, InferenceDevice::Auto);
        assert_eq!(options.codec, "mpeg4");
        assert!(options.imgsz.is_none());
        assert!(options.progress);
    }

    #[test]
    fn test_cli_overrides_config() {
        let mut config = Config::default();
        config.defaults.confidence = 0.6;
        config.defaults.imgsz = Some(960);
        config.inference.device = InferenceDevice::Cpu;

        let mut cli = args();
        cli.conf = Some(0.2);
        cli.device = Some(InferenceDevice::Cuda(0));

        let options = resolve(&cli, &config);
        assert_eq!(options.confidence, 0.2);
        assert_eq!(options.device, InferenceDevice::Cuda(0));
        assert_eq!(options.imgsz, Some(960));
    }

    #[test]
    fn test_quiet_disables_progress() {
        let mut cli = args();
        cli.quiet = true;
        assert!(!resolve(&cli, &Config::default()).progress);

        let mut config = Config::default();
        config.output.progress = false;
        assert!(!resolve(&args(), &config).progress);
    }

    #[test]
    fn test_missing_paths_rejected() {
        let result = resolve_options(None, None, None, &args(), &Config::default());
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }
}

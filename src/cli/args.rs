//! CLI argument definitions.

use crate::cli::validators::{parse_confidence, parse_imgsz, parse_iou};
use crate::config::InferenceDevice;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Annotate videos with tracked person poses.
#[derive(Debug, Parser)]
#[command(name = "posemark")]
#[command(author, version, about, long_about = None)]
#[command(subcommand_negates_reqs = true)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Input video file.
    #[arg(long, required = true)]
    pub source: Option<PathBuf>,

    /// Output path for the annotated video.
    #[arg(long, required = true)]
    pub out: Option<PathBuf>,

    /// Output path for the per-frame JSON document.
    #[arg(long, required = true)]
    pub json: Option<PathBuf>,

    /// Annotation options.
    #[command(flatten)]
    pub annotate: AnnotateArgs,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Options controlling detection, tracking and output.
#[derive(Debug, Args)]
pub struct AnnotateArgs {
    /// Pose model weights (ONNX).
    #[arg(long, env = "POSEMARK_MODEL")]
    pub model: Option<PathBuf>,

    /// Minimum detection confidence (0.0-1.0).
    #[arg(long, value_parser = parse_confidence, env = "POSEMARK_CONF")]
    pub conf: Option<f32>,

    /// IoU threshold for non-maximum suppression (0.0-1.0).
    #[arg(long, value_parser = parse_iou, env = "POSEMARK_IOU")]
    pub iou: Option<f32>,

    /// Inference device: auto, cpu, cuda, cuda:N or a GPU index.
    #[arg(long, env = "POSEMARK_DEVICE")]
    pub device: Option<InferenceDevice>,

    /// Tracker: a built-in name (bytetrack.yaml) or a TOML config path.
    #[arg(long, env = "POSEMARK_TRACKER")]
    pub tracker: Option<String>,

    /// Fixed inference size (multiple of 32); computed from the frame size by default.
    #[arg(long, value_parser = parse_imgsz, env = "POSEMARK_IMGSZ")]
    pub imgsz: Option<u32>,

    /// Video codec for the annotated output.
    #[arg(long, env = "POSEMARK_CODEC")]
    pub codec: Option<String>,

    /// Do not show a progress bar.
    #[arg(long)]
    pub no_progress: bool,

    /// Only print warnings and errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace+ORT info, -vvv: trace+ORT debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_cli_parse_required_paths() {
        let cli = Cli::try_parse_from([
            "posemark", "--source", "in.mp4", "--out", "out/in.mp4", "--json", "out/in.json",
        ])
        .unwrap();

        assert_eq!(cli.source, Some(PathBuf::from("in.mp4")));
        assert_eq!(cli.out, Some(PathBuf::from("out/in.mp4")));
        assert_eq!(cli.json, Some(PathBuf::from("out/in.json")));
        assert!(cli.command.is_none());
        assert!(cli.annotate.conf.is_none());
    }

    #[test]
    #[serial]
    fn test_cli_parse_with_options() {
        let cli = Cli::try_parse_from([
            "posemark",
            "--source",
            "in.mp4",
            "--out",
            "o.mp4",
            "--json",
            "o.json",
            "--conf",
            "0.25",
            "--iou",
            "0.6",
            "--device",
            "cuda:1",
            "--imgsz",
            "1280",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.annotate.conf, Some(0.25));
        assert_eq!(cli.annotate.iou, Some(0.6));
        assert_eq!(cli.annotate.device, Some(InferenceDevice::Cuda(1)));
        assert_eq!(cli.annotate.imgsz, Some(1280));
        assert_eq!(cli.annotate.verbose, 2);
    }

    #[test]
    #[serial]
    fn test_cli_requires_paths() {
        assert!(Cli::try_parse_from(["posemark", "--source", "in.mp4"]).is_err());
        assert!(Cli::try_parse_from(["posemark"]).is_err());
    }

    #[test]
    #[serial]
    fn test_cli_rejects_bad_values() {
        let base = ["posemark", "--source", "a", "--out", "b", "--json", "c"];
        let with = |extra: &[&'static str]| {
            let mut args = base.to_vec();
            args.extend_from_slice(extra);
            Cli::try_parse_from(args)
        };

        assert!(with(&["--conf", "1.5"]).is_err());
        assert!(with(&["--imgsz", "650"]).is_err());
        assert!(with(&["--device", "tpu"]).is_err());
    }

    #[test]
    #[serial]
    fn test_cli_parse_config_subcommand() {
        let cli = Cli::try_parse_from(["posemark", "config", "path"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Config {
                action: ConfigAction::Path
            })
        ));
    }

    #[test]
    #[serial]
    #[allow(unsafe_code)]
    fn test_env_supplies_defaults() {
        // SAFETY: serialized with the other CLI tests that read the environment.
        unsafe {
            std::env::set_var("POSEMARK_CONF", "0.45");
        }
        let cli =
            Cli::try_parse_from(["posemark", "--source", "a", "--out", "b", "--json", "c"]).unwrap();
        unsafe {
            std::env::remove_var("POSEMARK_CONF");
        }
        assert_eq!(cli.annotate.conf, Some(0.45));
    }
}

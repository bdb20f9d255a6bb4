//! Video property probing with `ffprobe`.

use serde::Deserialize;
use std::path::Path;
use std::process::Command;

/// Top-level `ffprobe -print_format json -show_streams` output.
#[derive(Debug, Deserialize)]
pub struct FfprobeOutput {
    /// Streams in container order.
    #[serde(default)]
    pub streams: Vec<FfprobeStream>,
}

/// A single stream from ffprobe output.
#[derive(Debug, Deserialize)]
pub struct FfprobeStream {
    /// Stream kind ("video", "audio", ...).
    pub codec_type: Option<String>,
    /// Coded width in pixels.
    pub width: Option<u32>,
    /// Coded height in pixels.
    pub height: Option<u32>,
    /// Average frame rate, e.g. "30000/1001".
    pub avg_frame_rate: Option<String>,
    /// Base frame rate, e.g. "30/1".
    pub r_frame_rate: Option<String>,
    /// Frame count from the container, when known.
    pub nb_frames: Option<String>,
}

/// Properties of a video stream that the pipeline needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoProperties {
    /// Frames per second, `None` when the container does not report a usable rate.
    pub fps: Option<f64>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Number of frames, when known.
    pub frame_count: Option<u64>,
}

/// Run `ffprobe` on `path` and extract the first video stream's properties.
pub fn probe_video(path: &Path) -> Result<VideoProperties, String> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-print_format",
            "json",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .map_err(|e| format!("could not run ffprobe: {e}"))?;

    if !output.status.success() {
        return Err(format!(
            "ffprobe exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)
        .map_err(|e| format!("could not parse ffprobe output: {e}"))?;
    properties_from_probe(&probe)
}

/// Pick the first video stream and read its size, rate and frame count.
pub fn properties_from_probe(probe: &FfprobeOutput) -> Result<VideoProperties, String> {
    let stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| "no video stream found".to_string())?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err("video stream has no frame size".to_string()),
    };

    let fps = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_frame_rate));

    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<u64>().ok())
        .filter(|&n| n > 0);

    Ok(VideoProperties {
        fps,
        width,
        height,
        frame_count,
    })
}

/// Parse a rate like `"30/1"`, `"30000/1001"` or `"25"`.
///
/// Returns `None` for `"0/0"` and anything that is not a positive finite number.
pub fn parse_frame_rate(s: &str) -> Option<f64> {
    let value = match s.split_once('/') {
        Some((num, den)) => {
            let num = num.trim().parse::<f64>().ok()?;
            let den = den.trim().parse::<f64>().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => s.trim().parse::<f64>().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

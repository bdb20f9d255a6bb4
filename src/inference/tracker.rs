//! Multi-object tracking with two-stage IoU association (`ByteTrack`).
//!
//! High-confidence detections are matched first against every live track,
//! then low-confidence detections get a second chance against the tracks
//! still unmatched. Tracks that miss a frame become lost and are kept for a
//! buffer of frames before they are dropped, so a person who is briefly
//! occluded keeps their id.

use crate::constants::tracker as defaults;
use crate::error::{Error, Result};
use crate::inference::boxes::iou;
use crate::inference::types::PoseDetection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, trace};

/// Assigns persistent identities to per-frame detections.
pub trait Tracker {
    /// Associate one frame of detections with the tracks seen so far.
    ///
    /// Returns one entry per detection, in the same order: the track id, or
    /// `None` when the detection is not part of a confirmed track this frame.
    fn update(&mut self, detections: &[PoseDetection]) -> Vec<Option<u64>>;
}

/// `ByteTrack` parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Tracker algorithm; only `bytetrack` is supported.
    pub tracker_type: String,
    /// Minimum score for the first association.
    pub track_high_thresh: f32,
    /// Detections at or below this score are ignored.
    pub track_low_thresh: f32,
    /// Minimum score for a detection to start a new track.
    pub new_track_thresh: f32,
    /// Frames a lost track survives, expressed at 30 fps.
    pub track_buffer: u32,
    /// Maximum first-association cost (`1 - IoU`).
    pub match_thresh: f32,
    /// Weight IoU by detection score in the first association.
    pub fuse_score: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tracker_type: "bytetrack".to_string(),
            track_high_thresh: defaults::TRACK_HIGH_THRESH,
            track_low_thresh: defaults::TRACK_LOW_THRESH,
            new_track_thresh: defaults::NEW_TRACK_THRESH,
            track_buffer: defaults::TRACK_BUFFER,
            match_thresh: defaults::MATCH_THRESH,
            fuse_score: true,
        }
    }
}

impl TrackerConfig {
    /// Resolve a tracker reference: a built-in name or a TOML file path.
    pub fn resolve(reference: &str) -> Result<Self> {
        if defaults::BUILTIN_NAMES.contains(&reference) {
            debug!("Using built-in tracker '{reference}'");
            return Ok(Self::default());
        }
        Self::load(Path::new(reference))
    }

    /// Load and validate a tracker configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::TrackerConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|e| Error::TrackerConfigParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        debug!("Loaded tracker config from {}", path.display());
        Ok(config)
    }

    /// Check thresholds are in range and consistent.
    pub fn validate(&self) -> Result<()> {
        if self.tracker_type != "bytetrack" {
            return Err(Error::TrackerConfigInvalid {
                message: format!(
                    "unsupported tracker_type '{}', only 'bytetrack' is available",
                    self.tracker_type
                ),
            });
        }

        for (name, value) in [
            ("track_high_thresh", self.track_high_thresh),
            ("track_low_thresh", self.track_low_thresh),
            ("new_track_thresh", self.new_track_thresh),
            ("match_thresh", self.match_thresh),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::TrackerConfigInvalid {
                    message: format!("{name} must be between 0.0 and 1.0, got {value}"),
                });
            }
        }

        if self.track_low_thresh > self.track_high_thresh {
            return Err(Error::TrackerConfigInvalid {
                message: format!(
                    "track_low_thresh ({}) must not exceed track_high_thresh ({})",
                    self.track_low_thresh, self.track_high_thresh
                ),
            });
        }
        Ok(())
    }
}

/// Lifecycle of a confirmed track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackState {
    Tracked,
    Lost,
}

#[derive(Debug, Clone)]
struct Track {
    id: u64,
    bbox: [f32; 4],
    velocity: [f32; 4],
    state: TrackState,
    confirmed: bool,
    last_frame: u64,
}

impl Track {
    /// Constant-velocity estimate of the box at `frame`.
    #[allow(clippy::cast_precision_loss)]
    fn predict(&self, frame: u64) -> [f32; 4] {
        let dt = frame.saturating_sub(self.last_frame) as f32;
        let mut b = self.bbox;
        for (coord, v) in b.iter_mut().zip(self.velocity) {
            *coord += v * dt;
        }
        b
    }

    #[allow(clippy::cast_precision_loss)]
    fn observe(&mut self, bbox: [f32; 4], frame: u64) {
        let dt = frame.saturating_sub(self.last_frame).max(1) as f32;
        for i in 0..4 {
            self.velocity[i] = (bbox[i] - self.bbox[i]) / dt;
        }
        self.bbox = bbox;
        self.last_frame = frame;
        self.state = TrackState::Tracked;
    }
}

/// `ByteTrack` multi-object tracker.
#[derive(Debug)]
pub struct ByteTracker {
    config: TrackerConfig,
    max_time_lost: u64,
    frame_id: u64,
    next_id: u64,
    tracks: Vec<Track>,
}

impl ByteTracker {
    /// Create a tracker for a stream running at `fps`.
    ///
    /// The lost-track buffer scales with the frame rate so it covers the
    /// same wall-clock time at any fps.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_lossless
    )]
    pub fn new(config: TrackerConfig, fps: f64) -> Self {
        let max_time_lost =
            (fps / defaults::BUFFER_REFERENCE_FPS * f64::from(config.track_buffer)) as u64;
        debug!("Tracker keeps lost tracks for {max_time_lost} frames");
        Self {
            config,
            max_time_lost,
            frame_id: 0,
            next_id: 1,
            tracks: Vec::new(),
        }
    }

    /// Number of confirmed tracks currently held, tracked or lost.
    pub fn live_tracks(&self) -> usize {
        self.tracks.iter().filter(|t| t.confirmed).count()
    }

    fn cost_matrix(
        &self,
        tracks: &[usize],
        detections: &[PoseDetection],
        candidates: &[usize],
        fuse_score: bool,
    ) -> Vec<Vec<f32>> {
        tracks
            .iter()
            .map(|&t| {
                let predicted = self.tracks[t].predict(self.frame_id);
                candidates
                    .iter()
                    .map(|&d| {
                        let mut sim = iou(&predicted, &detections[d].bbox);
                        if fuse_score {
                            sim *= detections[d].score;
                        }
                        1.0 - sim
                    })
                    .collect()
            })
            .collect()
    }

    /// Match `tracks` to `candidates`, recording ids in `assigned`.
    ///
    /// Returns the unmatched track and candidate indices.
    fn associate(
        &mut self,
        tracks: &[usize],
        detections: &[PoseDetection],
        candidates: &[usize],
        max_cost: f32,
        fuse_score: bool,
        assigned: &mut [Option<u64>],
    ) -> (Vec<usize>, Vec<usize>) {
        let costs = self.cost_matrix(tracks, detections, candidates, fuse_score);
        let pairs = greedy_match(&costs, max_cost);

        let mut track_used = vec![false; tracks.len()];
        let mut det_used = vec![false; candidates.len()];
        for (r, c) in pairs {
            track_used[r] = true;
            det_used[c] = true;
            let det = candidates[c];
            let frame = self.frame_id;
            let track = &mut self.tracks[tracks[r]];
            track.observe(detections[det].bbox, frame);
            track.confirmed = true;
            assigned[det] = Some(track.id);
        }

        let rest_tracks = tracks
            .iter()
            .zip(track_used)
            .filter_map(|(&t, used)| (!used).then_some(t))
            .collect();
        let rest_dets = candidates
            .iter()
            .zip(det_used)
            .filter_map(|(&d, used)| (!used).then_some(d))
            .collect();
        (rest_tracks, rest_dets)
    }
}

impl Tracker for ByteTracker {
    fn update(&mut self, detections: &[PoseDetection]) -> Vec<Option<u64>> {
        self.frame_id += 1;
        let mut assigned = vec![None; detections.len()];

        let high: Vec<usize> = (0..detections.len())
            .filter(|&i| detections[i].score >= self.config.track_high_thresh)
            .collect();
        let low: Vec<usize> = (0..detections.len())
            .filter(|&i| {
                let s = detections[i].score;
                s > self.config.track_low_thresh && s < self.config.track_high_thresh
            })
            .collect();

        let (confirmed, unconfirmed): (Vec<usize>, Vec<usize>) =
            (0..self.tracks.len()).partition(|&t| self.tracks[t].confirmed);

        // First association: high scores against tracked and lost tracks.
        let fuse = self.config.fuse_score;
        let (rest_tracks, rest_high) = self.associate(
            &confirmed,
            detections,
            &high,
            self.config.match_thresh,
            fuse,
            &mut assigned,
        );

        // Second association: low scores against tracks still tracked.
        let (tracked, lost): (Vec<usize>, Vec<usize>) = rest_tracks
            .into_iter()
            .partition(|&t| self.tracks[t].state == TrackState::Tracked);
        let (missed, _) = self.associate(
            &tracked,
            detections,
            &low,
            defaults::SECOND_MATCH_THRESH,
            false,
            &mut assigned,
        );
        for t in missed.into_iter().chain(lost) {
            self.tracks[t].state = TrackState::Lost;
        }

        // Tracks born last frame get one chance to be confirmed.
        let (stale, fresh_high) = self.associate(
            &unconfirmed,
            detections,
            &rest_high,
            defaults::UNCONFIRMED_MATCH_THRESH,
            fuse,
            &mut assigned,
        );

        let frame = self.frame_id;
        let max_lost = self.max_time_lost;
        let mut keep = vec![true; self.tracks.len()];
        for t in stale {
            keep[t] = false;
        }
        for (t, track) in self.tracks.iter().enumerate() {
            if track.state == TrackState::Lost && frame - track.last_frame > max_lost {
                trace!("Dropping track {} after {} frames", track.id, frame - track.last_frame);
                keep[t] = false;
            }
        }
        let mut keep = keep.into_iter();
        self.tracks.retain(|_| keep.next().unwrap_or(false));

        for d in fresh_high {
            if detections[d].score < self.config.new_track_thresh {
                continue;
            }
            let id = self.next_id;
            self.next_id += 1;
            // Tracks on the first frame are confirmed immediately.
            let confirmed = frame == 1;
            if confirmed {
                assigned[d] = Some(id);
            }
            self.tracks.push(Track {
                id,
                bbox: detections[d].bbox,
                velocity: [0.0; 4],
                state: TrackState::Tracked,
                confirmed,
                last_frame: frame,
            });
        }

        trace!(
            "Frame {frame}: {} detections, {} assigned, {} tracks",
            detections.len(),
            assigned.iter().flatten().count(),
            self.tracks.len()
        );
        assigned
    }
}

/// Greedy lowest-cost assignment under `max_cost`.
fn greedy_match(costs: &[Vec<f32>], max_cost: f32) -> Vec<(usize, usize)> {
    let mut entries: Vec<(f32, usize, usize)> = costs
        .iter()
        .enumerate()
        .flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|&(_, &cost)| cost <= max_cost)
                .map(move |(c, &cost)| (cost, r, c))
        })
        .collect();
    entries.sort_by(|a, b| a.0.total_cmp(&b.0));

    let rows = costs.len();
    let cols = costs.first().map_or(0, Vec::len);
    let mut row_used = vec![false; rows];
    let mut col_used = vec![false; cols];
    let mut pairs = Vec::new();
    for (_, r, c) in entries {
        if !row_used[r] && !col_used[c] {
            row_used[r] = true;
            col_used[c] = true;
            pairs.push((r, c));
        }
    }
    pairs
}

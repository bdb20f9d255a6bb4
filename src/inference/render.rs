//! Burn detection boxes and pose skeletons into frames.

use crate::constants::pose::NUM_KEYPOINTS;
use crate::constants::render::{
    BOX_THICKNESS, KEYPOINT_DRAW_THRESH, KEYPOINT_RADIUS, LIMB_THICKNESS,
};
use crate::inference::types::PoseDetection;
use image::{Rgb, RgbImage};

/// COCO-Pose skeleton as pairs of keypoint indices.
pub const SKELETON: [[usize; 2]; 19] = [
    [15, 13],
    [13, 11],
    [16, 14],
    [14, 12],
    [11, 12],
    [5, 11],
    [6, 12],
    [5, 6],
    [5, 7],
    [6, 8],
    [7, 9],
    [8, 10],
    [1, 2],
    [0, 1],
    [0, 2],
    [1, 3],
    [2, 4],
    [3, 5],
    [4, 6],
];

/// Palette index per limb: legs, torso, arms, face.
const LIMB_COLOR_INDICES: [usize; 19] = [
    0, 0, 0, 0, 7, 7, 7, 9, 9, 9, 9, 9, 16, 16, 16, 16, 16, 16, 16,
];

/// Palette index per keypoint.
const KPT_COLOR_INDICES: [usize; 17] = [16, 16, 16, 16, 16, 9, 9, 9, 9, 9, 9, 0, 0, 0, 0, 0, 0];

const POSE_PALETTE: [[u8; 3]; 20] = [
    [255, 128, 0],
    [255, 153, 51],
    [255, 178, 102],
    [230, 230, 0],
    [255, 153, 255],
    [153, 204, 255],
    [255, 102, 255],
    [255, 51, 255],
    [102, 178, 255],
    [51, 153, 255],
    [255, 153, 153],
    [255, 102, 102],
    [255, 51, 51],
    [153, 255, 153],
    [102, 255, 102],
    [51, 255, 51],
    [0, 255, 0],
    [0, 0, 255],
    [255, 0, 0],
    [255, 255, 255],
];

const BOX_PALETTE: [[u8; 3]; 20] = [
    [0xFF, 0x38, 0x38],
    [0xFF, 0x9D, 0x97],
    [0xFF, 0x70, 0x1F],
    [0xFF, 0xB2, 0x1D],
    [0xCF, 0xD2, 0x31],
    [0x48, 0xF9, 0x0A],
    [0x92, 0xCC, 0x17],
    [0x3D, 0xDB, 0x86],
    [0x1A, 0x93, 0x34],
    [0x00, 0xD4, 0xBB],
    [0x2C, 0x99, 0xA8],
    [0x00, 0xC2, 0xFF],
    [0x34, 0x45, 0x93],
    [0x64, 0x73, 0xFF],
    [0x00, 0x18, 0xEC],
    [0x84, 0x38, 0xFF],
    [0x52, 0x00, 0x85],
    [0xCB, 0x38, 0xFF],
    [0xFF, 0x95, 0xC8],
    [0xFF, 0x37, 0xC7],
];

/// Box colour: by track id when tracked, by class otherwise.
pub fn box_color(track_id: Option<u64>, class_id: u32) -> Rgb<u8> {
    let key = track_id.unwrap_or_else(|| u64::from(class_id));
    #[allow(clippy::cast_possible_truncation)]
    let index = (key % BOX_PALETTE.len() as u64) as usize;
    Rgb(BOX_PALETTE[index])
}

/// Draw every detection onto `frame`.
///
/// `track_ids` runs parallel to `detections`; missing entries count as
/// untracked.
pub fn render_overlay(frame: &mut RgbImage, detections: &[PoseDetection], track_ids: &[Option<u64>]) {
    for (i, det) in detections.iter().enumerate() {
        let track_id = track_ids.get(i).copied().flatten();
        draw_box(frame, &det.bbox, box_color(track_id, det.class_id), BOX_THICKNESS);
        draw_pose(frame, det);
    }
}

fn draw_pose(frame: &mut RgbImage, det: &PoseDetection) {
    let visible = |k: usize| -> Option<(i32, i32)> {
        let [x, y] = *det.keypoints.get(k)?;
        let conf = det.keypoint_conf.as_ref().and_then(|c| c.get(k).copied());
        if conf.is_some_and(|c| c < KEYPOINT_DRAW_THRESH) || (x <= 0.0 && y <= 0.0) {
            return None;
        }
        Some(to_pixel(x, y))
    };

    if det.keypoints.len() == NUM_KEYPOINTS {
        for (pair, &color) in SKELETON.iter().zip(LIMB_COLOR_INDICES.iter()) {
            if let (Some(a), Some(b)) = (visible(pair[0]), visible(pair[1])) {
                draw_line(frame, a, b, Rgb(POSE_PALETTE[color]), LIMB_THICKNESS);
            }
        }
    }

    for k in 0..det.keypoints.len() {
        if let Some((x, y)) = visible(k) {
            let color = KPT_COLOR_INDICES.get(k).map_or(POSE_PALETTE[16], |&c| POSE_PALETTE[c]);
            fill_circle(frame, x, y, KEYPOINT_RADIUS, Rgb(color));
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_pixel(x: f32, y: f32) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

fn put(frame: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    if let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y))
        && x < frame.width()
        && y < frame.height()
    {
        frame.put_pixel(x, y, color);
    }
}

/// Square brush of side `thickness` centred on the point.
fn stamp(frame: &mut RgbImage, x: i32, y: i32, thickness: i32, color: Rgb<u8>) {
    let lo = -(thickness - 1) / 2;
    let hi = thickness / 2;
    for dy in lo..=hi {
        for dx in lo..=hi {
            put(frame, x + dx, y + dy, color);
        }
    }
}

/// Bresenham line; pixels outside the frame are skipped.
pub fn draw_line(
    frame: &mut RgbImage,
    from: (i32, i32),
    to: (i32, i32),
    color: Rgb<u8>,
    thickness: i32,
) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        stamp(frame, x, y, thickness, color);
        if (x, y) == to {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Outline of an `[x1, y1, x2, y2]` box.
pub fn draw_box(frame: &mut RgbImage, bbox: &[f32; 4], color: Rgb<u8>, thickness: i32) {
    let (x1, y1) = to_pixel(bbox[0], bbox[1]);
    let (x2, y2) = to_pixel(bbox[2], bbox[3]);
    draw_line(frame, (x1, y1), (x2, y1), color, thickness);
    draw_line(frame, (x2, y1), (x2, y2), color, thickness);
    draw_line(frame, (x2, y2), (x1, y2), color, thickness);
    draw_line(frame, (x1, y2), (x1, y1), color, thickness);
}

/// Filled disc of `radius` around the point.
pub fn fill_circle(frame: &mut RgbImage, cx: i32, cy: i32, radius: i32, color: Rgb<u8>) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put(frame, cx + dx, cy + dy, color);
            }
        }
    }
}

//! Animation converter (rig clip -> compact keyframe JSON)
//!
//! Three passes over the clip:
//!
//! 1. Sample every `frame_step`-th frame and extract each bone's rotation
//!    relative to its rest pose, re-expressed in its parent's rotated frame.
//!    The root bone also gets a position offset measured against a
//!    floor-grounded rest height.
//! 2. Walk each bone's rotations in frame order and negate any quaternion
//!    whose dot product with the previous frame is negative, so consumers can
//!    interpolate between neighbours without flipping.
//! 3. Quantize into sparse keyframes: near-identity rotations and
//!    near-zero root offsets are left out.

use glam::{Quat, Vec3};
use std::path::{Path, PathBuf};

use crate::axis::{to_engine_position, to_engine_rotation};
use crate::error::{ExportError, Result};
use crate::formats::{AnimationClip, BoneRotation, Keyframe, Pose};
use crate::hierarchy::{BoneId, BoneTable};
use crate::scene::{rotation_of, translation_of, ClipRange, Rig, Scene, SceneLoader};

/// Default stride between sampled frames (every other source frame)
pub const DEFAULT_FRAME_STEP: u32 = 2;

/// Rotations with `w` above this are written as identity (about 1.6°)
const IDENTITY_W_THRESHOLD: f32 = 0.9999;

/// Root offsets with every axis at or below this are written as zero
const ROOT_OFFSET_THRESHOLD: f32 = 0.001;

const ROTATION_DECIMALS: i32 = 4;
const POSITION_DECIMALS: i32 = 3;
const TIME_DECIMALS: i32 = 3;

/// Conversion parameters
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Clip name (defaults to the input file stem)
    pub name: Option<String>,
    /// Sample every n-th source frame
    pub frame_step: u32,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            name: None,
            frame_step: DEFAULT_FRAME_STEP,
        }
    }
}

/// Engine-space rest pose every animated frame is measured against
#[derive(Debug, Clone)]
pub struct RestReference {
    /// World rotation per bone present in the rig
    pub rotations: [Option<Quat>; BoneId::COUNT],
    /// World position of the root bone
    pub root_position: Vec3,
    /// Root height above the lowest rest-pose bone
    pub grounded_root_height: f32,
}

impl RestReference {
    /// Capture the bind pose of every table bone found in the rig
    pub fn capture<R: Rig>(rig: &R, table: &BoneTable) -> Result<Self> {
        let world = rig.world_matrix();
        let mut rotations = [None; BoneId::COUNT];
        let mut positions = [None; BoneId::COUNT];
        let mut floor = f32::INFINITY;

        for entry in table.entries() {
            let Some(bind) = rig.bind_matrix(entry.source_name) else {
                continue;
            };
            let bind_world = world * bind;
            let position = to_engine_position(translation_of(bind_world));
            floor = floor.min(position.y);

            rotations[entry.id.index()] = Some(to_engine_rotation(rotation_of(bind_world)));
            positions[entry.id.index()] = Some(position);
        }

        let root = table.entry(BoneId::ROOT);
        let root_position =
            positions[BoneId::ROOT.index()].ok_or(ExportError::MissingBone(root.source_name))?;

        Ok(Self {
            rotations,
            root_position,
            grounded_root_height: root_position.y - floor,
        })
    }
}

/// Pass 1 output for one sampled frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSample {
    /// Source frame number
    pub frame: i32,
    /// Parent-relative delta rotation per bone present in the rig
    pub rotations: [Option<Quat>; BoneId::COUNT],
    /// Root offset; `y` is height above the grounded rest height
    pub root_offset: Vec3,
}

/// Pass 1: extract local delta rotations and the root offset per sampled frame
pub fn sample_frames<R: Rig>(
    rig: &mut R,
    table: &BoneTable,
    rest: &RestReference,
    range: &ClipRange,
    frame_step: u32,
) -> Vec<FrameSample> {
    let step = frame_step.max(1) as usize;
    let mut frames = Vec::new();

    for frame in (range.first_frame..=range.last_frame).step_by(step) {
        rig.set_frame(frame);
        let world = rig.world_matrix();

        let mut deltas: [Option<Quat>; BoneId::COUNT] = [None; BoneId::COUNT];
        let mut rotations = [None; BoneId::COUNT];
        let mut root_offset = Vec3::ZERO;

        for entry in table.entries() {
            let i = entry.id.index();
            let (Some(posed), Some(rest_rotation)) =
                (rig.posed_matrix(entry.source_name), rest.rotations[i])
            else {
                continue;
            };
            let posed_world = world * posed;

            let anim_rotation = to_engine_rotation(rotation_of(posed_world));
            let delta = anim_rotation * rest_rotation.conjugate();
            deltas[i] = Some(delta);

            rotations[i] = Some(match entry.parent.and_then(|p| deltas[p.index()]) {
                Some(parent_delta) => parent_delta.conjugate() * delta,
                None => delta,
            });

            if entry.id == BoneId::ROOT {
                let position = to_engine_position(translation_of(posed_world));
                root_offset = Vec3::new(
                    position.x - rest.root_position.x,
                    position.y - rest.grounded_root_height,
                    position.z - rest.root_position.z,
                );
            }
        }

        frames.push(FrameSample {
            frame,
            rotations,
            root_offset,
        });
    }

    frames
}

/// Pass 2: remove sign flips between adjacent frames, bone by bone.
///
/// Greedy and forward only. A bone turning exactly 180° between samples is
/// ambiguous and stays as extracted.
pub fn normalize_signs(frames: &mut [FrameSample]) {
    for i in 1..frames.len() {
        let (before, after) = frames.split_at_mut(i);
        let prev = &before[i - 1];
        let current = &mut after[0];

        for (prev_q, current_q) in prev.rotations.iter().zip(current.rotations.iter_mut()) {
            if let (Some(p), Some(c)) = (prev_q, current_q.as_mut()) {
                if p.dot(*c) < 0.0 {
                    *c = -*c;
                }
            }
        }
    }
}

/// Pass 3: quantize frames into sparse keyframes
pub fn build_keyframes(
    frames: &[FrameSample],
    first_frame: i32,
    frame_rate: f32,
    table: &BoneTable,
) -> Vec<Keyframe> {
    frames
        .iter()
        .map(|sample| {
            let mut pose = Pose::default();

            for entry in table.entries() {
                let Some(q) = sample.rotations[entry.id.index()] else {
                    continue;
                };
                if q.w > IDENTITY_W_THRESHOLD {
                    continue;
                }
                pose.rotations.push((
                    entry.key.to_string(),
                    BoneRotation {
                        w: round_to(q.w, ROTATION_DECIMALS),
                        x: round_to(q.x, ROTATION_DECIMALS),
                        y: round_to(q.y, ROTATION_DECIMALS),
                        z: round_to(q.z, ROTATION_DECIMALS),
                    },
                ));
            }

            let offset = sample.root_offset;
            if offset.abs().max_element() > ROOT_OFFSET_THRESHOLD {
                pose.root_position = Some([
                    round_to(offset.x, POSITION_DECIMALS),
                    round_to(offset.y, POSITION_DECIMALS),
                    round_to(offset.z, POSITION_DECIMALS),
                ]);
            }

            let time = (sample.frame - first_frame) as f32 / frame_rate;
            Keyframe {
                time: round_to(time, TIME_DECIMALS),
                pose,
            }
        })
        .collect()
}

/// Load `input` and convert its rig's clip
pub fn convert_animation<L: SceneLoader>(
    loader: &mut L,
    input: &Path,
    options: &ConvertOptions,
    table: &BoneTable,
) -> Result<AnimationClip> {
    if options.frame_step == 0 {
        return Err(ExportError::InvalidFrameStep(options.frame_step));
    }

    let mut scene = loader.load(input)?;
    let frame_rate = scene.frame_rate();
    if !frame_rate.is_finite() || frame_rate <= 0.0 {
        return Err(ExportError::InvalidFrameRate(frame_rate));
    }

    let rig = scene.rig_mut().ok_or(ExportError::NoRigFound)?;
    let range = rig
        .clip()
        .filter(|r| r.last_frame >= r.first_frame)
        .ok_or(ExportError::NoAnimationData)?;

    tracing::info!(
        "Processing animation '{}': frames {}-{} (step {}) @ {} fps, duration {:.2}s",
        range.name.as_deref().unwrap_or("unnamed"),
        range.first_frame,
        range.last_frame,
        options.frame_step,
        frame_rate,
        (range.last_frame - range.first_frame) as f32 / frame_rate
    );

    let rest = RestReference::capture(rig, table)?;
    tracing::debug!(
        "Rest root at {:?}, grounded height {:.3}",
        rest.root_position,
        rest.grounded_root_height
    );

    tracing::debug!("Pass 1: collecting local rotations");
    let mut frames = sample_frames(rig, table, &rest, &range, options.frame_step);

    tracing::debug!("Pass 2: normalizing quaternion signs");
    normalize_signs(&mut frames);

    tracing::debug!("Pass 3: building keyframes");
    let keyframes = build_keyframes(&frames, range.first_frame, frame_rate, table);

    let name = options.name.clone().unwrap_or_else(|| {
        input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    Ok(AnimationClip::new(name, keyframes))
}

/// Convert `input` and write the clip as compact JSON to `output`
pub fn export_animation<L: SceneLoader>(
    loader: &mut L,
    input: &Path,
    output: &Path,
    options: &ConvertOptions,
    table: &BoneTable,
) -> Result<AnimationClip> {
    let clip = convert_animation(loader, input, options, table)?;
    let json = clip.to_json()?;

    std::fs::write(output, json).map_err(|source| ExportError::Io {
        path: output.to_path_buf(),
        source,
    })?;

    tracing::info!(
        "Exported animation '{}': {} keyframes ({:.3}s)",
        clip.name,
        clip.keyframes.len(),
        clip.duration
    );
    Ok(clip)
}

/// Output path used when none is given: the input with a `.json` extension
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("json")
}

fn round_to(value: f32, decimals: i32) -> f32 {
    let scale = 10f32.powi(decimals);
    (value * scale).round() / scale
}

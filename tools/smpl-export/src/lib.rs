//! smpl-export library
//!
//! Converts SMPL-rigged skeletal animation into compact engine keyframe clips
//! and extracts rest-pose bone positions as Rust constants.

pub mod animation;
pub mod axis;
pub mod error;
pub mod formats;
pub mod hierarchy;
pub mod rest_pose;
pub mod scene;

pub use error::{ExportError, Result};
pub use hierarchy::{BoneEntry, BoneId, BoneTable};

// Re-export pipeline entry points
pub use animation::{
    convert_animation, default_output_path, export_animation, ConvertOptions, DEFAULT_FRAME_STEP,
};
pub use rest_pose::{export_rest_pose, extract_rest_pose, RestConstant, RestPose};

// Re-export clip format types
pub use formats::{AnimationClip, BoneRotation, Keyframe, Pose, CLIP_VERSION};

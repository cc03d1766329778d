//! Scene host capability interface.
//!
//! Both pipelines talk to the authoring data through these traits only:
//! load a file into a fresh scene, find its rig, query bone transforms in
//! authoring space, and step the clip frame by frame.
//!
//! Two implementations ship with the crate:
//! - [`gltf_scene`]: production adapter over the `gltf` importer
//! - [`memory`]: synthetic in-memory rigs for tests and tooling

pub mod gltf_scene;
pub mod memory;

use glam::{Mat4, Quat, Vec3};
use std::path::Path;

use crate::error::Result;

pub use gltf_scene::{GltfLoader, GltfRig, GltfScene};
pub use memory::{MemoryLoader, MemoryRig, MemoryScene};

/// Frame range of the rig's animation clip (inclusive on both ends)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipRange {
    pub name: Option<String>,
    pub first_frame: i32,
    pub last_frame: i32,
}

/// Opens source files.
///
/// Every call returns a freshly built scene; nothing from an earlier load is
/// visible through the new value.
pub trait SceneLoader {
    type Scene: Scene;

    fn load(&mut self, path: &Path) -> Result<Self::Scene>;
}

/// A loaded scene.
pub trait Scene {
    type Rig: Rig;

    /// Playback rate used to turn frame numbers into seconds
    fn frame_rate(&self) -> f32;

    /// The first skeletal rig in the scene, if any
    fn rig_mut(&mut self) -> Option<&mut Self::Rig>;
}

/// A skeletal rig. All matrices are in the authoring tool's axis convention.
pub trait Rig {
    /// Rig object to world transform at the current frame
    fn world_matrix(&self) -> Mat4;

    /// Bind-pose head position in rig space
    fn bind_head(&self, bone: &str) -> Option<Vec3>;

    /// Bind-pose bone to rig transform
    fn bind_matrix(&self, bone: &str) -> Option<Mat4>;

    /// Posed bone to rig transform at the current frame
    fn posed_matrix(&self, bone: &str) -> Option<Mat4>;

    /// The clip attached to this rig
    fn clip(&self) -> Option<ClipRange>;

    /// Evaluate the clip at `frame`
    fn set_frame(&mut self, frame: i32);
}

/// Rotation part of an affine transform (scale removed)
#[inline]
pub fn rotation_of(m: Mat4) -> Quat {
    let (_scale, rotation, _translation) = m.to_scale_rotation_translation();
    rotation.normalize()
}

/// Translation part of an affine transform
#[inline]
pub fn translation_of(m: Mat4) -> Vec3 {
    m.w_axis.truncate()
}

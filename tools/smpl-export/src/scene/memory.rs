//! In-memory scene host.
//!
//! Rigs are described directly as bind matrices plus one posed matrix per
//! clip frame. Used by tests and by callers that already hold evaluated
//! poses.

use glam::{Mat4, Vec3};
use hashbrown::HashMap;
use std::path::{Path, PathBuf};

use super::{translation_of, ClipRange, Rig, Scene, SceneLoader};
use crate::error::{ExportError, Result};

#[derive(Debug, Clone)]
struct MemoryBone {
    name: String,
    bind: Mat4,
    /// Posed matrices, one per frame starting at the clip's first frame
    track: Vec<Mat4>,
}

/// Synthetic rig
#[derive(Debug, Clone, Default)]
pub struct MemoryRig {
    world: Mat4,
    bones: Vec<MemoryBone>,
    clip: Option<ClipRange>,
    frame: i32,
}

impl MemoryRig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_world_matrix(mut self, world: Mat4) -> Self {
        self.world = world;
        self
    }

    /// Add a bone with its bind-pose bone to rig transform
    pub fn with_bone(mut self, name: &str, bind: Mat4) -> Self {
        self.bones.push(MemoryBone {
            name: name.to_string(),
            bind,
            track: Vec::new(),
        });
        self
    }

    /// Attach a clip covering `first_frame..=last_frame`
    pub fn with_clip(mut self, name: &str, first_frame: i32, last_frame: i32) -> Self {
        self.clip = Some(ClipRange {
            name: Some(name.to_string()),
            first_frame,
            last_frame,
        });
        self.frame = first_frame;
        self
    }

    /// Set the posed transforms of a bone, one per clip frame.
    ///
    /// Frames past the end of the track hold the last pose; bones without a
    /// track stay in their bind pose.
    pub fn with_track(mut self, name: &str, poses: Vec<Mat4>) -> Self {
        if let Some(bone) = self.bones.iter_mut().find(|b| b.name == name) {
            bone.track = poses;
        }
        self
    }

    fn bone(&self, name: &str) -> Option<&MemoryBone> {
        self.bones.iter().find(|b| b.name == name)
    }
}

impl Rig for MemoryRig {
    fn world_matrix(&self) -> Mat4 {
        self.world
    }

    fn bind_head(&self, bone: &str) -> Option<Vec3> {
        self.bone(bone).map(|b| translation_of(b.bind))
    }

    fn bind_matrix(&self, bone: &str) -> Option<Mat4> {
        self.bone(bone).map(|b| b.bind)
    }

    fn posed_matrix(&self, bone: &str) -> Option<Mat4> {
        let bone = self.bone(bone)?;
        let first = self.clip.as_ref().map_or(0, |c| c.first_frame);
        let offset = usize::try_from(self.frame - first).unwrap_or(0);

        Some(
            bone.track
                .get(offset)
                .or_else(|| bone.track.last())
                .copied()
                .unwrap_or(bone.bind),
        )
    }

    fn clip(&self) -> Option<ClipRange> {
        self.clip.clone()
    }

    fn set_frame(&mut self, frame: i32) {
        self.frame = frame;
    }
}

/// Scene holding at most one synthetic rig
#[derive(Debug, Clone)]
pub struct MemoryScene {
    frame_rate: f32,
    rig: Option<MemoryRig>,
}

impl MemoryScene {
    pub fn new(frame_rate: f32) -> Self {
        Self {
            frame_rate,
            rig: None,
        }
    }

    pub fn with_rig(mut self, rig: MemoryRig) -> Self {
        self.rig = Some(rig);
        self
    }
}

impl Scene for MemoryScene {
    type Rig = MemoryRig;

    fn frame_rate(&self) -> f32 {
        self.frame_rate
    }

    fn rig_mut(&mut self) -> Option<&mut MemoryRig> {
        self.rig.as_mut()
    }
}

/// Serves registered scenes by path. Unknown paths fail like an unreadable file.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    scenes: HashMap<PathBuf, MemoryScene>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, scene: MemoryScene) {
        self.scenes.insert(path.into(), scene);
    }
}

impl SceneLoader for MemoryLoader {
    type Scene = MemoryScene;

    fn load(&mut self, path: &Path) -> Result<MemoryScene> {
        self.scenes
            .get(path)
            .cloned()
            .ok_or_else(|| ExportError::ImportFailure {
                path: path.to_path_buf(),
                message: "No such file or directory".to_string(),
            })
    }
}

//! Rest-pose extractor (rig -> Rust constants)
//!
//! Snapshots each known bone's bind-pose head position in engine space and
//! renders the result as `glam::Vec3A` constants.

use glam::Vec3;
use std::path::Path;

use crate::axis::to_engine_position;
use crate::error::{ExportError, Result};
use crate::hierarchy::{BoneId, BoneTable};
use crate::scene::{Rig, Scene, SceneLoader};

/// One extracted bone position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestConstant {
    pub bone: BoneId,
    pub name: &'static str,
    /// Engine-space head position
    pub position: Vec3,
}

/// Bone head positions in table order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestPose {
    pub constants: Vec<RestConstant>,
}

impl RestPose {
    pub fn get(&self, bone: BoneId) -> Option<Vec3> {
        self.constants
            .iter()
            .find(|c| c.bone == bone)
            .map(|c| c.position)
    }

    /// Render as Rust source declaring one `Vec3A` constant per bone
    pub fn to_rust_source(&self, source_name: &str) -> String {
        let mut out = format!("// Generated from {source_name}\n");
        out.push_str(
            "// Base mapping: Blender Z (Up) -> Game Y (Up), Blender Y (Forward) -> Game -Z (Back)\n",
        );
        out.push_str("use glam::Vec3A;\n\n");

        for c in &self.constants {
            let p = c.position;
            out.push_str(&format!(
                "pub const {}: Vec3A = Vec3A::new({:.3}, {:.3}, {:.3});\n",
                c.name, p.x, p.y, p.z
            ));
        }
        out
    }
}

/// Extract rest-pose head positions from the rig in `input`.
///
/// Bones listed in the table but missing from the rig are skipped.
pub fn extract_rest_pose<L: SceneLoader>(
    loader: &mut L,
    input: &Path,
    table: &BoneTable,
) -> Result<RestPose> {
    let mut scene = loader.load(input)?;
    let rig = scene.rig_mut().ok_or(ExportError::NoRigFound)?;
    let world = rig.world_matrix();

    let mut constants = Vec::with_capacity(BoneId::COUNT);
    for entry in table.entries() {
        let Some(head) = rig.bind_head(entry.source_name) else {
            tracing::debug!("Bone '{}' not in armature, skipping", entry.source_name);
            continue;
        };

        let position = to_engine_position(world.transform_point3(head));
        tracing::debug!("{} = {:?}", entry.constant, position);
        constants.push(RestConstant {
            bone: entry.id,
            name: entry.constant,
            position,
        });
    }

    Ok(RestPose { constants })
}

/// Extract the rest pose from `input` and write it to `output` as Rust source
pub fn export_rest_pose<L: SceneLoader>(
    loader: &mut L,
    input: &Path,
    output: &Path,
    table: &BoneTable,
) -> Result<RestPose> {
    let rest = extract_rest_pose(loader, input, table)?;

    let source_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let source = rest.to_rust_source(&source_name);

    std::fs::write(output, source).map_err(|source| ExportError::Io {
        path: output.to_path_buf(),
        source,
    })?;

    tracing::info!(
        "Exported rest pose: {} bones from {:?}",
        rest.constants.len(),
        input
    );
    Ok(rest)
}

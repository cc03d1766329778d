//! Clip file format (schema v2).
//!
//! Compact JSON with single-letter fields:
//!
//! ```text
//! { "v": 2, "n": name, "d": duration,
//!   "kf": [ { "t": time, "p": { key: {"w","x","y","z"}, ..., "rp": [x, y, z] } } ] }
//! ```
//!
//! Pose entries are sparse. A missing bone key means identity rotation and a
//! missing `"rp"` means zero root offset; [`Pose::rotation`] and
//! [`Pose::root_offset`] apply those defaults.

use glam::{Quat, Vec3};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Current clip schema version
pub const CLIP_VERSION: u32 = 2;

/// Pose key holding the root position offset
pub const ROOT_POSITION_KEY: &str = "rp";

/// A converted animation clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    #[serde(rename = "v")]
    pub version: u32,
    #[serde(rename = "n")]
    pub name: String,
    /// Seconds; equals the last keyframe's time
    #[serde(rename = "d")]
    pub duration: f32,
    #[serde(rename = "kf")]
    pub keyframes: Vec<Keyframe>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, keyframes: Vec<Keyframe>) -> Self {
        let duration = keyframes.last().map_or(0.0, |kf| kf.time);
        Self {
            version: CLIP_VERSION,
            name: name.into(),
            duration,
            keyframes,
        }
    }

    /// Serialize without whitespace
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Seconds from clip start
    #[serde(rename = "t")]
    pub time: f32,
    #[serde(rename = "p")]
    pub pose: Pose,
}

/// Rotation stored in a clip, component order w, x, y, z
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoneRotation {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Quat> for BoneRotation {
    fn from(q: Quat) -> Self {
        Self {
            w: q.w,
            x: q.x,
            y: q.y,
            z: q.z,
        }
    }
}

impl From<BoneRotation> for Quat {
    fn from(r: BoneRotation) -> Self {
        Quat::from_xyzw(r.x, r.y, r.z, r.w)
    }
}

/// Sparse keyframe pose.
///
/// Bone entries keep insertion order (hierarchy order when built by the
/// converter) and serialize ahead of the root offset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pose {
    pub rotations: Vec<(String, BoneRotation)>,
    pub root_position: Option<[f32; 3]>,
}

impl Pose {
    /// Rotation for a bone key, identity when absent
    pub fn rotation(&self, key: &str) -> Quat {
        self.rotations
            .iter()
            .find(|(k, _)| k == key)
            .map_or(Quat::IDENTITY, |(_, r)| Quat::from(*r))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.rotations.iter().any(|(k, _)| k == key)
    }

    /// Root offset, zero when absent
    pub fn root_offset(&self) -> Vec3 {
        self.root_position.map_or(Vec3::ZERO, Vec3::from)
    }
}

impl Serialize for Pose {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.rotations.len() + usize::from(self.root_position.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (key, rotation) in &self.rotations {
            map.serialize_entry(key, rotation)?;
        }
        if let Some(rp) = &self.root_position {
            map.serialize_entry(ROOT_POSITION_KEY, rp)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Pose {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PoseVisitor;

        impl<'de> Visitor<'de> for PoseVisitor {
            type Value = Pose;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of bone keys to rotations")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Pose, A::Error> {
                let mut pose = Pose::default();
                while let Some(key) = access.next_key::<String>()? {
                    if key == ROOT_POSITION_KEY {
                        pose.root_position = Some(access.next_value()?);
                    } else {
                        let rotation = access.next_value()?;
                        pose.rotations.push((key, rotation));
                    }
                }
                Ok(pose)
            }
        }

        deserializer.deserialize_map(PoseVisitor)
    }
}
